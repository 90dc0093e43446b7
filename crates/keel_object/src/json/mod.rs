//! The JSON document backend.
//!
//! Documents are a root array of records in discovery order; the primary
//! object is record 0. References between records go by document index,
//! references to externally managed objects by asset path.
//!
//! # Examples
//!
//! ```
//! use keel_object::json;
//! use keel_object::{ClassRegistry, ObjectRef, persist_class};
//!
//! persist_class! {
//!     class Save {
//!         slot: u32,
//!         title: String,
//!     }
//! }
//!
//! let mut registry = ClassRegistry::new();
//! registry.register::<Save>();
//!
//! let save = ObjectRef::new(Save {
//!     slot: 3,
//!     title: "camp".into(),
//! });
//! let text = json::save_to_string_pretty(&save, &registry).unwrap();
//!
//! let back = json::load_from_str(&text, &registry).unwrap();
//! assert_eq!(back.borrow_as::<Save>().unwrap().slot, 3);
//! ```

mod codec;
mod reader;
mod writer;

use crate::asset::{AssetResolver, UnmanagedAssets};
use crate::object::ObjectRef;
use crate::persist::{LoadError, Loader, SaveError, Saver};
use crate::registry::ClassRegistry;

use reader::JsonReader;
use writer::JsonWriter;

// Member names of the wire format.
pub(crate) mod member {
    pub(crate) const OBJECT_CLASS: &str = "objectClass";
    pub(crate) const OBJECT_ID: &str = "objectID";
    pub(crate) const OBJECT_PROPERTIES: &str = "objectProperties";
    pub(crate) const ASSET: &str = "asset";
    pub(crate) const BASE64: &str = "base64";
}

// -----------------------------------------------------------------------------
// Saving

/// Serializes the graph reachable from `root` into a JSON document tree.
pub fn save_to_value(
    root: &ObjectRef,
    registry: &ClassRegistry,
) -> Result<serde_json::Value, SaveError> {
    let mut assets = UnmanagedAssets;
    save_to_value_with(root, registry, &mut assets)
}

/// Serializes with an asset resolver deciding which referenced objects stay
/// out of the document.
pub fn save_to_value_with(
    root: &ObjectRef,
    registry: &ClassRegistry,
    assets: &mut dyn AssetResolver,
) -> Result<serde_json::Value, SaveError> {
    let mut writer = JsonWriter::new();
    {
        let mut saver = Saver::new(&mut writer, registry, assets);
        saver.save_object(root)?;
    }
    Ok(writer.finish())
}

/// Serializes the graph reachable from `root` to compact JSON text.
pub fn save_to_string(root: &ObjectRef, registry: &ClassRegistry) -> Result<String, SaveError> {
    let doc = save_to_value(root, registry)?;
    Ok(serde_json::to_string(&doc)?)
}

/// Serializes the graph reachable from `root` to indented JSON text.
pub fn save_to_string_pretty(
    root: &ObjectRef,
    registry: &ClassRegistry,
) -> Result<String, SaveError> {
    let doc = save_to_value(root, registry)?;
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Serializes to compact JSON text with an asset resolver.
pub fn save_to_string_with(
    root: &ObjectRef,
    registry: &ClassRegistry,
    assets: &mut dyn AssetResolver,
) -> Result<String, SaveError> {
    let doc = save_to_value_with(root, registry, assets)?;
    Ok(serde_json::to_string(&doc)?)
}

// -----------------------------------------------------------------------------
// Loading

/// Reconstructs the primary object and its graph from a document tree.
pub fn load_from_value(
    doc: &serde_json::Value,
    registry: &ClassRegistry,
) -> Result<ObjectRef, LoadError> {
    let mut assets = UnmanagedAssets;
    load_from_value_with(doc, registry, &mut assets)
}

/// Reconstructs with an asset resolver supplying externally managed objects.
pub fn load_from_value_with(
    doc: &serde_json::Value,
    registry: &ClassRegistry,
    assets: &mut dyn AssetResolver,
) -> Result<ObjectRef, LoadError> {
    let mut reader = JsonReader::new(doc)?;
    let mut loader = Loader::new(&mut reader, registry, assets);
    loader.load_primary()
}

/// Reconstructs like [`load_from_value_with`], running `hook` on the primary
/// object after construction and before its properties load.
pub fn load_from_value_with_hook<'env, H>(
    doc: &'env serde_json::Value,
    registry: &'env ClassRegistry,
    assets: &'env mut dyn AssetResolver,
    hook: H,
) -> Result<ObjectRef, LoadError>
where
    H: FnOnce(&ObjectRef) + 'env,
{
    let mut reader = JsonReader::new(doc)?;
    let mut loader = Loader::new(&mut reader, registry, assets);
    loader.set_primary_hook(hook);
    loader.load_primary()
}

/// Parses JSON text and reconstructs the primary object.
pub fn load_from_str(text: &str, registry: &ClassRegistry) -> Result<ObjectRef, LoadError> {
    let doc: serde_json::Value = serde_json::from_str(text)?;
    load_from_value(&doc, registry)
}

/// Parses JSON text and reconstructs with an asset resolver.
pub fn load_from_str_with(
    text: &str,
    registry: &ClassRegistry,
    assets: &mut dyn AssetResolver,
) -> Result<ObjectRef, LoadError> {
    let doc: serde_json::Value = serde_json::from_str(text)?;
    load_from_value_with(&doc, registry, assets)
}

// -----------------------------------------------------------------------------
// Tests
