use hashbrown::HashMap;
use keel_math::{IVec2, IVec3, IVec4, Quat, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

use crate::asset::AssetResolver;
use crate::info::{ClassInfo, Enumerated};
use crate::object::{Handle, Object, ObjectRef, Persistable, WeakObjectRef};
use crate::persist::error::SaveError;
use crate::persist::format::{FormatWriter, RefToken};
use crate::registry::ClassRegistry;
use crate::value::{EnumValue, Value};

// -----------------------------------------------------------------------------
// Saver

/// Drives one object graph into a document.
///
/// A `Saver` walks the graph from a single root, assigning record indices in
/// discovery order and deduplicating every object by reference identity.
/// The [`json`](crate::json) entry points construct one internally; custom
/// [`Object::save`] hooks receive it to write state beyond the declared
/// properties.
pub struct Saver<'env> {
    fmt: &'env mut dyn FormatWriter,
    registry: &'env ClassRegistry,
    assets: &'env mut dyn AssetResolver,
    // Document index by allocation address.
    seen: HashMap<usize, u32>,
    // Recorded objects stay alive for the session so addresses in `seen`
    // stay unique.
    pinned: Vec<ObjectRef>,
    root_addr: usize,
    next_index: u32,
}

impl<'env> Saver<'env> {
    /// Creates a session writing through `fmt`.
    pub fn new(
        fmt: &'env mut dyn FormatWriter,
        registry: &'env ClassRegistry,
        assets: &'env mut dyn AssetResolver,
    ) -> Self {
        Self {
            fmt,
            registry,
            assets,
            seen: HashMap::new(),
            pinned: Vec::new(),
            root_addr: 0,
            next_index: 0,
        }
    }

    /// The registry this session resolves classes against.
    #[inline]
    pub fn registry(&self) -> &'env ClassRegistry {
        self.registry
    }

    /// Serializes the graph reachable from `root` as record 0.
    ///
    /// # Panics
    ///
    /// Panics when called twice; a session serves a single root object.
    pub fn save_object(&mut self, root: &ObjectRef) -> Result<(), SaveError> {
        assert!(
            self.next_index == 0,
            "a save session serves a single root object"
        );
        self.root_addr = root.addr();
        self.append_record(root)?;
        Ok(())
    }

    fn append_record(&mut self, obj: &ObjectRef) -> Result<u32, SaveError> {
        let class = obj.class_name();
        if !self.registry.contains(class) {
            return Err(SaveError::UnknownClass {
                class: class.to_owned(),
            });
        }
        let index = self.next_index;
        self.next_index += 1;
        // Registered before the recursive walk so cycles resolve to this
        // record instead of recursing forever.
        self.seen.insert(obj.addr(), index);
        self.pinned.push(obj.clone());
        log::debug!("save: record {index} is `{class}`");
        self.fmt.begin_record(class, index);
        let result = obj.borrow().save(self);
        self.fmt.end_record();
        result?;
        Ok(index)
    }

    /// Writes a strong reference, embedding the target on first encounter.
    ///
    /// Null targets write the null reference; already recorded targets write
    /// their document index; targets the resolver claims write their asset
    /// path; everything else is appended to the document as a new record.
    pub fn write_ref(
        &mut self,
        name: Option<&str>,
        target: Option<&ObjectRef>,
    ) -> Result<(), SaveError> {
        let Some(target) = target else {
            self.fmt.write_ref(name, RefToken::Null);
            return Ok(());
        };
        // Identity wins over management: an object already in the document
        // keeps its index even when the resolver also claims it.
        let addr = target.addr();
        if let Some(&index) = self.seen.get(&addr) {
            self.fmt.write_ref(name, RefToken::Index(index));
            return Ok(());
        }
        if addr != self.root_addr {
            if let Some(path) = self.assets.managed_path(target) {
                self.fmt.write_ref(name, RefToken::Asset(&path));
                return Ok(());
            }
        }
        let index = self.append_record(target)?;
        self.fmt.write_ref(name, RefToken::Index(index));
        Ok(())
    }

    /// Writes a weak reference; live targets serialize exactly like strong
    /// references, dropped or empty ones as null.
    pub fn write_weak(
        &mut self,
        name: Option<&str>,
        target: &WeakObjectRef,
    ) -> Result<(), SaveError> {
        let target = target.upgrade();
        self.write_ref(name, target.as_ref())
    }

    /// Writes a typed strong reference.
    pub fn write_handle<T: Persistable>(
        &mut self,
        name: Option<&str>,
        target: Option<&Handle<T>>,
    ) -> Result<(), SaveError> {
        self.write_ref(name, target.map(Handle::object))
    }

    /// Writes the declared properties of `obj`, bases before derived
    /// classes, skipping transient properties.
    pub fn save_properties(
        &mut self,
        obj: &dyn Object,
        class_name: &str,
    ) -> Result<(), SaveError> {
        let Some(info) = self.registry.get(class_name) else {
            return Err(SaveError::UnknownClass {
                class: class_name.to_owned(),
            });
        };
        self.save_class_level(obj, info)
    }

    fn save_class_level(
        &mut self,
        obj: &dyn Object,
        info: &'env ClassInfo,
    ) -> Result<(), SaveError> {
        if let (Some(parent), Some(lens)) = (info.parent(), info.parent_lens()) {
            let Some(parent_info) = self.registry.get(parent) else {
                return Err(SaveError::UnknownClass {
                    class: parent.to_owned(),
                });
            };
            self.save_class_level((lens.by_ref)(obj), parent_info)?;
        }
        for property in info.properties() {
            if property.is_transient() {
                continue;
            }
            let name = Some(property.name());
            match property.get(obj) {
                Value::Ref(target) => self.write_ref(name, target.as_ref())?,
                Value::WeakRef(weak) => self.write_weak(name, &weak)?,
                value => self.fmt.write_value(name, &value),
            }
        }
        Ok(())
    }

    /// Opens a substructure scope; pass `None` for the name only inside an
    /// array.
    #[inline]
    pub fn begin_group(&mut self, name: Option<&str>) {
        self.fmt.begin_group(name);
    }

    #[inline]
    pub fn end_group(&mut self) {
        self.fmt.end_group();
    }

    /// Opens a sequence scope; elements inside are written unnamed.
    #[inline]
    pub fn begin_array(&mut self, name: Option<&str>) {
        self.fmt.begin_array(name);
    }

    #[inline]
    pub fn end_array(&mut self) {
        self.fmt.end_array();
    }

    /// Writes one string into the current scope.
    #[inline]
    pub fn write_str(&mut self, name: Option<&str>, value: &str) {
        self.fmt.write_value(name, &Value::Str(value.to_owned()));
    }

    /// Writes one byte buffer into the current scope.
    #[inline]
    pub fn write_bytes(&mut self, name: Option<&str>, value: &[u8]) {
        self.fmt.write_value(name, &Value::Bytes(value.to_vec()));
    }

    /// Writes one enumeration constant into the current scope.
    #[inline]
    pub fn write_enum<E: Enumerated>(&mut self, name: Option<&str>, value: E) {
        self.fmt.write_value(
            name,
            &Value::Enum(EnumValue {
                name: value.name(),
                value: value.raw(),
            }),
        );
    }
}

macro_rules! impl_write_fn {
    ($($fn_name:ident => $ty:ty;)*) => {
        impl Saver<'_> {$(
            #[doc = concat!("Writes one `", stringify!($ty), "` into the current scope.")]
            #[inline]
            pub fn $fn_name(&mut self, name: Option<&str>, value: $ty) {
                self.fmt.write_value(name, &Value::from(value));
            }
        )*}
    };
}

impl_write_fn! {
    write_bool => bool;
    write_i8 => i8;
    write_i16 => i16;
    write_i32 => i32;
    write_i64 => i64;
    write_u8 => u8;
    write_u16 => u16;
    write_u32 => u32;
    write_u64 => u64;
    write_f32 => f32;
    write_f64 => f64;
    write_vec2 => Vec2;
    write_vec3 => Vec3;
    write_vec4 => Vec4;
    write_ivec2 => IVec2;
    write_ivec3 => IVec3;
    write_ivec4 => IVec4;
    write_uvec2 => UVec2;
    write_uvec3 => UVec3;
    write_uvec4 => UVec4;
    write_quat => Quat;
}

// -----------------------------------------------------------------------------
// Tests
