use hashbrown::HashMap;
use keel_math::{IVec2, IVec3, IVec4, Quat, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

use crate::asset::AssetResolver;
use crate::info::{ClassInfo, Enumerated, Typed, ValueKind};
use crate::object::{Handle, Object, ObjectRef, Persistable, WeakObjectRef};
use crate::persist::error::LoadError;
use crate::persist::format::{FormatReader, RefCode};
use crate::registry::ClassRegistry;
use crate::value::{FromValue, Value};

// -----------------------------------------------------------------------------
// Loader

/// Reconstructs one object graph from a document.
///
/// Records are materialized on demand, starting from record 0, and resolved
/// at most once per session; cyclic references receive the instance that is
/// currently being loaded. The [`json`](crate::json) entry points construct
/// one internally; custom [`Object::load`] hooks receive it to read state
/// beyond the declared properties.
pub struct Loader<'env> {
    fmt: &'env mut dyn FormatReader,
    registry: &'env ClassRegistry,
    assets: &'env mut dyn AssetResolver,
    // Instances by record index. A `None` slot marks a record whose
    // construction is in flight.
    resolved: HashMap<u32, Option<ObjectRef>>,
    // The resolver is consulted at most once per distinct path.
    asset_cache: HashMap<String, ObjectRef>,
    primary_hook: Option<Box<dyn FnOnce(&ObjectRef) + 'env>>,
}

impl<'env> Loader<'env> {
    /// Creates a session reading through `fmt`.
    pub fn new(
        fmt: &'env mut dyn FormatReader,
        registry: &'env ClassRegistry,
        assets: &'env mut dyn AssetResolver,
    ) -> Self {
        Self {
            fmt,
            registry,
            assets,
            resolved: HashMap::new(),
            asset_cache: HashMap::new(),
            primary_hook: None,
        }
    }

    /// The registry this session resolves classes against.
    #[inline]
    pub fn registry(&self) -> &'env ClassRegistry {
        self.registry
    }

    /// Installs a hook that runs once on the primary object, after
    /// construction and before its properties load.
    pub fn set_primary_hook(&mut self, hook: impl FnOnce(&ObjectRef) + 'env) {
        self.primary_hook = Some(Box::new(hook));
    }

    /// Materializes record 0 and everything reachable from it.
    pub fn load_primary(&mut self) -> Result<ObjectRef, LoadError> {
        if self.fmt.record_count() == 0 {
            return Err(LoadError::EmptyDocument);
        }
        match self.find_object(0, None)? {
            Some(primary) => Ok(primary),
            None => Err(LoadError::Malformed("primary object is unresolved")),
        }
    }

    /// Resolves the record at `index` to an instance, loading it on first
    /// access.
    ///
    /// `expected` constrains the record's class to a chain; `None` accepts
    /// any registered class. Returns `Ok(None)` only for a reference that
    /// lands on a record whose construction is still in flight.
    pub fn find_object(
        &mut self,
        index: u32,
        expected: Option<&str>,
    ) -> Result<Option<ObjectRef>, LoadError> {
        if let Some(slot) = self.resolved.get(&index) {
            return Ok(slot.clone());
        }

        let count = self.fmt.record_count();
        if index >= count {
            return Err(LoadError::BadRecordIndex { index, count });
        }
        let Some(class) = self.fmt.record_class(index) else {
            return Err(LoadError::MissingClass { index });
        };
        let class = class.to_owned();
        let Some(info) = self.registry.get(&class) else {
            return Err(LoadError::UnknownClass { class });
        };
        if let Some(expected) = expected {
            if !self.registry.is_derived(&class, expected) {
                return Err(LoadError::ClassMismatch {
                    found: class,
                    expected: expected.to_owned(),
                });
            }
        }

        // Reserved before construction so even a constructor that reaches
        // back into the session cannot recurse into this record.
        self.resolved.insert(index, None);
        let Some(instance) = info.construct_for_load() else {
            self.resolved.remove(&index);
            return Err(LoadError::NotConstructable { class });
        };
        // Stored before loading so cyclic references resolve to this
        // instance while its properties are still being read.
        self.resolved.insert(index, Some(instance.clone()));
        log::debug!("load: record {index} is `{class}`");

        if index == 0 {
            if let Some(hook) = self.primary_hook.take() {
                hook(&instance);
            }
        }

        if !self.fmt.begin_record(index) {
            self.resolved.remove(&index);
            return Err(LoadError::Malformed("record is not an object"));
        }
        let result = instance.borrow_mut().load(self);
        self.fmt.end_record();
        if let Err(err) = result {
            // Drop the slot so later references cannot see a partially
            // loaded instance.
            self.resolved.remove(&index);
            return Err(err);
        }
        Ok(Some(instance))
    }

    fn resolve_asset(
        &mut self,
        path: &str,
        expected: Option<&str>,
    ) -> Result<ObjectRef, LoadError> {
        let target = match self.asset_cache.get(path) {
            Some(cached) => cached.clone(),
            None => {
                let loaded = self.assets.load(path).map_err(|source| LoadError::Asset {
                    path: path.to_owned(),
                    source,
                })?;
                log::debug!("load: asset `{path}` resolved");
                self.asset_cache.insert(path.to_owned(), loaded.clone());
                loaded
            }
        };
        // The cache only spares the resolver; compatibility is checked on
        // every access since expectations differ per reference.
        if let Some(expected) = expected {
            let found = target.class_name();
            if !self.registry.is_derived(found, expected) {
                return Err(LoadError::ClassMismatch {
                    found: found.to_owned(),
                    expected: expected.to_owned(),
                });
            }
        }
        Ok(target)
    }

    /// Reads a strong reference from the current scope.
    ///
    /// The outer `Option` is `None` when no reference is present; the inner
    /// `Option` is `None` for the null reference.
    #[allow(clippy::option_option)]
    pub fn read_ref(
        &mut self,
        name: Option<&str>,
        expected: Option<&str>,
    ) -> Result<Option<Option<ObjectRef>>, LoadError> {
        let Some(code) = self.fmt.read_ref(name) else {
            return Ok(None);
        };
        match code {
            RefCode::Null => Ok(Some(None)),
            RefCode::Index(index) => Ok(Some(self.find_object(index, expected)?)),
            RefCode::Asset(path) => {
                let target = self.resolve_asset(&path, expected)?;
                Ok(Some(Some(target)))
            }
        }
    }

    /// Reads a weak reference from the current scope; the target is loaded
    /// like a strong reference and then downgraded.
    pub fn read_weak(
        &mut self,
        name: Option<&str>,
        expected: Option<&str>,
    ) -> Result<Option<WeakObjectRef>, LoadError> {
        match self.read_ref(name, expected)? {
            None => Ok(None),
            Some(None) => Ok(Some(WeakObjectRef::empty())),
            Some(Some(target)) => Ok(Some(target.downgrade())),
        }
    }

    /// Reads a typed strong reference, enforcing the handle's class.
    #[allow(clippy::option_option)]
    pub fn read_handle<T: Persistable>(
        &mut self,
        name: Option<&str>,
    ) -> Result<Option<Option<Handle<T>>>, LoadError> {
        let resolved = self.read_ref(name, Some(T::CLASS))?;
        Ok(resolved.map(|target| target.map(Handle::from_ref)))
    }

    /// Loads the declared properties of `obj`, bases before derived classes.
    ///
    /// Properties absent from the document keep their default values;
    /// transient properties are skipped entirely.
    pub fn load_properties(
        &mut self,
        obj: &mut dyn Object,
        class_name: &str,
    ) -> Result<(), LoadError> {
        let Some(info) = self.registry.get(class_name) else {
            return Err(LoadError::UnknownClass {
                class: class_name.to_owned(),
            });
        };
        self.load_class_level(obj, info)
    }

    fn load_class_level(
        &mut self,
        obj: &mut dyn Object,
        info: &'env ClassInfo,
    ) -> Result<(), LoadError> {
        if let (Some(parent), Some(lens)) = (info.parent(), info.parent_lens()) {
            let Some(parent_info) = self.registry.get(parent) else {
                return Err(LoadError::UnknownClass {
                    class: parent.to_owned(),
                });
            };
            self.load_class_level((lens.by_mut)(&mut *obj), parent_info)?;
        }
        for property in info.properties() {
            if property.is_transient() {
                continue;
            }
            let name = Some(property.name());
            let type_info = property.type_info();
            match type_info.kind() {
                ValueKind::Ref => {
                    if let Some(target) = self.read_ref(name, type_info.referenced_class())? {
                        property.set(obj, Value::Ref(target));
                    }
                }
                ValueKind::WeakRef => {
                    if let Some(weak) = self.read_weak(name, type_info.referenced_class())? {
                        property.set(obj, Value::WeakRef(weak));
                    }
                }
                _ => {
                    if let Some(value) = self.fmt.read_value(name, type_info) {
                        property.set(obj, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Opens a substructure; `false` when it is absent or not a group.
    #[inline]
    pub fn begin_group(&mut self, name: Option<&str>) -> bool {
        self.fmt.begin_group(name)
    }

    #[inline]
    pub fn end_group(&mut self) {
        self.fmt.end_group();
    }

    /// Opens a sequence; `false` when it is absent or not an array.
    #[inline]
    pub fn begin_array(&mut self, name: Option<&str>) -> bool {
        self.fmt.begin_array(name)
    }

    #[inline]
    pub fn end_array(&mut self) {
        self.fmt.end_array();
    }

    fn read_leaf<T: Typed + FromValue>(&mut self, name: Option<&str>) -> Option<T> {
        self.fmt
            .read_value(name, T::type_info())
            .and_then(T::from_value)
    }

    /// Reads one string from the current scope.
    #[inline]
    pub fn read_str(&mut self, name: Option<&str>) -> Option<String> {
        self.read_leaf(name)
    }

    /// Reads one byte buffer from the current scope.
    #[inline]
    pub fn read_bytes(&mut self, name: Option<&str>) -> Option<Vec<u8>> {
        self.read_leaf(name)
    }

    /// Reads one enumeration constant from the current scope.
    ///
    /// Unknown constant names read as absent, leaving the target at its
    /// default.
    pub fn read_enum<E: Enumerated + Typed>(&mut self, name: Option<&str>) -> Option<E> {
        match self.fmt.read_value(name, E::type_info())? {
            Value::Enum(constant) => E::from_raw(constant.value),
            _ => None,
        }
    }
}

macro_rules! impl_read_fn {
    ($($fn_name:ident => $ty:ty;)*) => {
        impl Loader<'_> {$(
            #[doc = concat!("Reads one `", stringify!($ty), "` from the current scope.")]
            #[inline]
            pub fn $fn_name(&mut self, name: Option<&str>) -> Option<$ty> {
                self.read_leaf(name)
            }
        )*}
    };
}

impl_read_fn! {
    read_bool => bool;
    read_i8 => i8;
    read_i16 => i16;
    read_i32 => i32;
    read_i64 => i64;
    read_u8 => u8;
    read_u16 => u16;
    read_u32 => u32;
    read_u64 => u64;
    read_f32 => f32;
    read_f64 => f64;
    read_vec2 => Vec2;
    read_vec3 => Vec3;
    read_vec4 => Vec4;
    read_ivec2 => IVec2;
    read_ivec3 => IVec3;
    read_ivec4 => IVec4;
    read_uvec2 => UVec2;
    read_uvec3 => UVec3;
    read_uvec4 => UVec4;
    read_quat => Quat;
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::Loader;
    use crate::asset::{AssetError, AssetResolver};
    use crate::info::TypeInfo;
    use crate::object::{Object, ObjectRef};
    use crate::persist::error::LoadError;
    use crate::persist::format::{FormatReader, RefCode};
    use crate::registry::{ClassBuilder, ClassRegistry};
    use crate::value::Value;
    use crate::persist_class;

    persist_class! {
        class Bead {
            seq: u32,
        }
    }

    persist_class! {
        class Knot {
            seq: u32,
        }
    }

    struct StubReader {
        classes: Vec<Option<&'static str>>,
    }

    impl FormatReader for StubReader {
        fn record_count(&self) -> u32 {
            self.classes.len() as u32
        }

        fn record_class(&self, index: u32) -> Option<&str> {
            self.classes.get(index as usize).copied().flatten()
        }

        fn begin_record(&mut self, _index: u32) -> bool {
            true
        }

        fn end_record(&mut self) {}

        fn begin_group(&mut self, _name: Option<&str>) -> bool {
            false
        }

        fn end_group(&mut self) {}

        fn begin_array(&mut self, _name: Option<&str>) -> bool {
            false
        }

        fn end_array(&mut self) {}

        fn read_value(&mut self, _name: Option<&str>, _expected: &TypeInfo) -> Option<Value> {
            None
        }

        fn read_ref(&mut self, _name: Option<&str>) -> Option<RefCode> {
            None
        }
    }

    struct NoAssets;

    impl AssetResolver for NoAssets {
        fn load(&mut self, path: &str) -> Result<ObjectRef, AssetError> {
            Err(AssetError::NotFound(path.to_owned()))
        }

        fn managed_path(&self, _obj: &ObjectRef) -> Option<String> {
            None
        }
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register::<Bead>();
        registry.register::<Knot>();
        registry
    }

    #[test]
    fn empty_document() {
        let registry = registry();
        let mut fmt = StubReader { classes: vec![] };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        assert!(matches!(loader.load_primary(), Err(LoadError::EmptyDocument)));
    }

    #[test]
    fn record_without_class() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![None],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        assert!(matches!(
            loader.load_primary(),
            Err(LoadError::MissingClass { index: 0 })
        ));
    }

    #[test]
    fn unknown_class() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![Some("Ghost")],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        assert!(matches!(
            loader.load_primary(),
            Err(LoadError::UnknownClass { class }) if class == "Ghost"
        ));
    }

    #[test]
    fn reference_out_of_range() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![Some("Bead")],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        assert!(matches!(
            loader.find_object(5, None),
            Err(LoadError::BadRecordIndex { index: 5, count: 1 })
        ));
    }

    #[test]
    fn class_outside_expected_chain() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![Some("Bead")],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        assert!(matches!(
            loader.find_object(0, Some("Knot")),
            Err(LoadError::ClassMismatch { found, expected })
                if found == "Bead" && expected == "Knot"
        ));
    }

    #[test]
    fn class_without_constructor() {
        let mut registry = registry();
        registry.register_class(ClassBuilder::new("Husk").build());
        let mut fmt = StubReader {
            classes: vec![Some("Husk")],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        assert!(matches!(
            loader.load_primary(),
            Err(LoadError::NotConstructable { class }) if class == "Husk"
        ));
    }

    #[test]
    fn default_load_skips_absent_properties() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![Some("Bead")],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);

        let mut bead = Bead { seq: 7 };
        bead.load(&mut loader).unwrap();
        // Absent values are recoverable; the field keeps its old state.
        assert_eq!(bead.seq, 7);
    }

    #[test]
    fn primary_hook_runs_once_before_load() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![Some("Bead")],
        };
        let mut assets = NoAssets;
        let calls = Cell::new(0u32);
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        loader.set_primary_hook(|obj| {
            assert_eq!(obj.class_name(), "Bead");
            calls.set(calls.get() + 1);
        });
        let primary = loader.load_primary().unwrap();
        assert_eq!(primary.class_name(), "Bead");
        assert_eq!(calls.get(), 1);

        // A second resolution hits the cache and must not rerun the hook.
        let again = loader.find_object(0, None).unwrap().unwrap();
        assert!(again.ptr_eq(&primary));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn resolution_is_cached() {
        let registry = registry();
        let mut fmt = StubReader {
            classes: vec![Some("Bead"), Some("Knot")],
        };
        let mut assets = NoAssets;
        let mut loader = Loader::new(&mut fmt, &registry, &mut assets);
        let first = loader.find_object(1, None).unwrap().unwrap();
        let second = loader.find_object(1, None).unwrap().unwrap();
        assert!(first.ptr_eq(&second));
    }
}
