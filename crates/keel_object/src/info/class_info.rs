use bitflags::bitflags;
use hashbrown::HashMap;

use crate::info::{TypeInfo, TypeTraits, Typed};
use crate::object::{Object, ObjectRef};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ParentLens

/// Accessors projecting an object onto its embedded parent struct.
///
/// Derived classes embed their parent as the first field; the lens lets the
/// engine walk the inheritance chain on `&dyn Object` without knowing the
/// concrete types involved.
#[derive(Clone, Copy, Debug)]
pub struct ParentLens {
    pub by_ref: fn(&dyn Object) -> &dyn Object,
    pub by_mut: fn(&mut dyn Object) -> &mut dyn Object,
}

// -----------------------------------------------------------------------------
// PropertyFlags

bitflags! {
    /// Bitflags attached to a declared property.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct PropertyFlags: u8 {
        /// The property is skipped entirely during save and load.
        const TRANSIENT = 1 << 0;
    }
}

// -----------------------------------------------------------------------------
// PropertyInfo

/// A declared property of a persistable class.
///
/// Couples a name and a [`TypeInfo`] with type-erased accessors into the
/// owning object. The accessors panic when handed an object of the wrong
/// class or a [`Value`] of the wrong kind; the declaring macro guarantees
/// neither happens for engine-driven access.
pub struct PropertyInfo {
    name: &'static str,
    type_info: fn() -> &'static TypeInfo,
    flags: PropertyFlags,
    get: fn(&dyn Object) -> Value,
    set: fn(&mut dyn Object, Value),
}

impl PropertyInfo {
    /// Creates a property descriptor for a field of type `T`.
    pub fn new<T: Typed>(
        name: &'static str,
        flags: PropertyFlags,
        get: fn(&dyn Object) -> Value,
        set: fn(&mut dyn Object, Value),
    ) -> Self {
        Self {
            name,
            type_info: T::type_info,
            flags,
            get,
            set,
        }
    }

    /// The property name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The descriptor of the property type.
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    /// The declared flags.
    #[inline]
    pub const fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// Whether the property is excluded from persistence.
    #[inline]
    pub const fn is_transient(&self) -> bool {
        self.flags.contains(PropertyFlags::TRANSIENT)
    }

    /// Reads the property out of `obj` as a tagged value.
    #[inline]
    pub fn get(&self, obj: &dyn Object) -> Value {
        (self.get)(obj)
    }

    /// Writes a tagged value into the property of `obj`.
    #[inline]
    pub fn set(&self, obj: &mut dyn Object, value: Value) {
        (self.set)(obj, value)
    }
}

impl core::fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("type", &self.type_info().name())
            .field("flags", &self.flags)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ClassInfo

/// The registered description of a persistable class.
///
/// Holds the class name, the optional parent link, the declared properties
/// in order, and the construction hook used when loading documents.
#[derive(Debug)]
pub struct ClassInfo {
    name: &'static str,
    parent: Option<&'static str>,
    parent_lens: Option<ParentLens>,
    traits: TypeTraits,
    properties: Box<[PropertyInfo]>,
    property_indices: HashMap<&'static str, usize>,
    construct: Option<fn() -> ObjectRef>,
}

impl ClassInfo {
    /// Panics if two properties share a name.
    pub(crate) fn new(
        name: &'static str,
        parent: Option<&'static str>,
        parent_lens: Option<ParentLens>,
        traits: TypeTraits,
        properties: Vec<PropertyInfo>,
        construct: Option<fn() -> ObjectRef>,
    ) -> Self {
        let mut property_indices = HashMap::with_capacity(properties.len());
        for (index, property) in properties.iter().enumerate() {
            if property_indices.insert(property.name(), index).is_some() {
                panic!(
                    "class `{name}` declares property `{}` more than once",
                    property.name()
                );
            }
        }
        Self {
            name,
            parent,
            parent_lens,
            traits,
            properties: properties.into_boxed_slice(),
            property_indices,
            construct,
        }
    }

    /// The class name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The name of the parent class, if any.
    #[inline]
    pub const fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    /// The lens onto the embedded parent struct, if the class has one.
    #[inline]
    pub const fn parent_lens(&self) -> Option<ParentLens> {
        self.parent_lens
    }

    /// The trait bitset of the class.
    #[inline]
    pub const fn traits(&self) -> TypeTraits {
        self.traits
    }

    /// The properties declared directly on this class, in declaration order.
    ///
    /// Inherited properties live on the ancestor's `ClassInfo`.
    #[inline]
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Looks up a directly declared property by name.
    #[inline]
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.property_indices
            .get(name)
            .map(|&index| &self.properties[index])
    }

    /// Whether instances can be created through [`ClassInfo::construct`].
    #[inline]
    pub const fn allows_public_construction(&self) -> bool {
        self.traits
            .contains(TypeTraits::CONSTRUCTABLE.union(TypeTraits::PUBLIC_CONSTRUCT))
    }

    /// Creates a fresh default-initialized instance of this class.
    ///
    /// # Panics
    ///
    /// Panics if the class was declared `internal`; such classes can only be
    /// instantiated by the load machinery.
    pub fn construct(&self) -> ObjectRef {
        if !self.allows_public_construction() {
            panic!("class `{}` does not allow public construction", self.name);
        }
        // `allows_public_construction` implies the hook is present.
        (self.construct.unwrap())()
    }

    /// Construction entry for the load path; internal classes are allowed.
    pub(crate) fn construct_for_load(&self) -> Option<ObjectRef> {
        if !self.traits.contains(TypeTraits::CONSTRUCTABLE) {
            return None;
        }
        self.construct.map(|f| f())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ClassInfo, ParentLens, PropertyFlags, PropertyInfo};
    use crate::info::TypeTraits;
    use crate::object::Object;
    use crate::value::{FromValue, Value};

    #[derive(Default)]
    struct Golem {
        hp: i32,
    }

    impl Object for Golem {
        fn class_name(&self) -> &'static str {
            "Golem"
        }

        fn as_object(&self) -> &dyn Object {
            self
        }

        fn as_object_mut(&mut self) -> &mut dyn Object {
            self
        }
    }

    fn hp_property(flags: PropertyFlags) -> PropertyInfo {
        PropertyInfo::new::<i32>(
            "hp",
            flags,
            |obj| Value::I32(obj.downcast_ref::<Golem>().unwrap().hp),
            |obj, value| {
                obj.downcast_mut::<Golem>().unwrap().hp = i32::from_value(value).unwrap();
            },
        )
    }

    #[test]
    fn property_accessors() {
        let mut golem = Golem { hp: 7 };
        let property = hp_property(PropertyFlags::empty());
        assert_eq!(property.name(), "hp");
        assert_eq!(property.type_info().name(), "i32");
        assert!(!property.is_transient());
        assert!(matches!(property.get(&golem), Value::I32(7)));
        property.set(&mut golem, Value::I32(11));
        assert_eq!(golem.hp, 11);
    }

    #[test]
    fn transient_flag() {
        assert!(hp_property(PropertyFlags::TRANSIENT).is_transient());
    }

    #[test]
    fn property_lookup() {
        let info = ClassInfo::new(
            "Golem",
            None,
            None,
            TypeTraits::OBJECT,
            vec![hp_property(PropertyFlags::empty())],
            None,
        );
        assert!(info.property("hp").is_some());
        assert!(info.property("mp").is_none());
        assert_eq!(info.properties().len(), 1);
        assert!(info.parent().is_none());
    }

    #[test]
    #[should_panic(expected = "declares property `hp` more than once")]
    fn duplicate_property_panics() {
        let _ = ClassInfo::new(
            "Golem",
            None,
            None,
            TypeTraits::OBJECT,
            vec![
                hp_property(PropertyFlags::empty()),
                hp_property(PropertyFlags::empty()),
            ],
            None,
        );
    }

    #[test]
    #[should_panic(expected = "does not allow public construction")]
    fn internal_construct_panics() {
        let info = ClassInfo::new(
            "Golem",
            None,
            None,
            TypeTraits::OBJECT.union(TypeTraits::CONSTRUCTABLE),
            Vec::new(),
            Some(|| crate::object::ObjectRef::new(Golem::default())),
        );
        let _ = info.construct();
    }

    #[test]
    fn lens_projects_parent() {
        let lens = ParentLens {
            by_ref: |obj| obj,
            by_mut: |obj| obj,
        };
        let golem = Golem { hp: 3 };
        assert_eq!((lens.by_ref)(&golem).class_name(), "Golem");
    }
}
