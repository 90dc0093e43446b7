use crate::info::{ClassInfo, ParentLens, PropertyInfo, TypeTraits};
use crate::object::ObjectRef;

// -----------------------------------------------------------------------------
// ClassBuilder

/// Assembles a [`ClassInfo`] step by step.
///
/// [`persist_class!`](crate::persist_class) drives this builder; calling it
/// directly is only needed for classes whose property set cannot be written
/// down statically.
pub struct ClassBuilder {
    name: &'static str,
    parent: Option<&'static str>,
    parent_lens: Option<ParentLens>,
    traits: TypeTraits,
    properties: Vec<PropertyInfo>,
    construct: Option<fn() -> ObjectRef>,
}

impl ClassBuilder {
    /// Starts a class description with the given registered name.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            parent_lens: None,
            traits: TypeTraits::OBJECT,
            properties: Vec::new(),
            construct: None,
        }
    }

    /// Declares the parent class and the lens onto its embedded struct.
    pub fn parent(mut self, name: &'static str, lens: ParentLens) -> Self {
        self.parent = Some(name);
        self.parent_lens = Some(lens);
        self
    }

    /// Appends a property; order here is the order in documents.
    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    /// Installs the construction hook and allows public construction.
    pub fn construct(mut self, construct: fn() -> ObjectRef) -> Self {
        self.traits |= TypeTraits::CONSTRUCTABLE | TypeTraits::PUBLIC_CONSTRUCT;
        self.construct = Some(construct);
        self
    }

    /// Installs the construction hook for engine use only; calling
    /// [`ClassInfo::construct`] on the result panics.
    pub fn construct_internal(mut self, construct: fn() -> ObjectRef) -> Self {
        self.traits |= TypeTraits::CONSTRUCTABLE;
        self.construct = Some(construct);
        self
    }

    /// Finishes the description.
    ///
    /// # Panics
    ///
    /// Panics if two properties share a name.
    pub fn build(self) -> ClassInfo {
        ClassInfo::new(
            self.name,
            self.parent,
            self.parent_lens,
            self.traits,
            self.properties,
            self.construct,
        )
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ClassBuilder;
    use crate::info::{ParentLens, TypeTraits};
    use crate::object::{Object, ObjectRef};

    #[derive(Default)]
    struct Anchor;

    impl Object for Anchor {
        fn class_name(&self) -> &'static str {
            "Anchor"
        }

        fn as_object(&self) -> &dyn Object {
            self
        }

        fn as_object_mut(&mut self) -> &mut dyn Object {
            self
        }
    }

    #[test]
    fn public_construct_traits() {
        let info = ClassBuilder::new("Anchor")
            .construct(|| ObjectRef::new(Anchor))
            .build();
        assert_eq!(info.name(), "Anchor");
        assert!(info.allows_public_construction());
        assert_eq!(info.construct().class_name(), "Anchor");
    }

    #[test]
    fn internal_construct_traits() {
        let info = ClassBuilder::new("Anchor")
            .construct_internal(|| ObjectRef::new(Anchor))
            .build();
        assert!(info.traits().contains(TypeTraits::CONSTRUCTABLE));
        assert!(!info.traits().contains(TypeTraits::PUBLIC_CONSTRUCT));
        assert!(!info.allows_public_construction());
    }

    #[test]
    fn non_constructable_by_default() {
        let info = ClassBuilder::new("Anchor").build();
        assert!(!info.traits().contains(TypeTraits::CONSTRUCTABLE));
        assert!(info.construct_for_load().is_none());
    }

    #[test]
    fn parent_link() {
        let info = ClassBuilder::new("Anchor")
            .parent(
                "Base",
                ParentLens {
                    by_ref: |obj| obj,
                    by_mut: |obj| obj,
                },
            )
            .build();
        assert_eq!(info.parent(), Some("Base"));
        assert!(info.parent_lens().is_some());
    }
}
