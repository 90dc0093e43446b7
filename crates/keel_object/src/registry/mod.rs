//! The runtime class registry.

use hashbrown::HashMap;

use crate::info::ClassInfo;
use crate::object::{Object, Persistable};
use crate::value::Value;

mod builder;

#[cfg(feature = "auto_register")]
mod auto;

pub use builder::ClassBuilder;

#[cfg(feature = "auto_register")]
#[cfg_attr(docsrs, doc(cfg(feature = "auto_register")))]
pub use auto::ClassRegistration;

// -----------------------------------------------------------------------------
// ClassRegistry

/// The set of classes a save or load session can see.
///
/// Classes must be registered base before derived; registration order is
/// preserved for iteration. The registry also offers name-based property
/// access across the whole inheritance chain of an object.
///
/// # Examples
///
/// ```
/// use keel_object::{ClassRegistry, persist_class};
///
/// persist_class! {
///     class Decal {
///         layer: i32,
///     }
/// }
///
/// let mut registry = ClassRegistry::new();
/// registry.register::<Decal>();
/// assert!(registry.contains("Decal"));
///
/// let decal = registry.get("Decal").unwrap().construct();
/// registry.set_property(&mut *decal.borrow_mut(), "layer", 4.into());
/// assert!(matches!(
///     registry.get_property(&*decal.borrow(), "layer"),
///     Some(keel_object::Value::I32(4))
/// ));
/// ```
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<&'static str, ClassInfo>,
    names: Vec<&'static str>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class declared with [`persist_class!`](crate::persist_class).
    ///
    /// # Panics
    ///
    /// Panics if the class is already registered or its parent is not.
    pub fn register<T: Persistable>(&mut self) {
        self.register_class(T::class_info());
    }

    /// Registers a hand-built class description.
    ///
    /// # Panics
    ///
    /// Panics if the class is already registered or its parent is not.
    pub fn register_class(&mut self, info: ClassInfo) {
        let name = info.name();
        if self.classes.contains_key(name) {
            panic!("class `{name}` is already registered");
        }
        if let Some(parent) = info.parent() {
            if !self.classes.contains_key(parent) {
                panic!("parent class `{parent}` of `{name}` has not been registered");
            }
        }
        log::debug!("registered class `{name}`");
        self.names.push(name);
        self.classes.insert(name, info);
    }

    /// Looks up a class by registered name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Whether a class with the given name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Whether `name` equals `ancestor` or derives from it, directly or
    /// through intermediate classes.
    pub fn is_derived(&self, name: &str, ancestor: &str) -> bool {
        let mut current = name;
        loop {
            if current == ancestor {
                return true;
            }
            match self.get(current).and_then(ClassInfo::parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Iterates over registered classes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.names.iter().map(|name| &self.classes[name])
    }

    /// Number of registered classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Reads a property by name, searching the class chain derived to base.
    ///
    /// When a derived class shadows a base property name, the derived
    /// declaration wins. Returns `None` if the object's class is not
    /// registered or no class in the chain declares the name.
    pub fn get_property(&self, obj: &dyn Object, name: &str) -> Option<Value> {
        let mut target = obj;
        let mut info = self.get(target.class_name())?;
        loop {
            if let Some(property) = info.property(name) {
                return Some(property.get(target));
            }
            let lens = info.parent_lens()?;
            target = (lens.by_ref)(target);
            info = self.get(info.parent()?)?;
        }
    }

    /// Writes a property by name, searching the class chain derived to base.
    ///
    /// Returns whether a declaration was found.
    ///
    /// # Panics
    ///
    /// Panics if the value kind does not match the found declaration.
    pub fn set_property(&self, obj: &mut dyn Object, name: &str, value: Value) -> bool {
        let Some(mut info) = self.get(obj.class_name()) else {
            return false;
        };
        let mut target = obj;
        loop {
            if let Some(property) = info.property(name) {
                property.set(target, value);
                return true;
            }
            let (Some(lens), Some(parent)) = (info.parent_lens(), info.parent()) else {
                return false;
            };
            let Some(parent_info) = self.get(parent) else {
                return false;
            };
            target = (lens.by_mut)(target);
            info = parent_info;
        }
    }

    /// Registers every class submitted through
    /// [`persist_class!`](crate::persist_class), bases before derived
    /// classes; already registered names are skipped.
    ///
    /// Returns whether the `auto_register` feature is enabled.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            self.collect_registrations();
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
