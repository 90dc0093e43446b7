//! Shared object references and the persistable object trait.

use core::any::{Any, TypeId};
use core::fmt;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::info::{ClassInfo, TypeInfo, TypeTraits, Typed, ValueKind};
use crate::persist::{LoadError, Loader, SaveError, Saver};

mod handle;

pub use handle::{Handle, WeakHandle};

// -----------------------------------------------------------------------------
// Object

/// The base trait of every persistable object.
///
/// Classes are normally declared with [`persist_class!`](crate::persist_class),
/// which implements this trait together with [`Persistable`]. The `save` and
/// `load` hooks default to property-driven persistence; override them to
/// serialize state the property system cannot describe, calling
/// [`Saver::save_properties`] and [`Loader::load_properties`] for the
/// declared part.
pub trait Object: Any {
    /// The registered class name of this object.
    fn class_name(&self) -> &'static str;

    /// Upcasts to the object trait; implemented by
    /// [`impl_object_fn!`](crate::impl_object_fn).
    fn as_object(&self) -> &dyn Object;

    fn as_object_mut(&mut self) -> &mut dyn Object;

    /// Writes this object's state into the current record.
    fn save(&self, ar: &mut Saver<'_>) -> Result<(), SaveError> {
        ar.save_properties(self.as_object(), self.class_name())
    }

    /// Restores this object's state from the current record.
    fn load(&mut self, ar: &mut Loader<'_>) -> Result<(), LoadError> {
        // Taken before `as_object_mut` borrows `self` mutably.
        let class_name = self.class_name();
        ar.load_properties(self.as_object_mut(), class_name)
    }
}

impl dyn Object {
    /// Whether the underlying concrete type is `T`.
    #[inline]
    pub fn is<T: Object>(&self) -> bool {
        let any: &dyn Any = self;
        any.type_id() == TypeId::of::<T>()
    }

    /// Downcasts to a concrete `&T`, or `None` when the type differs.
    #[inline]
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    /// Downcasts to a concrete `&mut T`, or `None` when the type differs.
    #[inline]
    pub fn downcast_mut<T: Object>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }
}

impl fmt::Debug for dyn Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.class_name())
    }
}

// -----------------------------------------------------------------------------
// ObjectRef

/// A shared, mutable handle to an object on the heap.
///
/// Reference identity is what the persistence engine deduplicates on: two
/// `ObjectRef`s compare [`ptr_eq`](ObjectRef::ptr_eq) exactly when they share
/// one allocation.
///
/// # Examples
///
/// ```
/// use keel_object::object::{Object, ObjectRef};
///
/// struct Camera {
///     fov: f32,
/// }
///
/// impl Object for Camera {
///     fn class_name(&self) -> &'static str {
///         "Camera"
///     }
///
///     fn as_object(&self) -> &dyn Object {
///         self
///     }
///
///     fn as_object_mut(&mut self) -> &mut dyn Object {
///         self
///     }
/// }
///
/// let camera = ObjectRef::new(Camera { fov: 60.0 });
/// assert_eq!(camera.class_name(), "Camera");
/// assert_eq!(camera.borrow_as::<Camera>().unwrap().fov, 60.0);
/// ```
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<dyn Object>>);

impl ObjectRef {
    /// Moves `value` onto the heap behind a shared handle.
    pub fn new<T: Object>(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Borrows the object immutably.
    ///
    /// # Panics
    ///
    /// Panics if the object is mutably borrowed.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, dyn Object> {
        self.0.borrow()
    }

    /// Borrows the object mutably.
    ///
    /// # Panics
    ///
    /// Panics if the object is already borrowed.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Object> {
        self.0.borrow_mut()
    }

    /// Borrows and downcasts in one step; `None` when the concrete type is
    /// not `T`.
    pub fn borrow_as<T: Object>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), |obj| obj.downcast_ref::<T>()).ok()
    }

    pub fn borrow_as_mut<T: Object>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.0.borrow_mut(), |obj| obj.downcast_mut::<T>()).ok()
    }

    /// The registered class name of the referenced object.
    ///
    /// # Panics
    ///
    /// Panics if the object is mutably borrowed.
    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.0.borrow().class_name()
    }

    /// The allocation address, stable for the lifetime of the object.
    #[inline]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether both handles share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Creates a weak handle that does not keep the object alive.
    #[inline]
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Some(Rc::downgrade(&self.0)))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(obj) => write!(f, "ObjectRef({})", obj.class_name()),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}

impl Typed for Option<ObjectRef> {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::reference(
            "ObjectRef",
            ValueKind::Ref,
            TypeTraits::POINTER.union(TypeTraits::REF_COUNTED),
            None,
        );
        &INFO
    }
}

// -----------------------------------------------------------------------------
// WeakObjectRef

/// A non-owning counterpart to [`ObjectRef`].
///
/// Starts out empty and becomes empty again once the referenced object is
/// dropped; persistence treats an empty weak reference as null.
#[derive(Clone, Default)]
pub struct WeakObjectRef(Option<Weak<RefCell<dyn Object>>>);

impl WeakObjectRef {
    /// A weak reference pointing at nothing.
    #[inline]
    pub const fn empty() -> Self {
        Self(None)
    }

    /// Recovers a strong handle while the object is still alive.
    #[inline]
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.as_ref().and_then(Weak::upgrade).map(ObjectRef)
    }

    /// Whether the reference was never set or its target is gone.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.upgrade().is_none()
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(target) => write!(f, "WeakObjectRef({})", target.class_name()),
            None => f.write_str("WeakObjectRef(<empty>)"),
        }
    }
}

impl Typed for WeakObjectRef {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::reference(
            "WeakObjectRef",
            ValueKind::WeakRef,
            TypeTraits::POINTER,
            None,
        );
        &INFO
    }
}

// -----------------------------------------------------------------------------
// Persistable

/// A class declared to the persistence engine.
///
/// Implemented by [`persist_class!`](crate::persist_class); the
/// [`ClassInfo`] returned from [`class_info`](Persistable::class_info) is
/// what gets stored in the [`ClassRegistry`](crate::ClassRegistry).
pub trait Persistable: Object + Typed + Default {
    /// The registered class name.
    const CLASS: &'static str;

    /// Builds the class description handed to the registry.
    fn class_info() -> ClassInfo;
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Object, ObjectRef, WeakObjectRef};

    struct Lamp {
        lit: bool,
    }

    impl Object for Lamp {
        fn class_name(&self) -> &'static str {
            "Lamp"
        }

        fn as_object(&self) -> &dyn Object {
            self
        }

        fn as_object_mut(&mut self) -> &mut dyn Object {
            self
        }
    }

    struct Door;

    impl Object for Door {
        fn class_name(&self) -> &'static str {
            "Door"
        }

        fn as_object(&self) -> &dyn Object {
            self
        }

        fn as_object_mut(&mut self) -> &mut dyn Object {
            self
        }
    }

    #[test]
    fn downcasts() {
        let lamp = ObjectRef::new(Lamp { lit: false });
        {
            let obj = lamp.borrow();
            assert!(obj.is::<Lamp>());
            assert!(!obj.is::<Door>());
            assert!(obj.downcast_ref::<Lamp>().is_some());
            assert!(obj.downcast_ref::<Door>().is_none());
        }
        lamp.borrow_as_mut::<Lamp>().unwrap().lit = true;
        assert!(lamp.borrow_as::<Lamp>().unwrap().lit);
        assert!(lamp.borrow_as::<Door>().is_none());
    }

    #[test]
    fn identity() {
        let a = ObjectRef::new(Lamp { lit: false });
        let b = a.clone();
        let c = ObjectRef::new(Lamp { lit: false });
        assert!(a.ptr_eq(&b));
        assert_eq!(a.addr(), b.addr());
        assert!(!a.ptr_eq(&c));
        assert_ne!(a.addr(), c.addr());
    }

    #[test]
    fn weak_lifecycle() {
        assert!(WeakObjectRef::empty().is_empty());

        let strong = ObjectRef::new(Door);
        let weak = strong.downgrade();
        assert!(!weak.is_empty());
        assert!(weak.upgrade().unwrap().ptr_eq(&strong));

        drop(strong);
        assert!(weak.is_empty());
        assert!(weak.upgrade().is_none());
    }
}
