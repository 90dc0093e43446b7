use core::fmt;
use core::marker::PhantomData;
use std::cell::{Ref, RefMut};

use crate::info::{TypeInfo, TypeInfoCell, TypeTraits, Typed, ValueKind, concat};
use crate::object::{Object, ObjectRef, Persistable, WeakObjectRef};
use crate::value::{FromValue, Value};

// -----------------------------------------------------------------------------
// Handle

/// A class-typed strong reference.
///
/// Wraps an [`ObjectRef`] whose target is declared to be `T` or a class
/// derived from `T`. Documents storing a `Handle` property record the
/// declared class, and the loader rejects references to incompatible
/// classes.
///
/// # Examples
///
/// ```
/// use keel_object::{Handle, persist_class};
///
/// persist_class! {
///     class Texture {
///         path: String,
///     }
/// }
///
/// let texture = Handle::new(Texture {
///     path: "tiles.png".into(),
/// });
/// texture.borrow_typed_mut().unwrap().path.push_str(".bak");
/// assert_eq!(texture.borrow_typed().unwrap().path, "tiles.png.bak");
/// ```
pub struct Handle<T: Persistable> {
    object: ObjectRef,
    marker: PhantomData<fn() -> T>,
}

impl<T: Persistable> Handle<T> {
    /// Moves `value` onto the heap behind a typed handle.
    pub fn new(value: T) -> Self {
        Self::from_ref(ObjectRef::new(value))
    }

    /// Wraps an untyped reference without checking its class.
    ///
    /// The caller vouches that the target is `T` or derived from `T`; the
    /// engine only calls this after validating class compatibility.
    #[inline]
    pub fn from_ref(object: ObjectRef) -> Self {
        Self {
            object,
            marker: PhantomData,
        }
    }

    /// The underlying untyped reference.
    #[inline]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Unwraps into the untyped reference.
    #[inline]
    pub fn into_ref(self) -> ObjectRef {
        self.object
    }

    /// Borrows the target as `dyn Object`.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, dyn Object> {
        self.object.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Object> {
        self.object.borrow_mut()
    }

    /// Borrows the target as exactly `T`.
    ///
    /// Returns `None` when the target is an instance of a derived class; use
    /// [`borrow`](Handle::borrow) and downcast for those.
    #[inline]
    pub fn borrow_typed(&self) -> Option<Ref<'_, T>> {
        self.object.borrow_as::<T>()
    }

    #[inline]
    pub fn borrow_typed_mut(&self) -> Option<RefMut<'_, T>> {
        self.object.borrow_as_mut::<T>()
    }

    /// Creates a weak handle to the same target.
    #[inline]
    pub fn downgrade(&self) -> WeakHandle<T> {
        WeakHandle {
            inner: self.object.downgrade(),
            marker: PhantomData,
        }
    }

    /// Whether both handles share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.object.ptr_eq(&other.object)
    }
}

impl<T: Persistable> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: Persistable> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({:?})", T::CLASS, self.object)
    }
}

impl<T: Persistable> Typed for Handle<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::reference(
                concat(&["Handle<", T::CLASS, ">"]),
                ValueKind::Ref,
                TypeTraits::POINTER.union(TypeTraits::REF_COUNTED),
                Some(T::CLASS),
            )
        })
    }
}

impl<T: Persistable> Typed for Option<Handle<T>> {
    #[inline]
    fn type_info() -> &'static TypeInfo {
        Handle::<T>::type_info()
    }
}

impl<T: Persistable> From<Handle<T>> for Value {
    #[inline]
    fn from(handle: Handle<T>) -> Self {
        Value::Ref(Some(handle.into_ref()))
    }
}

impl<T: Persistable> From<Option<Handle<T>>> for Value {
    #[inline]
    fn from(handle: Option<Handle<T>>) -> Self {
        Value::Ref(handle.map(Handle::into_ref))
    }
}

impl<T: Persistable> FromValue for Handle<T> {
    /// Null references convert to `None`; a bare `Handle` property therefore
    /// declares a reference that must not be null in the document.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Ref(Some(object)) => Some(Handle::from_ref(object)),
            _ => None,
        }
    }
}

impl<T: Persistable> FromValue for Option<Handle<T>> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Ref(object) => Some(object.map(Handle::from_ref)),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// WeakHandle

/// A class-typed weak reference.
pub struct WeakHandle<T: Persistable> {
    inner: WeakObjectRef,
    marker: PhantomData<fn() -> T>,
}

impl<T: Persistable> WeakHandle<T> {
    /// A weak handle pointing at nothing.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            inner: WeakObjectRef::empty(),
            marker: PhantomData,
        }
    }

    /// Recovers a strong handle while the target is still alive.
    #[inline]
    pub fn upgrade(&self) -> Option<Handle<T>> {
        self.inner.upgrade().map(Handle::from_ref)
    }

    /// Whether the handle was never set or its target is gone.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Persistable> Clone for WeakHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: Persistable> Default for WeakHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Persistable> fmt::Debug for WeakHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakHandle<{}>({:?})", T::CLASS, self.inner)
    }
}

impl<T: Persistable> Typed for WeakHandle<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::reference(
                concat(&["WeakHandle<", T::CLASS, ">"]),
                ValueKind::WeakRef,
                TypeTraits::POINTER,
                Some(T::CLASS),
            )
        })
    }
}

impl<T: Persistable> From<WeakHandle<T>> for Value {
    #[inline]
    fn from(handle: WeakHandle<T>) -> Self {
        Value::WeakRef(handle.inner)
    }
}

impl<T: Persistable> FromValue for WeakHandle<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::WeakRef(inner) => Some(Self {
                inner,
                marker: PhantomData,
            }),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Handle, WeakHandle};
    use crate::info::{ClassInfo, TypeInfo, TypeTraits, Typed, ValueKind};
    use crate::object::{Object, ObjectRef, Persistable};
    use crate::value::{FromValue, Value};

    #[derive(Default)]
    struct Texture {
        path: String,
    }

    impl Object for Texture {
        fn class_name(&self) -> &'static str {
            "Texture"
        }

        fn as_object(&self) -> &dyn Object {
            self
        }

        fn as_object_mut(&mut self) -> &mut dyn Object {
            self
        }
    }

    impl Typed for Texture {
        fn type_info() -> &'static TypeInfo {
            static INFO: TypeInfo = TypeInfo::class(
                "Texture",
                size_of::<Texture>(),
                TypeTraits::OBJECT
                    .union(TypeTraits::CONSTRUCTABLE)
                    .union(TypeTraits::PUBLIC_CONSTRUCT),
            );
            &INFO
        }
    }

    impl Persistable for Texture {
        const CLASS: &'static str = "Texture";

        fn class_info() -> ClassInfo {
            ClassInfo::new(
                "Texture",
                None,
                None,
                Self::type_info().traits(),
                Vec::new(),
                Some(|| ObjectRef::new(Texture::default())),
            )
        }
    }

    #[test]
    fn typed_borrow() {
        let texture = Handle::new(Texture {
            path: "tiles.png".into(),
        });
        texture.borrow_typed_mut().unwrap().path.push_str(".bak");
        assert_eq!(texture.borrow_typed().unwrap().path, "tiles.png.bak");
        assert_eq!(texture.borrow().class_name(), "Texture");
    }

    #[test]
    fn descriptor() {
        let info = Handle::<Texture>::type_info();
        assert_eq!(info.name(), "Handle<Texture>");
        assert_eq!(info.kind(), ValueKind::Ref);
        assert_eq!(info.referenced_class(), Some("Texture"));
        assert!(core::ptr::eq(info, Handle::<Texture>::type_info()));
        assert!(core::ptr::eq(info, <Option<Handle<Texture>>>::type_info()));

        let weak = WeakHandle::<Texture>::type_info();
        assert_eq!(weak.name(), "WeakHandle<Texture>");
        assert_eq!(weak.kind(), ValueKind::WeakRef);
    }

    #[test]
    fn weak_lifecycle() {
        let strong = Handle::new(Texture::default());
        let weak = strong.downgrade();
        assert!(weak.upgrade().unwrap().ptr_eq(&strong));
        drop(strong);
        assert!(weak.is_empty());
        assert!(WeakHandle::<Texture>::empty().is_empty());
    }

    #[test]
    fn value_conversions() {
        let texture = Handle::new(Texture::default());
        let addr = texture.object().addr();

        let value = Value::from(Some(texture));
        assert_eq!(value.kind(), ValueKind::Ref);
        let back = <Option<Handle<Texture>>>::from_value(value).unwrap().unwrap();
        assert_eq!(back.object().addr(), addr);

        assert!(Handle::<Texture>::from_value(Value::Ref(None)).is_none());
        assert_eq!(
            <Option<Handle<Texture>>>::from_value(Value::Ref(None)).map(|h| h.is_none()),
            Some(true)
        );
    }
}
