use core::any::TypeId;
use core::hash::{BuildHasher, Hasher};
use std::sync::{PoisonError, RwLock};

use bitflags::bitflags;
use hashbrown::HashMap;

use crate::info::{EnumInfo, ValueKind};

// -----------------------------------------------------------------------------
// TypeTraits

bitflags! {
    /// Bitflags describing the capabilities of a registered type.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct TypeTraits: u8 {
        /// The type refers to another object rather than owning its data.
        const POINTER          = 1 << 0;
        /// The reference participates in shared ownership.
        const REF_COUNTED      = 1 << 1;
        /// The type is a registered enumeration.
        const ENUM             = 1 << 2;
        /// The type is a persistable class.
        const OBJECT           = 1 << 3;
        /// Instances can be created through the class registry.
        const CONSTRUCTABLE    = 1 << 4;
        /// Construction is allowed outside the persistence engine.
        const PUBLIC_CONSTRUCT = 1 << 5;
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// A static descriptor for a persistable type.
///
/// Exactly one `TypeInfo` exists per distinct type for the lifetime of the
/// process; it is created lazily on first access and cached. Use
/// [`Typed::type_info`] to obtain it.
///
/// # Examples
///
/// ```
/// use keel_object::info::{Typed, ValueKind};
///
/// let info = <f32 as Typed>::type_info();
/// assert_eq!(info.kind(), ValueKind::F32);
/// assert_eq!(info.name(), "f32");
///
/// // Repeated lookups return the same descriptor.
/// assert!(core::ptr::eq(info, <f32 as Typed>::type_info()));
/// ```
#[derive(Debug)]
pub struct TypeInfo {
    name: &'static str,
    size: usize,
    kind: ValueKind,
    traits: TypeTraits,
    // Class name constraint for reference types; `None` accepts any class.
    referenced_class: Option<&'static str>,
    // `EnumInfo` is created on first access; using a function pointer delays it.
    enum_info: Option<fn() -> &'static EnumInfo>,
}

impl TypeInfo {
    /// Creates a descriptor for a plain leaf value type.
    pub const fn leaf(name: &'static str, size: usize, kind: ValueKind) -> Self {
        Self {
            name,
            size,
            kind,
            traits: TypeTraits::empty(),
            referenced_class: None,
            enum_info: None,
        }
    }

    /// Creates a descriptor for a registered enumeration.
    pub const fn enumeration(
        name: &'static str,
        size: usize,
        enum_info: fn() -> &'static EnumInfo,
    ) -> Self {
        Self {
            name,
            size,
            kind: ValueKind::Enum,
            traits: TypeTraits::ENUM,
            referenced_class: None,
            enum_info: Some(enum_info),
        }
    }

    /// Creates a descriptor for an object reference type.
    ///
    /// `referenced_class` constrains which classes the reference may resolve
    /// to; `None` accepts any registered class.
    pub const fn reference(
        name: &'static str,
        kind: ValueKind,
        traits: TypeTraits,
        referenced_class: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            size: size_of::<usize>(),
            kind,
            traits,
            referenced_class,
            enum_info: None,
        }
    }

    /// Creates a descriptor for a persistable class type.
    pub const fn class(name: &'static str, size: usize, traits: TypeTraits) -> Self {
        Self {
            name,
            size,
            kind: ValueKind::Object,
            traits,
            referenced_class: None,
            enum_info: None,
        }
    }

    /// The type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Size of the in-memory representation in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The value kind of this type.
    #[inline]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The trait bitset of this type.
    #[inline]
    pub const fn traits(&self) -> TypeTraits {
        self.traits
    }

    /// Whether the given traits are all present.
    #[inline]
    pub const fn has_traits(&self, traits: TypeTraits) -> bool {
        self.traits.contains(traits)
    }

    /// For reference types, the class the reference is constrained to.
    ///
    /// `None` either means the type is not a reference or that it accepts
    /// any registered class.
    #[inline]
    pub const fn referenced_class(&self) -> Option<&'static str> {
        self.referenced_class
    }

    /// For enumerations, the constant table.
    #[inline]
    pub fn enum_info(&self) -> Option<&'static EnumInfo> {
        self.enum_info.map(|f| f())
    }
}

// -----------------------------------------------------------------------------
// Typed

/// A static accessor to type information.
///
/// Implemented for every leaf value kind, for types declared with
/// [`persist_class!`](crate::persist_class) and
/// [`persist_enum!`](crate::persist_enum), and for the reference forms
/// ([`Option<Handle<T>>`], [`WeakHandle<T>`] and the untyped equivalents).
///
/// # Examples
///
/// ```
/// use keel_object::info::{Typed, ValueKind};
///
/// assert_eq!(<bool as Typed>::type_info().kind(), ValueKind::Bool);
/// assert_eq!(<String as Typed>::type_info().name(), "String");
/// ```
///
/// [`Option<Handle<T>>`]: crate::Handle
/// [`WeakHandle<T>`]: crate::WeakHandle
pub trait Typed: 'static {
    /// Returns the cached [`TypeInfo`] for this type.
    fn type_info() -> &'static TypeInfo;
}

// -----------------------------------------------------------------------------
// TypeInfoCell

/// Hash state for [`TypeId`] keys; the id is already a hash, so it passes
/// through unchanged.
///
/// Zero-sized, which keeps [`TypeInfoCell::new`] a `const` constructor.
#[derive(Copy, Clone, Default, Debug)]
struct TypeIdHashState;

/// Stores the one `u64` a [`TypeId`] hashes as.
#[derive(Copy, Clone, Default, Debug)]
struct TypeIdHasher {
    hash: u64,
}

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        // Fallback; keeps a single `write_u32(x)` equal to `write_u64(x)`.
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

impl BuildHasher for TypeIdHashState {
    type Hasher = TypeIdHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        TypeIdHasher { hash: 0 }
    }
}

/// Static storage for the [`TypeInfo`] of generic types.
///
/// A `static` inside a generic function is shared by every instantiation, so
/// descriptors for generic types (the typed handles) are kept in a map keyed
/// by [`TypeId`] and leaked to obtain the `'static` lifetime.
pub struct TypeInfoCell(RwLock<HashMap<TypeId, &'static TypeInfo, TypeIdHashState>>);

impl TypeInfoCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(HashMap::with_hasher(TypeIdHashState)))
    }

    /// Returns the descriptor stored for type `G`, creating it from `f` on
    /// first access.
    pub fn get_or_insert<G: ?Sized + 'static>(
        &self,
        f: impl FnOnce() -> TypeInfo,
    ) -> &'static TypeInfo {
        let type_id = TypeId::of::<G>();
        if let Some(info) = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
        {
            return info;
        }
        *self
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_insert_with(|| Box::leak(Box::new(f())))
    }
}

/// Concatenates string parts into a leaked `'static` string.
///
/// Used to build names for generic type descriptors; the result lives for
/// the rest of the process, so callers must be bounded (one per type).
pub(crate) fn concat(parts: &[&str]) -> &'static str {
    let mut out = String::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.push_str(part);
    }
    Box::leak(out.into_boxed_str())
}

// -----------------------------------------------------------------------------
// Leaf impls

macro_rules! impl_typed_leaf {
    ($($ty:ty => $name:literal, $kind:ident;)*) => {$(
        impl Typed for $ty {
            #[inline]
            fn type_info() -> &'static TypeInfo {
                static INFO: TypeInfo =
                    TypeInfo::leaf($name, size_of::<$ty>(), ValueKind::$kind);
                &INFO
            }
        }
    )*};
}

impl_typed_leaf! {
    bool => "bool", Bool;
    i8 => "i8", I8;
    i16 => "i16", I16;
    i32 => "i32", I32;
    i64 => "i64", I64;
    u8 => "u8", U8;
    u16 => "u16", U16;
    u32 => "u32", U32;
    u64 => "u64", U64;
    f32 => "f32", F32;
    f64 => "f64", F64;
    String => "String", Str;
    Vec<u8> => "Vec<u8>", Bytes;
    keel_math::Vec2 => "Vec2", Vec2;
    keel_math::Vec3 => "Vec3", Vec3;
    keel_math::Vec4 => "Vec4", Vec4;
    keel_math::IVec2 => "IVec2", IVec2;
    keel_math::IVec3 => "IVec3", IVec3;
    keel_math::IVec4 => "IVec4", IVec4;
    keel_math::UVec2 => "UVec2", UVec2;
    keel_math::UVec3 => "UVec3", UVec3;
    keel_math::UVec4 => "UVec4", UVec4;
    keel_math::Quat => "Quat", Quat;
}

// -----------------------------------------------------------------------------
// Tests
