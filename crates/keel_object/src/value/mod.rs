//! The tagged value type carried through property accessors.

use keel_math::{IVec2, IVec3, IVec4, Quat, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

use crate::info::ValueKind;
use crate::object::{ObjectRef, WeakObjectRef};

// -----------------------------------------------------------------------------
// EnumValue

/// An enumeration constant as carried by [`Value::Enum`].
///
/// Keeps both the declared name and the numeric value; documents store the
/// name, in-memory comparisons use the value.
#[derive(Clone, Copy, Debug)]
pub struct EnumValue {
    pub name: &'static str,
    pub value: i64,
}

// -----------------------------------------------------------------------------
// Value

/// An owned, tagged copy of a single property value.
///
/// Property accessors move data in and out of objects through this type, one
/// variant per [`ValueKind`]. Conversions from the underlying Rust types go
/// through [`From`], the reverse through [`FromValue`].
///
/// # Examples
///
/// ```
/// use keel_object::info::ValueKind;
/// use keel_object::value::{FromValue, Value};
///
/// let value = Value::from(365u32);
/// assert_eq!(value.kind(), ValueKind::U32);
/// assert_eq!(u32::from_value(value), Some(365));
/// ```
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    UVec2(UVec2),
    UVec3(UVec3),
    UVec4(UVec4),
    Quat(Quat),
    Enum(EnumValue),
    /// A strong reference slot; `None` is the null reference.
    Ref(Option<ObjectRef>),
    /// A weak reference slot; empty when the target was never set or dropped.
    WeakRef(WeakObjectRef),
}

impl Value {
    /// The kind tag of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Str(_) => ValueKind::Str,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::IVec2(_) => ValueKind::IVec2,
            Value::IVec3(_) => ValueKind::IVec3,
            Value::IVec4(_) => ValueKind::IVec4,
            Value::UVec2(_) => ValueKind::UVec2,
            Value::UVec3(_) => ValueKind::UVec3,
            Value::UVec4(_) => ValueKind::UVec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::Enum(_) => ValueKind::Enum,
            Value::Ref(_) => ValueKind::Ref,
            Value::WeakRef(_) => ValueKind::WeakRef,
        }
    }
}

// -----------------------------------------------------------------------------
// FromValue

/// Extraction of the underlying data from a [`Value`] of the matching kind.
///
/// Returns `None` when the value carries a different kind; no coercion is
/// attempted.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_value_conv {
    ($($variant:ident => $ty:ty;)*) => {$(
        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl FromValue for $ty {
            #[inline]
            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(value) => Some(value),
                    _ => None,
                }
            }
        }
    )*};
}

impl_value_conv! {
    Bool => bool;
    I8 => i8;
    I16 => i16;
    I32 => i32;
    I64 => i64;
    U8 => u8;
    U16 => u16;
    U32 => u32;
    U64 => u64;
    F32 => f32;
    F64 => f64;
    Str => String;
    Bytes => Vec<u8>;
    Vec2 => Vec2;
    Vec3 => Vec3;
    Vec4 => Vec4;
    IVec2 => IVec2;
    IVec3 => IVec3;
    IVec4 => IVec4;
    UVec2 => UVec2;
    UVec3 => UVec3;
    UVec4 => UVec4;
    Quat => Quat;
    Enum => EnumValue;
    Ref => Option<ObjectRef>;
    WeakRef => WeakObjectRef;
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{EnumValue, FromValue, Value};
    use crate::info::ValueKind;
    use crate::object::WeakObjectRef;

    #[test]
    fn kind_tags() {
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Str(String::new()).kind(), ValueKind::Str);
        assert_eq!(Value::Quat(keel_math::Quat::IDENTITY).kind(), ValueKind::Quat);
        assert_eq!(Value::Ref(None).kind(), ValueKind::Ref);
        assert_eq!(
            Value::WeakRef(WeakObjectRef::empty()).kind(),
            ValueKind::WeakRef
        );
    }

    #[test]
    fn conversions() {
        assert!(matches!(Value::from(-3i16), Value::I16(-3)));
        assert_eq!(i16::from_value(Value::I16(-3)), Some(-3));
        assert_eq!(
            String::from_value(Value::Str("keel".into())).as_deref(),
            Some("keel")
        );
    }

    #[test]
    fn kind_mismatch_is_none() {
        assert_eq!(u32::from_value(Value::I32(5)), None);
        assert_eq!(bool::from_value(Value::U8(1)), None);
    }

    #[test]
    fn enum_value_fields() {
        let value = Value::from(EnumValue {
            name: "Linear",
            value: 1,
        });
        assert_eq!(value.kind(), ValueKind::Enum);
        let constant = EnumValue::from_value(value).unwrap();
        assert_eq!(constant.name, "Linear");
        assert_eq!(constant.value, 1);
    }
}
