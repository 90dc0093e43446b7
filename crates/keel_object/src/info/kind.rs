// -----------------------------------------------------------------------------
// ValueKind

/// The closed set of kinds a persisted value can have.
///
/// Every [`TypeInfo`](crate::info::TypeInfo) carries exactly one kind. Leaf
/// kinds map one-to-one onto the wire representation; [`Object`] marks class
/// types themselves, which never appear as property values directly and are
/// reached through [`Ref`] or [`WeakRef`] instead.
///
/// [`Object`]: ValueKind::Object
/// [`Ref`]: ValueKind::Ref
/// [`WeakRef`]: ValueKind::WeakRef
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// An owned UTF-8 string.
    Str,
    /// A raw byte payload, base64-encoded on the wire.
    Bytes,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    Quat,
    /// A registered enumeration, stored by symbolic constant name.
    Enum,
    /// A nullable reference-counted object reference.
    Ref,
    /// A non-owning object reference.
    WeakRef,
    /// A class type. Not a valid property kind.
    Object,
}

impl ValueKind {
    /// A short lowercase name, used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Str => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Vec4 => "vec4",
            ValueKind::IVec2 => "ivec2",
            ValueKind::IVec3 => "ivec3",
            ValueKind::IVec4 => "ivec4",
            ValueKind::UVec2 => "uvec2",
            ValueKind::UVec3 => "uvec3",
            ValueKind::UVec4 => "uvec4",
            ValueKind::Quat => "quat",
            ValueKind::Enum => "enum",
            ValueKind::Ref => "ref",
            ValueKind::WeakRef => "weak ref",
            ValueKind::Object => "object",
        }
    }

    /// Whether values of this kind are object references.
    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(self, ValueKind::Ref | ValueKind::WeakRef)
    }
}

impl core::fmt::Display for ValueKind {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ValueKind;

    #[test]
    fn names() {
        assert_eq!(ValueKind::F32.name(), "f32");
        assert_eq!(ValueKind::WeakRef.to_string(), "weak ref");
    }

    #[test]
    fn reference_kinds() {
        assert!(ValueKind::Ref.is_reference());
        assert!(ValueKind::WeakRef.is_reference());
        assert!(!ValueKind::Object.is_reference());
        assert!(!ValueKind::Str.is_reference());
    }
}
