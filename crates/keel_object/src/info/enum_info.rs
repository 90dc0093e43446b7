use hashbrown::HashMap;

// -----------------------------------------------------------------------------
// EnumInfo

/// The constant table of a registered enumeration.
///
/// Maps constant names to their numeric values and back. Names are kept in
/// declaration order; when two constants share a value, the first declared
/// name wins the reverse lookup.
#[derive(Debug)]
pub struct EnumInfo {
    name: &'static str,
    constants: HashMap<&'static str, i64>,
    names: Box<[&'static str]>,
}

impl EnumInfo {
    /// Creates a constant table from `(name, value)` pairs in declaration
    /// order.
    pub fn new(name: &'static str, constants: &[(&'static str, i64)]) -> Self {
        Self {
            name,
            constants: constants.iter().copied().collect(),
            names: constants.iter().map(|(n, _)| *n).collect(),
        }
    }

    /// The enumeration name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The numeric value of the constant `name`, if declared.
    #[inline]
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.constants.get(name).copied()
    }

    /// The canonical name and value of the constant `name`, if declared.
    #[inline]
    pub fn constant(&self, name: &str) -> Option<(&'static str, i64)> {
        self.constants
            .get_key_value(name)
            .map(|(name, value)| (*name, *value))
    }

    /// The first declared constant name with the numeric value `value`.
    pub fn name_of(&self, value: i64) -> Option<&'static str> {
        self.names
            .iter()
            .copied()
            .find(|name| self.constants[name] == value)
    }

    /// Whether a constant with the given name is declared.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// Constant names in declaration order.
    #[inline]
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Number of declared constants.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Enumerated

/// A persistable enumeration.
///
/// Implemented by [`persist_enum!`](crate::persist_enum). Values travel
/// through documents by constant name, so every variant must appear in the
/// [`EnumInfo`] table.
pub trait Enumerated: Copy + 'static {
    /// Returns the constant table for this enumeration.
    fn enum_info() -> &'static EnumInfo;

    /// The declared name of this value.
    fn name(self) -> &'static str;

    /// The numeric value of this constant.
    fn raw(self) -> i64;

    /// Converts a numeric value back to a constant, if one is declared for it.
    fn from_raw(raw: i64) -> Option<Self>;

    /// Converts a constant name back to a value. Names are case sensitive.
    fn from_name(name: &str) -> Option<Self> {
        Self::enum_info().value_of(name).and_then(Self::from_raw)
    }
}

// -----------------------------------------------------------------------------
// Tests
