use crate::info::TypeInfo;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Reference tokens

/// A reference as handed to a [`FormatWriter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefToken<'a> {
    /// The null reference.
    Null,
    /// A record of the document being written.
    Index(u32),
    /// An externally managed object, stored by path.
    Asset(&'a str),
}

/// A reference as produced by a [`FormatReader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefCode {
    Null,
    Index(u32),
    Asset(String),
}

// -----------------------------------------------------------------------------
// FormatWriter

/// The writing half of a document backend.
///
/// The engine drives the writer through strictly nested scopes: records at
/// the top, groups and arrays below them. Every `begin_*` is paired with the
/// matching `end_*`; values written inside an array carry no name, values
/// written anywhere else carry one. Backends panic on calls that violate
/// this discipline, since only engine bugs or misbehaving custom `save`
/// hooks can produce them.
pub trait FormatWriter {
    /// Opens the record for the object assigned document index `index`.
    fn begin_record(&mut self, class_name: &str, index: u32);

    /// Closes the current record, discarding any scopes a failed save hook
    /// left open.
    fn end_record(&mut self);

    /// Opens a named substructure, or an anonymous one inside an array.
    fn begin_group(&mut self, name: Option<&str>);

    fn end_group(&mut self);

    /// Opens an ordered sequence scope.
    fn begin_array(&mut self, name: Option<&str>);

    fn end_array(&mut self);

    /// Writes one leaf value into the current scope.
    fn write_value(&mut self, name: Option<&str>, value: &Value);

    /// Writes one reference into the current scope.
    fn write_ref(&mut self, name: Option<&str>, token: RefToken<'_>);
}

// -----------------------------------------------------------------------------
// FormatReader

/// The reading half of a document backend.
///
/// Mirrors [`FormatWriter`]. Reads are tolerant of absent or mismatched
/// data: `begin_group` and `begin_array` report whether the scope exists,
/// and value reads return `None` instead of failing the load. Inside an
/// array, reads are positional and consume an element only when it matches;
/// a failed array read leaves the cursor in place.
pub trait FormatReader {
    /// Number of records in the document.
    fn record_count(&self) -> u32;

    /// The class name recorded at `index`, if the record carries one.
    fn record_class(&self, index: u32) -> Option<&str>;

    /// Opens the record at `index`; `false` when it cannot be entered.
    fn begin_record(&mut self, index: u32) -> bool;

    /// Closes the current record, discarding any scopes a failed load hook
    /// left open.
    fn end_record(&mut self);

    /// Opens a substructure; `false` when it is absent or not a group.
    fn begin_group(&mut self, name: Option<&str>) -> bool;

    fn end_group(&mut self);

    /// Opens a sequence; `false` when it is absent or not an array.
    fn begin_array(&mut self, name: Option<&str>) -> bool;

    fn end_array(&mut self);

    /// Reads one leaf value of the expected type from the current scope.
    fn read_value(&mut self, name: Option<&str>, expected: &TypeInfo) -> Option<Value>;

    /// Reads one reference from the current scope.
    fn read_ref(&mut self, name: Option<&str>) -> Option<RefCode>;
}
