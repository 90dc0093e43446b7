//! Static descriptors for types, enumerations and classes.
//!
//! Everything in this module is registered once and then shared as
//! `&'static` references for the lifetime of the process.

mod class_info;
mod enum_info;
mod kind;
mod type_info;

pub use class_info::{ClassInfo, ParentLens, PropertyFlags, PropertyInfo};
pub use enum_info::{EnumInfo, Enumerated};
pub use kind::ValueKind;
pub use type_info::{TypeInfo, TypeInfoCell, TypeTraits, Typed};

pub(crate) use type_info::concat;
