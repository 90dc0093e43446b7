//! Hidden re-exports used by the declaration macros.
//!
//! Nothing in here is part of the public API.

#[cfg(feature = "auto_register")]
pub use inventory;
