#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod macros;

pub mod asset;
pub mod info;
pub mod json;
pub mod object;
pub mod persist;
pub mod registry;
pub mod value;

// -----------------------------------------------------------------------------
// Top-level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use asset::{AssetError, AssetResolver, UnmanagedAssets};
pub use object::{Handle, Object, ObjectRef, Persistable, WeakHandle, WeakObjectRef};
pub use persist::{LoadError, Loader, Persist, SaveError, Saver};
pub use registry::ClassRegistry;
pub use value::Value;
