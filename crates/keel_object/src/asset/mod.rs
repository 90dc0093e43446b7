//! Resolution of references that leave the document.

use thiserror::Error;

use crate::object::ObjectRef;

// -----------------------------------------------------------------------------
// AssetError

/// Failure to resolve an asset path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssetError {
    /// No asset lives at the given path.
    #[error("asset `{0}` was not found")]
    NotFound(String),
    /// The resolver failed for a reason of its own.
    #[error("{0}")]
    Other(String),
}

// -----------------------------------------------------------------------------
// AssetResolver

/// Connects a save or load session to externally managed objects.
///
/// During save, any referenced object the resolver claims through
/// [`managed_path`](AssetResolver::managed_path) is written as its path
/// instead of being embedded in the document; during load, those paths come
/// back through [`load`](AssetResolver::load). The engine caches loads per
/// session, so each distinct path is requested at most once per document.
pub trait AssetResolver {
    /// Loads the object behind an asset path.
    fn load(&mut self, path: &str) -> Result<ObjectRef, AssetError>;

    /// The asset path of `obj`, or `None` when the object belongs to the
    /// document being written.
    fn managed_path(&self, obj: &ObjectRef) -> Option<String>;
}

// -----------------------------------------------------------------------------
// UnmanagedAssets

/// The no-op resolver: nothing is managed, every path fails to load.
///
/// Used by the document entry points that take no resolver.
pub struct UnmanagedAssets;

impl AssetResolver for UnmanagedAssets {
    fn load(&mut self, path: &str) -> Result<ObjectRef, AssetError> {
        Err(AssetError::NotFound(path.to_owned()))
    }

    fn managed_path(&self, _obj: &ObjectRef) -> Option<String> {
        None
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{AssetError, AssetResolver, UnmanagedAssets};

    #[test]
    fn unmanaged_loads_nothing() {
        let mut assets = UnmanagedAssets;
        assert!(matches!(
            assets.load("textures/tiles.png"),
            Err(AssetError::NotFound(path)) if path == "textures/tiles.png"
        ));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            AssetError::NotFound("a/b".into()).to_string(),
            "asset `a/b` was not found"
        );
        assert_eq!(AssetError::Other("device lost".into()).to_string(), "device lost");
    }
}
