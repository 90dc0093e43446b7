use thiserror::Error;

use crate::asset::AssetError;

// -----------------------------------------------------------------------------
// SaveError

/// Failure while writing an object graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaveError {
    /// An object in the graph belongs to a class the registry does not know.
    #[error("class `{class}` is not registered")]
    UnknownClass { class: String },

    /// The document could not be rendered to text.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// -----------------------------------------------------------------------------
// LoadError

/// Failure while reconstructing an object graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The document has no records, so there is no primary object.
    #[error("document contains no records")]
    EmptyDocument,

    /// A reference names a record index past the end of the document.
    #[error("record index {index} is out of range for a document of {count} records")]
    BadRecordIndex { index: u32, count: u32 },

    /// A record carries no class name.
    #[error("record {index} does not name a class")]
    MissingClass { index: u32 },

    /// A record names a class the registry does not know.
    #[error("class `{class}` is not registered")]
    UnknownClass { class: String },

    /// A reference resolved to a class outside the expected chain.
    #[error("class `{found}` is not compatible with expected class `{expected}`")]
    ClassMismatch { found: String, expected: String },

    /// A record names a class without a construction hook.
    #[error("class `{class}` cannot be constructed")]
    NotConstructable { class: String },

    /// The document structure is not what the format requires.
    #[error("malformed document: {0}")]
    Malformed(&'static str),

    /// An asset reference could not be resolved.
    #[error("failed to resolve asset `{path}`")]
    Asset {
        path: String,
        #[source]
        source: AssetError,
    },

    /// The document could not be parsed as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{LoadError, SaveError};
    use crate::asset::AssetError;

    #[test]
    fn save_messages() {
        let err = SaveError::UnknownClass {
            class: "Ghost".into(),
        };
        assert_eq!(err.to_string(), "class `Ghost` is not registered");
    }

    #[test]
    fn load_messages() {
        assert_eq!(
            LoadError::EmptyDocument.to_string(),
            "document contains no records"
        );
        assert_eq!(
            LoadError::BadRecordIndex { index: 4, count: 2 }.to_string(),
            "record index 4 is out of range for a document of 2 records"
        );
        assert_eq!(
            LoadError::ClassMismatch {
                found: "Decal".into(),
                expected: "Light".into(),
            }
            .to_string(),
            "class `Decal` is not compatible with expected class `Light`"
        );
        assert_eq!(
            LoadError::Malformed("root is not an array").to_string(),
            "malformed document: root is not an array"
        );
    }

    #[test]
    fn asset_source_is_kept() {
        let err = LoadError::Asset {
            path: "fx/fire".into(),
            source: AssetError::NotFound("fx/fire".into()),
        };
        assert_eq!(err.to_string(), "failed to resolve asset `fx/fire`");
        assert!(std::error::Error::source(&err).is_some());
    }
}
