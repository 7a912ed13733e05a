use std::path::PathBuf;

/// Errors raised by the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{collection}: document '{id}' already exists")]
    DuplicateId { collection: String, id: String },

    #[error("{collection}: document '{id}' not found")]
    NotFound { collection: String, id: String },

    #[error("{collection}: field '{field}' {reason}")]
    Schema {
        collection: String,
        field: String,
        reason: String,
    },

    #[error("{collection}: unsupported file version {version}")]
    UnsupportedVersion { collection: String, version: u32 },

    #[error("Migration of {path} failed: {message}")]
    Migration { path: PathBuf, message: String },

    #[error("Store at {path} is already open (process {pid})")]
    Locked { path: PathBuf, pid: u32 },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(collection: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            collection: collection.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
