use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InnoventoryError {
    #[error("Data directory not found at {0}. Run 'innoventory init' to create it.")]
    DataDirNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Data directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("'{reference}' matches more than one {entity}: {matches}. Use the id instead.")]
    Ambiguous {
        entity: &'static str,
        reference: String,
        matches: String,
    },

    #[error("{entity} #{id} has been deleted. Restore it first.")]
    Deleted { entity: &'static str, id: u32 },

    #[error("{entity} #{id} is not deleted")]
    NotDeleted { entity: &'static str, id: u32 },

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Cannot delete {entity} #{id}: referenced by {referenced_by}")]
    InUse {
        entity: &'static str,
        id: u32,
        referenced_by: String,
    },

    #[error("Unknown column '{column}'. Available: {available}")]
    UnknownColumn { column: String, available: String },

    #[error("Invalid filter '{0}'. Expected 'column=value' (e.g., 'city=pune')")]
    InvalidFilter(String),

    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    #[error("File not found: {0}")]
    UploadNotFound(PathBuf),

    #[error("File {path} is {size} bytes, over the {max} byte limit")]
    UploadTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("File {path} is empty")]
    UploadEmpty { path: PathBuf },

    #[error("File type '.{extension}' is not allowed. Allowed: {allowed}")]
    UploadType { extension: String, allowed: String },

    #[error("{entity} #{id} has no attachment named '{name}'")]
    AttachmentNotFound {
        entity: &'static str,
        id: u32,
        name: String,
    },

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InnoventoryError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        InnoventoryError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InnoventoryError>;
