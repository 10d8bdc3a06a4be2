use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error type returned when reading a config file from disk.
///
/// Loading is the only fallible surface of the crate. Validation, compilation and aggregation
/// degrade to defaults and report through [`crate::diagnostics::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid config JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file exists but contains only whitespace.
    #[error("config file is empty: {}", path.display())]
    Empty { path: PathBuf },
}

/// A configured apply rule could not be compiled for one attribute filter.
///
/// The `Display` text is the diagnostic reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The selected branch names an operator that does not parse.
    #[error("unsupported applyRule op '{op}' for '{target}'.")]
    UnsupportedOp { op: String, target: String },

    /// Neither the branch nor the filter names a field.
    #[error("applyRule has no field and targetAttribute is empty for '{target}'.")]
    MissingField { target: String },

    /// The branch has a configured value that yields no literal.
    #[error("applyRule for '{field}' has empty literal value.")]
    EmptyLiteral { field: String },
}

/// An `(objectType, attribute)` pair does not name a readable model source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("attribute cannot be empty")]
    EmptyAttribute,

    #[error("phase attribute must be 'number' or 'name'")]
    UnsupportedPhaseAttribute,

    #[error("attribute must be one of profile/material/class/name/finish or ua.<name>")]
    UnsupportedPartAttribute,

    #[error("ua.<name> requires a non-empty user attribute name")]
    EmptyUserAttribute,
}
