//! Error types for the kbdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum, rolled up into [`Error`].

use thiserror::Error;

/// The top-level error type for all kbdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request errors (detected before any I/O) ---
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Import errors ---
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Stable machine-readable tag for this error, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Unauthorized => "unauthorized",
            Error::Provider(ProviderError::NotConfigured(_)) => "config",
            Error::Provider(ProviderError::Upstream { .. }) => "upstream",
            Error::Provider(ProviderError::EmptyResponse) => "empty_response",
            Error::Store(_) => "storage",
            Error::Import(_) => "import",
            Error::Config { .. } => "config",
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No credential or endpoint configured. Raised before any network call.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The upstream call failed or returned something we could not read.
    /// `status` is `None` when no HTTP response was received at all.
    #[error("Upstream request failed (status: {}): {body}", display_status(.status))]
    Upstream { status: Option<u16>, body: String },

    /// The upstream call succeeded but carried no usable text.
    #[error("Upstream returned an empty response")]
    EmptyResponse,
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".into(),
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Unreadable spreadsheet: {0}")]
    Unreadable(String),

    #[error("Spreadsheet has no header row")]
    MissingHeader,
}
