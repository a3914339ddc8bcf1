//! Error taxonomy for scraping and AI analysis.
//!
//! Every variant maps to one retry disposition. Callers never see these as
//! panics: the service layer folds them into `{success: false, error}`.

/// All errors the screener can surface to a caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScreenError {
    /// Missing credential or unusable configuration. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed caller input (e.g. an empty ticker).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An attempt or an outer race exceeded its deadline.
    #[error("Timed out after {ms}ms: {context}")]
    Timeout { ms: u64, context: String },

    /// The injected script or the tab itself failed.
    #[error("Script error: {0}")]
    TransientScript(String),

    /// The rendered table could not be read.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// An AI provider answered with an envelope we do not recognize.
    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    /// Transport failure or non-2xx answer from an AI provider.
    #[error("Network error: {0}")]
    Network(String),
}

impl ScreenError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ScreenError::Configuration(_) => "E_CONFIG",
            ScreenError::InvalidInput(_) => "E_INVALID_INPUT",
            ScreenError::Timeout { .. } => "E_TIMEOUT",
            ScreenError::TransientScript(_) => "E_SCRIPT",
            ScreenError::Extraction(_) => "E_EXTRACTION",
            ScreenError::ResponseShape(_) => "E_RESPONSE_SHAPE",
            ScreenError::Network(_) => "E_NETWORK",
        }
    }
}

impl From<reqwest::Error> for ScreenError {
    fn from(e: reqwest::Error) -> Self {
        ScreenError::Network(e.to_string())
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ScreenError>;
