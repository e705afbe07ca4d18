use thiserror::Error;

/// Errors produced while parsing queries, reading documents or driving the browser
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A field recipe or selector string could not be parsed
    #[error("Invalid notation '{notation}': {reason}")]
    InvalidNotation { notation: String, reason: String },

    /// The document rejected a CSS selector
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A document accessor call failed (process or protocol level)
    #[error("Document access failed: {0}")]
    AccessorFailed(String),

    /// Failed to launch the browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to an existing browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Tab creation, lookup or teardown failed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// Navigation did not complete
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Waiting for the page or an element exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A tool could not complete
    #[error("Tool '{tool}' failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },

    /// The request payload was malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Environment configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Build an `InvalidNotation` error
    pub fn notation(notation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNotation { notation: notation.into(), reason: reason.into() }
    }

    /// Whether this error happened before any extraction could take place.
    ///
    /// Session failures are reported once for the whole request; every other
    /// error stays local to the field that produced it.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            Self::LaunchFailed(_)
                | Self::ConnectionFailed(_)
                | Self::TabOperationFailed(_)
                | Self::NavigationFailed(_)
                | Self::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ScrapeError>;
