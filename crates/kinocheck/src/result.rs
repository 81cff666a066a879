//! Result and error types for kinocheck.

use thiserror::Error;

/// Result type for kinocheck operations
pub type KinocheckResult<T> = Result<T, KinocheckError>;

/// Errors that can occur while driving a browser session
#[derive(Debug, Error)]
pub enum KinocheckError {
    /// No element matching the locator appeared before the timeout
    #[error("element not found: {locator} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Locator that failed to resolve
        locator: String,
        /// How long the lookup polled
        timeout_ms: u64,
    },

    /// An element matched but never became clickable
    #[error("element not interactable: {locator} (waited {timeout_ms}ms)")]
    ElementNotInteractable {
        /// Locator that resolved to a non-interactable element
        locator: String,
        /// How long the click polled
        timeout_ms: u64,
    },

    /// The document never reached the complete ready state
    #[error("page load timed out after {ms}ms")]
    PageLoadTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A page-level operation exhausted all declared locator strategies
    #[error("navigation target not found: {operation}")]
    NavigationTargetNotFound {
        /// Name of the page operation that failed
        operation: String,
    },

    /// A bare condition wait expired
    #[error("wait timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Screenshot capture failed
    #[error("screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// The underlying browser session reported an error
    #[error("session error: {message}")]
    SessionError {
        /// Error message
        message: String,
    },

    /// HTTP client construction or transport error outside the sentinel contract
    #[error("HTTP client error: {message}")]
    HttpClient {
        /// Error message
        message: String,
    },

    /// Unexpected lower-level failure during an action
    #[error("action failed: {message}")]
    ActionFailed {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KinocheckError {
    /// Whether this error is a bounded-wait expiry of any kind.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::ElementNotInteractable { .. }
                | Self::PageLoadTimeout { .. }
                | Self::Timeout { .. }
        )
    }
}
