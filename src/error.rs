/// Error types shared by every extension context
use thiserror::Error;

/// All failures the logger can run into.
///
/// None of these ever cross a message boundary as a thrown value; handlers
/// turn them into `{ok: false, error: <code>}` response fields instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggerError {
    /// A store mutation arrived without a resolvable sender tab.
    #[error("message sender has no tab id")]
    InvalidTarget,

    /// A push to one observer connection failed.
    #[error("delivery to subscriber failed: {0}")]
    DeliveryFailure(String),

    /// Saving the snapshot to durable storage failed.
    #[error("failed to persist logs: {0}")]
    PersistenceFailure(String),

    /// No input element for the current chat provider.
    #[error("no input adapter matched: {0}")]
    AdapterNotFound(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A browser API call raised through the JS bridge.
    #[error("browser bridge call failed: {0}")]
    Bridge(String),
}

impl LoggerError {
    /// Stable code placed in the `error` field of failure responses.
    pub fn code(&self) -> &'static str {
        match self {
            LoggerError::InvalidTarget => "no-tab-id",
            LoggerError::DeliveryFailure(_) => "delivery-failed",
            LoggerError::PersistenceFailure(_) => "persist-failed",
            LoggerError::AdapterNotFound(_) => "adapter-not-found",
            LoggerError::Serialization(_) => "bad-payload",
            LoggerError::Bridge(_) => "bridge-failed",
        }
    }
}

impl From<serde_wasm_bindgen::Error> for LoggerError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        LoggerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LoggerError {
    fn from(err: serde_json::Error) -> Self {
        LoggerError::Serialization(err.to_string())
    }
}
