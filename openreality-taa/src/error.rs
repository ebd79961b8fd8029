/// Result alias for the fallible TAA entry points.
pub type TaaResult<T> = Result<T, TaaError>;

/// Errors surfaced by host collaborators and settings loading.
///
/// Per-frame "not ready" conditions are not errors; they are reported through
/// boolean returns and [`crate::frame::FrameOutcome::NotReady`].
#[derive(thiserror::Error, Debug)]
pub enum TaaError {
    /// The host could not create an accumulation image.
    #[error("accumulation allocation failed: {0}")]
    Allocation(String),

    /// Settings contained a value outside its usable range.
    #[error("invalid TAA settings: {0}")]
    Config(String),

    /// Settings could not be (de)serialized.
    #[error("settings serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TaaError {
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
