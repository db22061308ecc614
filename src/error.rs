use std::ffi::NulError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type VellumResult<T> = Result<T, VellumError>;

/// Errors surfaced by the bridge.
///
/// Engine-reported failures all arrive as [`VellumError::Compilation`]
/// carrying the decoded diagnostic text; the remaining variants are
/// host-local and are raised before any boundary call is issued.
#[derive(Error, Debug)]
pub enum VellumError {
    /// The engine reported a failure. The message is the decoded
    /// diagnostic text, surfaced as-is. Unknown template ids are reported
    /// through this variant as well.
    #[error("{0}")]
    Compilation(String),

    /// Two inputs in one call share a key.
    #[error("duplicate input key '{0}'")]
    DuplicateInputKey(String),

    /// An input value could not be serialized to JSON text.
    #[error("input '{key}' could not be serialized: {source}")]
    InputSerialization {
        /// Key of the offending input.
        key: String,
        /// The underlying serialization failure.
        source: serde_json::Error,
    },

    /// A key or serialized value contained an interior NUL byte and
    /// cannot cross the boundary as a C string.
    #[error("string conversion error: {0}")]
    StringConversion(#[from] NulError),

    /// A blob or archive exceeds the wire format's 32-bit length field.
    #[error("input '{0}' exceeds the maximum transferable size")]
    OversizedInput(String),

    /// PNG pixel density must be a positive, finite number.
    #[error("pixel density must be positive and finite, got {0}")]
    InvalidPixelDensity(f32),

    /// The document stream was used after it released its native memory.
    #[error("document stream already released")]
    StreamReleased,
}
