use thiserror::Error;

/// Failure taxonomy for the voice pipeline.
///
/// Nothing below the session orchestrator lets one of these escape its own
/// boundary during a voice turn: capability errors become capture events,
/// transient I/O becomes a fallback response or a cascade fallthrough, and
/// execution failures become `ExecutionResult { success: false, .. }`.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The platform has no usable recognition/synthesis capability.
    #[error("capability unavailable: {0}")]
    Capability(String),

    #[error("microphone access denied")]
    PermissionDenied,

    #[error("recognition error: {0}")]
    Recognition(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("AI endpoint error: {0}")]
    Endpoint(String),

    #[error("malformed AI response: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VoiceError>;
