//! Error types shared by asset loading, resolution and playback.

/// Errors surfaced by the signal library.
///
/// Playback errors are always recovered locally; they are returned so callers
/// can react, but never abort a running scene.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Invalid configuration {index} for signal {signal} ({count} configurations)")]
    InvalidConfigurationIndex {
        signal: String,
        index: usize,
        count: usize,
    },

    #[error("Light state not set up properly in signal {signal}")]
    UnresolvedComponentReference { signal: String },

    #[error("Unknown bulb state {state} in signal {signal}")]
    UnknownBulbState { signal: String, state: String },

    #[error("Signal asset not found: {0}")]
    UnknownAsset(String),

    #[error("Signal not found: {0}")]
    UnknownSignal(String),

    #[error("Scene node not found: {0}")]
    UnknownNode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SignalError>;
