use thiserror::Error;

/// Errors raised by the geofencing and live position subsystem.
///
/// None of them is fatal: invalid input rejects a single call, a missing
/// device location falls back to "inside the zone", and a lost channel is
/// re-established by the client.
#[derive(Error, Debug)]
pub enum NozhaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Channel disconnected: {0}")]
    ChannelDisconnected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NozhaError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        NozhaError::InvalidInput(msg.into())
    }
}
