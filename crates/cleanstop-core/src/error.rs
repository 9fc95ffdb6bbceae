//! Error types for graceful training interruption

use thiserror::Error;

/// Result type alias using the cleanstop Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for interrupt gates and their hosts
#[derive(Error, Debug)]
pub enum Error {
    // Signal slot errors
    #[error("Failed to register handler for {signal}: {message}")]
    SignalRegistration { signal: String, message: String },

    #[error("Interrupt slot for {signal} is already held by another gate")]
    SlotOccupied { signal: String },

    #[error("Failed to restore previous handler for {signal}: {message}")]
    HandlerRestore { signal: String, message: String },

    // Host errors
    #[error("Host stop request failed: {message}")]
    HostStop { message: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns true if this error points at misuse rather than a transient
    /// platform failure
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SlotOccupied { .. } | Error::InvalidConfig { .. }
        )
    }

    /// Returns true if the error came from the process signal disposition
    pub fn is_signal_error(&self) -> bool {
        matches!(
            self,
            Error::SignalRegistration { .. }
                | Error::SlotOccupied { .. }
                | Error::HandlerRestore { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
