//! Common error types for bbdl.
//!
//! Every channel operation reports failures through this one enum, carrying
//! the operation name and the channel identifier so callers can log them
//! without extra context.

use thiserror::Error;

use crate::peripheral::Lifecycle;

/// Main error type for bbdl operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An underlying file or device operation failed
    #[error("{channel}: {op} failed: {source}")]
    Io {
        op: &'static str,
        channel: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted while the channel was not in the required state
    #[error("{channel}: cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        channel: String,
        state: Lifecycle,
    },

    /// SPI transmit and receive buffers must have the same length
    #[error("{channel}: transmit buffer is {tx} bytes but receive buffer is {rx}")]
    LengthMismatch { channel: String, tx: usize, rx: usize },

    /// A value does not name anything the board supports
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(op: &'static str, channel: impl ToString, source: std::io::Error) -> Self {
        Error::Io {
            op,
            channel: channel.to_string(),
            source,
        }
    }

    /// True for failures reported by the OS, as opposed to misuse of a handle.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// True if the operation was rejected because of the channel's state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
