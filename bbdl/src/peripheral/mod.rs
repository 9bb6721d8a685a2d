//! Peripheral channels.
//!
//! Each channel follows the same lifecycle: it is created `Unopened`, `open`
//! moves it to `Open`, and `close` moves it to `Closed` for good. Data
//! operations are only accepted while `Open`; anywhere else they fail with
//! [`Error::InvalidState`] before any OS call is made.

pub mod gpio;
pub mod leds;
pub mod spi;
pub mod uart;

use strum::Display;

use crate::error::{Error, Result};

/// Where a channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Lifecycle {
    Unopened,
    Open,
    Closed,
}

impl Lifecycle {
    /// Fail with `InvalidState` unless the channel is in `wanted`.
    pub(crate) fn require(self, wanted: Lifecycle, op: &'static str, channel: &str) -> Result<()> {
        if self == wanted {
            Ok(())
        } else {
            Err(Error::InvalidState {
                op,
                channel: channel.to_string(),
                state: self,
            })
        }
    }
}

/// Holder for a channel's OS handle.
///
/// The handle only exists while `Open`; leaving that state drops it, which
/// closes the underlying descriptor.
#[derive(Debug)]
pub(crate) enum Slot<T> {
    Unopened,
    Open(T),
    Closed,
}

impl<T> Slot<T> {
    pub(crate) fn lifecycle(&self) -> Lifecycle {
        match self {
            Slot::Unopened => Lifecycle::Unopened,
            Slot::Open(_) => Lifecycle::Open,
            Slot::Closed => Lifecycle::Closed,
        }
    }

    /// The open handle, or `InvalidState` naming `op`.
    pub(crate) fn get_mut(&mut self, op: &'static str, channel: &str) -> Result<&mut T> {
        match self {
            Slot::Open(handle) => Ok(handle),
            other => Err(Error::InvalidState {
                op,
                channel: channel.to_string(),
                state: other.lifecycle(),
            }),
        }
    }

    /// Move to `Closed`, handing back the handle so the caller decides when
    /// it is dropped.
    pub(crate) fn close(&mut self, channel: &str) -> Result<T> {
        match std::mem::replace(self, Slot::Closed) {
            Slot::Open(handle) => Ok(handle),
            other => {
                let state = other.lifecycle();
                *self = other;
                Err(Error::InvalidState {
                    op: "close",
                    channel: channel.to_string(),
                    state,
                })
            }
        }
    }
}
