//! Interrupt-driven shutdown hook.
//!
//! The program registers one callback and hands it, together with a stream
//! of interrupt notifications, to [`on_interrupt`]. The callback runs once
//! per interrupt. Nothing here is stored in process-wide state.
//!
//! ```no_run
//! # async fn demo() -> std::io::Result<()> {
//! use tokio_util::sync::CancellationToken;
//!
//! let running = CancellationToken::new();
//! let stop = running.clone();
//! let signals = bbdl::shutdown::interrupts()?;
//! tokio::spawn(bbdl::shutdown::on_interrupt(signals, move || stop.cancel()));
//! running.cancelled().await;
//! # Ok(())
//! # }
//! ```

use std::io;

use tokio::signal::unix::{self, SignalKind};
use tokio_stream::{wrappers::SignalStream, Stream, StreamExt};

use crate::tracing::prelude::*;

/// One item per SIGINT delivered to the process.
pub fn interrupts() -> io::Result<SignalStream> {
    Ok(SignalStream::new(unix::signal(SignalKind::interrupt())?))
}

/// Invoke `callback` once for every notification until `signals` ends.
///
/// Returns how many notifications were handled.
pub async fn on_interrupt<S, F>(mut signals: S, mut callback: F) -> usize
where
    S: Stream<Item = ()> + Unpin,
    F: FnMut(),
{
    let mut handled = 0;
    while signals.next().await.is_some() {
        handled += 1;
        debug!("Interrupt received ({handled}).");
        callback();
    }
    trace!("Interrupt stream closed.");
    handled
}
