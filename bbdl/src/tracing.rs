//! Logging setup for programs built on bbdl.
//!
//! A program should call [`init_journald_or_stdout`] once at startup. The
//! library itself only emits events; it never installs a subscriber.
//!
//! Modules use `use crate::tracing::prelude::*` for the level macros.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Identifier attached to journal entries.
const SYSLOG_IDENTIFIER: &str = "bbdl";

/// Initialize logging.
///
/// Under systemd (`JOURNAL_STREAM` set) events go to journald; otherwise
/// they are printed to stdout.
pub fn init_journald_or_stdout() {
    if env::var("JOURNAL_STREAM").is_ok() {
        match tracing_journald::layer() {
            Ok(layer) => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(layer.with_syslog_identifier(SYSLOG_IDENTIFIER.to_string()))
                    .init();
            }
            Err(e) => {
                use_stdout();
                error!("Failed to initialize journald logging ({e}), using stdout.");
            }
        }
    } else {
        use_stdout();
    }
    info!("Starting bbdl.");
}

// Filter according to RUST_LOG, defaulting to INFO rather than ERROR.
fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy()
}

fn use_stdout() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .init();
}

// Timestamps in local time to the nearest second; the default timer prints
// long UTC strings.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        let formatted = now
            .format(time::macros::format_description!("[hour]:[minute]:[second]"))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{formatted}")
    }
}
