//! GPIO lines through the sysfs interface.
//!
//! A line is exported by writing its number to `<root>/export`, which makes
//! the kernel create `<root>/gpio<N>/{direction,value,edge}`. Writing the
//! number to `<root>/unexport` removes them again. No file stays open between
//! operations.
//!
//! ```no_run
//! use bbdl::peripheral::gpio::{Direction, GpioChannel};
//!
//! let mut led = GpioChannel::new(60, Direction::Output);
//! led.open()?;
//! led.write(true)?;
//! led.close()?;
//! # Ok::<(), bbdl::Error>(())
//! ```

use std::path::PathBuf;

use strum::{AsRefStr, Display, EnumString};

use super::Lifecycle;
use crate::error::{Error, Result};
use crate::hw_trait::Sysfs;
use crate::tracing::prelude::*;
use crate::transport::sysfs::LinuxSysfs;

/// Default location of the GPIO controller in sysfs.
pub const SYSFS_GPIO_DIR: &str = "/sys/class/gpio";

/// Pin direction, spelled the way sysfs expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
pub enum Direction {
    #[strum(serialize = "in")]
    Input,
    #[strum(serialize = "out")]
    Output,
}

/// Edge that raises a poll notification on the value file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Edge {
    #[default]
    None,
    Rising,
    Falling,
    Both,
}

/// A numbered GPIO line.
pub struct GpioChannel<S = LinuxSysfs> {
    line: u32,
    direction: Direction,
    root: PathBuf,
    sysfs: S,
    state: Lifecycle,
    // Export succeeded but the channel is not open yet
    exported: bool,
}

impl GpioChannel {
    /// A line on the board's sysfs GPIO controller.
    pub fn new(line: u32, direction: Direction) -> Self {
        Self::with_backend(line, direction, SYSFS_GPIO_DIR, LinuxSysfs)
    }
}

impl<S: Sysfs> GpioChannel<S> {
    pub fn with_backend(line: u32, direction: Direction, root: impl Into<PathBuf>, sysfs: S) -> Self {
        Self {
            line,
            direction,
            root: root.into(),
            sysfs,
            state: Lifecycle::Unopened,
            exported: false,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// True while the line is exported by this channel, including after an
    /// `open` that failed past the export step.
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Export the line and set its direction.
    ///
    /// If the direction cannot be set the line stays exported and the channel
    /// stays `Unopened`; `open` may be retried, or `close` used to unexport.
    pub fn open(&mut self) -> Result<()> {
        let name = self.name();
        self.state.require(Lifecycle::Unopened, "open", &name)?;

        if !self.exported {
            debug!("Exporting GPIO {}.", self.line);
            self.sysfs
                .write(&self.root.join("export"), &self.line.to_string())
                .map_err(|e| Error::io("export", &name, e))?;
            self.exported = true;
        }

        debug!("Setting GPIO {} direction to {}.", self.line, self.direction);
        self.sysfs
            .write(&self.line_file("direction"), self.direction.as_ref())
            .map_err(|e| Error::io("set direction", &name, e))?;

        self.state = Lifecycle::Open;
        Ok(())
    }

    /// Drive the line high (`true`) or low.
    pub fn write(&mut self, value: bool) -> Result<()> {
        let name = self.name();
        self.state.require(Lifecycle::Open, "write", &name)?;

        trace!("GPIO {} set value {}.", self.line, u8::from(value));
        self.sysfs
            .write(&self.line_file("value"), if value { "1" } else { "0" })
            .map_err(|e| Error::io("write", &name, e))
    }

    /// Sample the line. Only a leading `1` reads as high.
    pub fn read(&mut self) -> Result<bool> {
        let name = self.name();
        self.state.require(Lifecycle::Open, "read", &name)?;

        let byte = self
            .sysfs
            .read_byte(&self.line_file("value"))
            .map_err(|e| Error::io("read", &name, e))?;
        trace!("GPIO {} value {}.", self.line, byte as char);
        Ok(byte == b'1')
    }

    /// Choose which edges raise a notification on the value file.
    pub fn set_edge(&mut self, edge: Edge) -> Result<()> {
        let name = self.name();
        self.state.require(Lifecycle::Open, "set edge", &name)?;

        debug!("Setting GPIO {} edge to {}.", self.line, edge);
        self.sysfs
            .write(&self.line_file("edge"), edge.as_ref())
            .map_err(|e| Error::io("set edge", &name, e))
    }

    /// Unexport the line.
    ///
    /// The channel is `Closed` afterwards even if the unexport write fails;
    /// the error is returned for the caller to report.
    pub fn close(&mut self) -> Result<()> {
        let name = self.name();
        if self.state != Lifecycle::Open && !(self.state == Lifecycle::Unopened && self.exported) {
            return Err(Error::InvalidState {
                op: "close",
                channel: name,
                state: self.state,
            });
        }

        self.state = Lifecycle::Closed;
        self.exported = false;

        debug!("Unexporting GPIO {}.", self.line);
        self.sysfs
            .write(&self.root.join("unexport"), &self.line.to_string())
            .map_err(|e| {
                warn!("Failed to unexport GPIO {}: {e}", self.line);
                Error::io("unexport", &name, e)
            })
    }

    fn name(&self) -> String {
        format!("gpio{}", self.line)
    }

    fn line_file(&self, attribute: &str) -> PathBuf {
        self.root.join(format!("gpio{}", self.line)).join(attribute)
    }
}
