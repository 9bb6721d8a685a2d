//! The four user LEDs next to the Ethernet jack.
//!
//! They are driven through the LED class in sysfs: setting `trigger` to
//! `none` hands control to `brightness`, while `timer` makes the kernel blink
//! the LED using `delay_on`/`delay_off`.

use std::path::PathBuf;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::{Error, Result};
use crate::hw_trait::Sysfs;
use crate::tracing::prelude::*;
use crate::transport::sysfs::LinuxSysfs;

/// Default location of the LED class in sysfs.
pub const SYSFS_LEDS_DIR: &str = "/sys/class/leds";

/// Blink period half, in milliseconds, used by [`UserLeds::flash`].
const FLASH_DELAY_MS: &str = "200";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum UserLed {
    Usr0,
    Usr1,
    Usr2,
    Usr3,
}

impl UserLed {
    fn dir_name(self) -> String {
        format!("beaglebone:green:{self}")
    }
}

pub struct UserLeds<S = LinuxSysfs> {
    root: PathBuf,
    sysfs: S,
}

impl UserLeds {
    pub fn new() -> Self {
        Self::with_backend(SYSFS_LEDS_DIR, LinuxSysfs)
    }
}

impl Default for UserLeds {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sysfs> UserLeds<S> {
    pub fn with_backend(root: impl Into<PathBuf>, sysfs: S) -> Self {
        Self {
            root: root.into(),
            sysfs,
        }
    }

    /// Turn every user LED off.
    pub fn init(&self) -> Result<()> {
        UserLed::iter().try_for_each(|led| self.write(led, false))
    }

    /// Switch `led` on or off, cancelling any trigger.
    pub fn write(&self, led: UserLed, on: bool) -> Result<()> {
        trace!("LED {led} set {}.", u8::from(on));
        self.attribute(led, "trigger", "none")?;
        self.attribute(led, "brightness", if on { "1" } else { "0" })
    }

    /// Let the kernel blink `led`.
    pub fn flash(&self, led: UserLed) -> Result<()> {
        debug!("LED {led} flashing.");
        self.attribute(led, "trigger", "timer")?;
        self.attribute(led, "delay_on", FLASH_DELAY_MS)?;
        self.attribute(led, "delay_off", FLASH_DELAY_MS)
    }

    fn attribute(&self, led: UserLed, name: &'static str, value: &str) -> Result<()> {
        let path = self.root.join(led.dir_name()).join(name);
        self.sysfs
            .write(&path, value)
            .map_err(|e| Error::io(name, format!("led {led}"), e))
    }
}
