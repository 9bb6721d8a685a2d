//! Configuration for programs built on bbdl.
//!
//! Settings come from a TOML file named by the `BBDL_CONFIG` environment
//! variable. Every field has a default matching the stock BeagleBone Black
//! image, so the file and any of its sections may be omitted.
//!
//! ```toml
//! [paths]
//! gpio_root = "/sys/class/gpio"
//!
//! [demo]
//! gpio_line = 60
//! uart_port = 1
//! baud = 9600
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::peripheral::{gpio, leds, uart};
use crate::peripheral::uart::{BaudRate, UartPort};
use crate::tracing::prelude::*;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "BBDL_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the kernel interfaces live
    pub paths: PathsConfig,

    /// Settings for the `bbdl` demo program
    pub demo: DemoConfig,
}

/// Filesystem locations of the kernel interfaces.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// GPIO controller in sysfs
    pub gpio_root: PathBuf,

    /// Directory holding spidev and tty nodes
    pub dev_root: PathBuf,

    /// LED class in sysfs
    pub leds_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            gpio_root: gpio::SYSFS_GPIO_DIR.into(),
            dev_root: uart::DEV_DIR.into(),
            leds_root: leds::SYSFS_LEDS_DIR.into(),
        }
    }
}

/// What the demo program drives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// GPIO line driven high at startup
    pub gpio_line: u32,

    /// tty number of the UART (0, 1, 2 or 4)
    pub uart_port: u8,

    /// UART line speed in bits per second
    pub baud: u32,

    /// Text sent on every blink
    pub message: String,

    /// Time the LED spends in each state
    pub blink_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            gpio_line: 60,
            uart_port: 1,
            baud: 9600,
            message: "Hello!\n".into(),
            blink_ms: 1000,
        }
    }
}

impl DemoConfig {
    pub fn uart_port(&self) -> Result<UartPort> {
        UartPort::try_from(self.uart_port).map_err(|e| in_demo("uart_port", e))
    }

    pub fn baud_rate(&self) -> Result<BaudRate> {
        BaudRate::try_from(self.baud).map_err(|e| in_demo("baud", e))
    }
}

fn in_demo(key: &str, e: Error) -> Error {
    match e {
        Error::InvalidArgument(msg) => Error::Config(format!("[demo] {key}: {msg}")),
        other => other,
    }
}

impl Config {
    /// Load from the file named by `BBDL_CONFIG`, or use defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                debug!("{CONFIG_ENV} not set, using default configuration.");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}.", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}
