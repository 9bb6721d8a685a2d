//! SPI buses through the spidev character devices.
//!
//! Opening a channel opens `/dev/spidev1.<bus>` and programs the clock mode,
//! word size and maximum speed. Every exchange after that is a single
//! `SPI_IOC_MESSAGE` request carrying the same speed and word size.
//!
//! ```no_run
//! use bbdl::peripheral::spi::{SpiBus, SpiChannel, SpiConfig, SpiMode};
//!
//! let config = SpiConfig::new(SpiBus::Spi0)
//!     .with_mode(SpiMode::Mode0)
//!     .with_bits_per_word(8)
//!     .with_speed_hz(10_000_000);
//! let mut spi = SpiChannel::new(config);
//! spi.open()?;
//! let mut rx = [0u8; 1];
//! spi.transfer(&[0x04], &mut rx)?;
//! spi.close()?;
//! # Ok::<(), bbdl::Error>(())
//! ```

use std::path::PathBuf;

use nix::fcntl::OFlag;
use strum::{Display, FromRepr};

use super::{Lifecycle, Slot};
use crate::error::{Error, Result};
use crate::hw_trait::{SpiBackend, SpiDevice, SpiTransfer};
use crate::tracing::prelude::*;
use crate::transport::spidev::LinuxSpi;

/// Directory holding the spidev nodes.
pub const DEV_DIR: &str = "/dev";

/// Chip select on the board's SPI controller, the `<n>` in `spidev1.<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum SpiBus {
    Spi0 = 0,
    Spi1 = 1,
}

/// Clock polarity and phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

/// Settings fixed for the life of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub bus: SpiBus,
    pub mode: SpiMode,
    pub bits_per_word: u8,
    pub speed_hz: u32,
    pub open_flags: OFlag,
}

impl SpiConfig {
    /// Mode 0, 8-bit words, 10 MHz, opened read-write.
    pub fn new(bus: SpiBus) -> Self {
        Self {
            bus,
            mode: SpiMode::Mode0,
            bits_per_word: 8,
            speed_hz: 10_000_000,
            open_flags: OFlag::O_RDWR,
        }
    }

    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bits_per_word(mut self, bits_per_word: u8) -> Self {
        self.bits_per_word = bits_per_word;
        self
    }

    pub fn with_speed_hz(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    pub fn with_open_flags(mut self, open_flags: OFlag) -> Self {
        self.open_flags = open_flags;
        self
    }
}

/// A spidev device node and its configuration.
pub struct SpiChannel<B: SpiBackend = LinuxSpi> {
    config: SpiConfig,
    dev_root: PathBuf,
    backend: B,
    device: Slot<B::Device>,
}

impl SpiChannel {
    pub fn new(config: SpiConfig) -> Self {
        Self::with_backend(config, DEV_DIR, LinuxSpi)
    }
}

impl<B: SpiBackend> SpiChannel<B> {
    pub fn with_backend(config: SpiConfig, dev_root: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            config,
            dev_root: dev_root.into(),
            backend,
            device: Slot::Unopened,
        }
    }

    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    pub fn state(&self) -> Lifecycle {
        self.device.lifecycle()
    }

    /// Path of the device node, e.g. `/dev/spidev1.0`.
    pub fn path(&self) -> PathBuf {
        self.dev_root.join(format!("spidev1.{}", self.config.bus as u8))
    }

    /// Open the device and apply mode, word size and speed.
    ///
    /// Nothing is kept unless all three succeed; on failure the descriptor
    /// is closed and the channel stays `Unopened`.
    pub fn open(&mut self) -> Result<()> {
        let name = self.name();
        self.device.lifecycle().require(Lifecycle::Unopened, "open", &name)?;

        let path = self.path();
        debug!("Opening {}.", path.display());
        let mut device = self
            .backend
            .open(&path, self.config.open_flags)
            .map_err(|e| Error::io("open", &name, e))?;

        let SpiConfig {
            mode,
            bits_per_word,
            speed_hz,
            ..
        } = self.config;
        device
            .set_mode(mode as u8)
            .map_err(|e| Error::io("set mode", &name, e))?;
        device
            .set_bits_per_word(bits_per_word)
            .map_err(|e| Error::io("set bits per word", &name, e))?;
        device
            .set_max_speed_hz(speed_hz)
            .map_err(|e| Error::io("set max speed", &name, e))?;

        debug!("{name} opened: mode {mode}, {bits_per_word} bits per word, {speed_hz} Hz.");
        self.device = Slot::Open(device);
        Ok(())
    }

    /// Send `tx`, discarding whatever is clocked in at the same time.
    pub fn write(&mut self, tx: &[u8]) -> Result<()> {
        let mut rx = vec![0u8; tx.len()];
        self.transfer(tx, &mut rx)
    }

    /// Send `tx` while receiving into `rx`, which must be the same length.
    pub fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let name = self.name();
        let device = self.device.get_mut("transfer", &name)?;
        if tx.len() != rx.len() {
            return Err(Error::LengthMismatch {
                channel: name,
                tx: tx.len(),
                rx: rx.len(),
            });
        }

        trace!("{name} tx: {}", hex::encode(tx));
        let mut transfer = SpiTransfer {
            tx,
            rx,
            speed_hz: self.config.speed_hz,
            bits_per_word: self.config.bits_per_word,
            delay_usecs: 0,
        };
        device.transfer(&mut transfer).map_err(|e| {
            warn!("{name} transfer of {} bytes failed: {e}", tx.len());
            Error::io("transfer", &name, e)
        })?;
        trace!("{name} rx: {}", hex::encode(&*transfer.rx));
        Ok(())
    }

    /// Close the device node. The channel cannot be reopened.
    pub fn close(&mut self) -> Result<()> {
        let name = self.name();
        let device = self.device.close(&name)?;
        drop(device);
        debug!("{name} closed.");
        Ok(())
    }

    fn name(&self) -> String {
        format!("spi1.{}", self.config.bus as u8)
    }
}
