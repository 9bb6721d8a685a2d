//! Linux spidev device nodes, driven through the `spidev` crate.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::fcntl::OFlag;
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::hw_trait::{SpiBackend, SpiDevice, SpiTransfer};

/// Opens `/dev/spidev*` nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSpi;

impl SpiBackend for LinuxSpi {
    type Device = SpidevNode;

    fn open(&self, path: &Path, flags: OFlag) -> io::Result<SpidevNode> {
        let file = open_options(flags).open(path)?;
        Ok(SpidevNode {
            dev: Spidev::new(file),
        })
    }
}

// Translate open(2) flags into OpenOptions: the access mode picks
// read/write, everything else is passed through.
fn open_options(flags: OFlag) -> OpenOptions {
    let access = flags & OFlag::O_ACCMODE;
    let mut options = OpenOptions::new();
    options
        .read(access != OFlag::O_WRONLY)
        .write(access != OFlag::O_RDONLY)
        .custom_flags((flags - OFlag::O_ACCMODE).bits());
    options
}

/// An open spidev node. Dropping it closes the descriptor.
pub struct SpidevNode {
    dev: Spidev,
}

impl fmt::Debug for SpidevNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpidevNode")
            .field("fd", &self.dev.inner().as_raw_fd())
            .finish()
    }
}

// One setting per configure call, so a rejected value is reported against the
// request that failed.
impl SpiDevice for SpidevNode {
    fn set_mode(&mut self, mode: u8) -> io::Result<()> {
        let options = SpidevOptions::new()
            .mode(SpiModeFlags::from_bits_truncate(u32::from(mode)))
            .build();
        self.dev.configure(&options)
    }

    fn set_bits_per_word(&mut self, bits: u8) -> io::Result<()> {
        self.dev.configure(&SpidevOptions::new().bits_per_word(bits).build())
    }

    fn set_max_speed_hz(&mut self, speed_hz: u32) -> io::Result<()> {
        self.dev
            .configure(&SpidevOptions::new().max_speed_hz(speed_hz).build())
    }

    fn transfer(&mut self, transfer: &mut SpiTransfer<'_>) -> io::Result<()> {
        if transfer.tx.len() != transfer.rx.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "transmit and receive buffers differ in length",
            ));
        }

        let mut message = SpidevTransfer::read_write(transfer.tx, &mut *transfer.rx);
        message.speed_hz = transfer.speed_hz;
        message.bits_per_word = transfer.bits_per_word;
        message.delay_usecs = transfer.delay_usecs;
        self.dev.transfer(&mut message)
    }
}
