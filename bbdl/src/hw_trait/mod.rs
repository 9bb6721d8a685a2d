//! Hardware abstraction layer traits.
//!
//! The peripheral channels never touch the OS directly. They go through the
//! traits here: [`Sysfs`] for pseudo-files, [`SpiBackend`] for spidev
//! character devices and [`SerialBackend`] for tty devices. The Linux
//! implementations live in [`crate::transport`].

use std::io;
use std::path::Path;

use nix::fcntl::OFlag;

use crate::peripheral::uart::BaudRate;

#[cfg(test)]
pub(crate) mod fake;

/// Access to sysfs-style pseudo-files.
///
/// Every call opens the file, performs one operation and closes it again; no
/// handle survives between calls.
pub trait Sysfs {
    /// Write `contents` to the file at `path` in a single write.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Read exactly one byte from the start of the file at `path`.
    ///
    /// An empty file is an error (`UnexpectedEof`).
    fn read_byte(&self, path: &Path) -> io::Result<u8>;
}

impl<T: Sysfs + ?Sized> Sysfs for &T {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        (**self).write(path, contents)
    }

    fn read_byte(&self, path: &Path) -> io::Result<u8> {
        (**self).read_byte(path)
    }
}

/// One full-duplex SPI exchange.
///
/// `tx` and `rx` always have the same length; the channel checks this before
/// a device ever sees the request.
#[derive(Debug)]
pub struct SpiTransfer<'a> {
    pub tx: &'a [u8],
    pub rx: &'a mut [u8],
    pub speed_hz: u32,
    pub bits_per_word: u8,
    pub delay_usecs: u16,
}

/// An open SPI device node.
///
/// Dropping the device closes it.
pub trait SpiDevice {
    fn set_mode(&mut self, mode: u8) -> io::Result<()>;
    fn set_bits_per_word(&mut self, bits: u8) -> io::Result<()>;
    fn set_max_speed_hz(&mut self, speed_hz: u32) -> io::Result<()>;

    /// Perform a single synchronous exchange, filling `transfer.rx`.
    fn transfer(&mut self, transfer: &mut SpiTransfer<'_>) -> io::Result<()>;
}

/// Opens SPI device nodes.
pub trait SpiBackend {
    type Device: SpiDevice;

    fn open(&self, path: &Path, flags: OFlag) -> io::Result<Self::Device>;
}

impl<T: SpiBackend + ?Sized> SpiBackend for &T {
    type Device = T::Device;

    fn open(&self, path: &Path, flags: OFlag) -> io::Result<Self::Device> {
        (**self).open(path, flags)
    }
}

/// Line discipline applied to a serial port.
///
/// Data bits are always 8 with parity generation disabled; the remaining
/// knobs map one-to-one onto termios flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud: BaudRate,
    /// Ignore modem status lines (CLOCAL)
    pub local: bool,
    /// Enable the receiver (CREAD)
    pub receiver: bool,
    /// Ignore bytes with parity errors (IGNPAR)
    pub ignore_parity_errors: bool,
    /// Map CR to NL on input (ICRNL)
    pub map_cr_to_nl: bool,
    /// Line editing (ICANON)
    pub canonical: bool,
    /// Discard pending input before the settings take effect
    pub flush_input: bool,
}

impl LineSettings {
    /// 8N1, local, receiver on, raw input, pending input discarded.
    pub fn raw_8n1(baud: BaudRate) -> Self {
        Self {
            baud,
            local: true,
            receiver: true,
            ignore_parity_errors: true,
            map_cr_to_nl: true,
            canonical: false,
            flush_input: true,
        }
    }
}

/// An open serial port.
///
/// Dropping the port closes it.
pub trait SerialPort {
    fn configure(&mut self, settings: &LineSettings) -> io::Result<()>;

    /// One write call; may write fewer bytes than offered.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// One read call; `WouldBlock` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens serial ports.
pub trait SerialBackend {
    type Port: SerialPort;

    /// Open read-write, non-blocking, without acquiring a controlling terminal.
    fn open(&self, path: &Path) -> io::Result<Self::Port>;
}

impl<T: SerialBackend + ?Sized> SerialBackend for &T {
    type Port = T::Port;

    fn open(&self, path: &Path) -> io::Result<Self::Port> {
        (**self).open(path)
    }
}
