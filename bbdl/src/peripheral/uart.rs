//! UARTs through the OMAP serial tty nodes (`/dev/ttyO<n>`).
//!
//! Ports are opened non-blocking and put in raw 8N1 mode. Reads return at
//! once with whatever is pending, which may be nothing.

use std::io;
use std::path::PathBuf;

use strum::{Display, EnumIter, FromRepr};

use super::{Lifecycle, Slot};
use crate::error::{Error, Result};
use crate::hw_trait::{LineSettings, SerialBackend, SerialPort};
use crate::tracing::prelude::*;
use crate::transport::tty::LinuxSerial;

/// Directory holding the tty nodes.
pub const DEV_DIR: &str = "/dev";

/// Serial ports exposed on the headers. The discriminant is the tty number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum UartPort {
    Uart0 = 0,
    Uart1 = 1,
    Uart2 = 2,
    Uart3 = 4,
}

/// Line speeds the tty driver accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum BaudRate {
    B1200,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
    B500000,
    B576000,
    B921600,
    B1000000,
    B1152000,
    B1500000,
    B2000000,
    B2500000,
    B3000000,
    B3500000,
    B4000000,
}

impl BaudRate {
    /// Bits per second.
    pub fn bps(self) -> u32 {
        match self {
            BaudRate::B1200 => 1_200,
            BaudRate::B2400 => 2_400,
            BaudRate::B4800 => 4_800,
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
            BaudRate::B230400 => 230_400,
            BaudRate::B460800 => 460_800,
            BaudRate::B500000 => 500_000,
            BaudRate::B576000 => 576_000,
            BaudRate::B921600 => 921_600,
            BaudRate::B1000000 => 1_000_000,
            BaudRate::B1152000 => 1_152_000,
            BaudRate::B1500000 => 1_500_000,
            BaudRate::B2000000 => 2_000_000,
            BaudRate::B2500000 => 2_500_000,
            BaudRate::B3000000 => 3_000_000,
            BaudRate::B3500000 => 3_500_000,
            BaudRate::B4000000 => 4_000_000,
        }
    }

    /// The constant for exactly `bps`, if the driver supports it.
    pub fn from_bps(bps: u32) -> Option<Self> {
        use strum::IntoEnumIterator;
        BaudRate::iter().find(|rate| rate.bps() == bps)
    }
}

/// A serial port.
pub struct UartChannel<B: SerialBackend = LinuxSerial> {
    port: UartPort,
    baud: BaudRate,
    dev_root: PathBuf,
    backend: B,
    handle: Slot<B::Port>,
}

impl UartChannel {
    pub fn new(port: UartPort, baud: BaudRate) -> Self {
        Self::with_backend(port, baud, DEV_DIR, LinuxSerial)
    }
}

impl<B: SerialBackend> UartChannel<B> {
    pub fn with_backend(port: UartPort, baud: BaudRate, dev_root: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            port,
            baud,
            dev_root: dev_root.into(),
            backend,
            handle: Slot::Unopened,
        }
    }

    pub fn port(&self) -> UartPort {
        self.port
    }

    pub fn baud(&self) -> BaudRate {
        self.baud
    }

    pub fn state(&self) -> Lifecycle {
        self.handle.lifecycle()
    }

    /// Path of the tty node, e.g. `/dev/ttyO1`.
    pub fn path(&self) -> PathBuf {
        self.dev_root.join(format!("ttyO{}", self.port as u8))
    }

    /// Open the port and apply raw 8N1 at the channel's baud rate.
    ///
    /// A port that cannot be opened is reported like any other error;
    /// whether that ends the program is up to the caller.
    pub fn open(&mut self) -> Result<()> {
        let name = self.name();
        self.handle.lifecycle().require(Lifecycle::Unopened, "open", &name)?;

        let path = self.path();
        let mut port = self.backend.open(&path).map_err(|e| {
            error!("Unable to open UART {} ({}): {e}", self.port as u8, path.display());
            Error::io("open", &name, e)
        })?;

        port.configure(&LineSettings::raw_8n1(self.baud))
            .map_err(|e| Error::io("configure", &name, e))?;

        info!("UART {} ({}) opened at {} baud.", self.port as u8, path.display(), self.baud.bps());
        self.handle = Slot::Open(port);
        Ok(())
    }

    /// Issue one write and return how many bytes the driver took.
    ///
    /// A short count is not an error; resending the rest is the caller's call.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let name = self.name();
        let port = self.handle.get_mut("write", &name)?;

        let written = port.write(bytes).map_err(|e| {
            error!("Could not write {} bytes to UART {}: {e}", bytes.len(), self.port as u8);
            Error::io("write", &name, e)
        })?;
        if written < bytes.len() {
            warn!("Short write to UART {}: {written} of {} bytes.", self.port as u8, bytes.len());
        } else {
            debug!("Wrote {written} bytes to UART {}.", self.port as u8);
        }
        Ok(written)
    }

    /// Issue one non-blocking read of up to `max_len` bytes.
    ///
    /// An empty vector means nothing was pending.
    pub fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let name = self.name();
        let port = self.handle.get_mut("read", &name)?;

        let mut buf = vec![0u8; max_len];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                trace!("Read {n} bytes from UART {}.", self.port as u8);
                Ok(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Vec::new()),
            Err(e) => {
                error!("Could not read from UART {}: {e}", self.port as u8);
                Err(Error::io("read", &name, e))
            }
        }
    }

    /// Close the port. The channel cannot be reopened.
    pub fn close(&mut self) -> Result<()> {
        let name = self.name();
        drop(self.handle.close(&name)?);
        debug!("UART {} closed.", self.port as u8);
        Ok(())
    }

    fn name(&self) -> String {
        format!("uart{}", self.port as u8)
    }
}

impl TryFrom<u8> for UartPort {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self> {
        UartPort::from_repr(number)
            .ok_or_else(|| Error::InvalidArgument(format!("no UART is exposed as ttyO{number}")))
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = Error;

    fn try_from(bps: u32) -> Result<Self> {
        BaudRate::from_bps(bps)
            .ok_or_else(|| Error::InvalidArgument(format!("unsupported baud rate {bps}")))
    }
}
