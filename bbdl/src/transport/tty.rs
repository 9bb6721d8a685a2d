//! Linux tty device nodes configured through termios.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::fcntl::OFlag;
use nix::sys::termios::{
    self, ControlFlags, FlushArg, InputFlags, LocalFlags, OutputFlags, SetArg,
};

use crate::hw_trait::{LineSettings, SerialBackend, SerialPort};
use crate::peripheral::uart::BaudRate;

/// Opens tty nodes read-write, non-blocking, without making them the
/// controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSerial;

impl SerialBackend for LinuxSerial {
    type Port = TtyPort;

    fn open(&self, path: &Path) -> io::Result<TtyPort> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
            .open(path)?;
        Ok(TtyPort { file })
    }
}

/// An open tty. Dropping it closes the descriptor.
#[derive(Debug)]
pub struct TtyPort {
    file: File,
}

impl SerialPort for TtyPort {
    fn configure(&mut self, settings: &LineSettings) -> io::Result<()> {
        let mut attrs = termios::tcgetattr(&self.file)?;

        let mut control = ControlFlags::CS8;
        control.set(ControlFlags::CLOCAL, settings.local);
        control.set(ControlFlags::CREAD, settings.receiver);
        attrs.control_flags = control;

        let mut input = InputFlags::empty();
        input.set(InputFlags::IGNPAR, settings.ignore_parity_errors);
        input.set(InputFlags::ICRNL, settings.map_cr_to_nl);
        attrs.input_flags = input;

        attrs.output_flags = OutputFlags::empty();
        attrs.local_flags = if settings.canonical {
            LocalFlags::ICANON
        } else {
            LocalFlags::empty()
        };

        termios::cfsetspeed(&mut attrs, settings.baud.into())?;

        if settings.flush_input {
            termios::tcflush(&self.file, FlushArg::TCIFLUSH)?;
        }
        termios::tcsetattr(&self.file, SetArg::TCSANOW, &attrs)?;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl From<BaudRate> for termios::BaudRate {
    fn from(rate: BaudRate) -> Self {
        match rate {
            BaudRate::B1200 => termios::BaudRate::B1200,
            BaudRate::B2400 => termios::BaudRate::B2400,
            BaudRate::B4800 => termios::BaudRate::B4800,
            BaudRate::B9600 => termios::BaudRate::B9600,
            BaudRate::B19200 => termios::BaudRate::B19200,
            BaudRate::B38400 => termios::BaudRate::B38400,
            BaudRate::B57600 => termios::BaudRate::B57600,
            BaudRate::B115200 => termios::BaudRate::B115200,
            BaudRate::B230400 => termios::BaudRate::B230400,
            BaudRate::B460800 => termios::BaudRate::B460800,
            BaudRate::B500000 => termios::BaudRate::B500000,
            BaudRate::B576000 => termios::BaudRate::B576000,
            BaudRate::B921600 => termios::BaudRate::B921600,
            BaudRate::B1000000 => termios::BaudRate::B1000000,
            BaudRate::B1152000 => termios::BaudRate::B1152000,
            BaudRate::B1500000 => termios::BaudRate::B1500000,
            BaudRate::B2000000 => termios::BaudRate::B2000000,
            BaudRate::B2500000 => termios::BaudRate::B2500000,
            BaudRate::B3000000 => termios::BaudRate::B3000000,
            BaudRate::B3500000 => termios::BaudRate::B3500000,
            BaudRate::B4000000 => termios::BaudRate::B4000000,
        }
    }
}
