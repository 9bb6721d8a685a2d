//! In-memory stand-ins for the OS, used by unit tests.
//!
//! `MemSysfs` models the kernel's GPIO sysfs controller closely enough to
//! catch ordering mistakes: lines must be exported before their files exist,
//! exporting twice is `EBUSY`, and input lines refuse value writes.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use nix::fcntl::OFlag;
use nix::libc;

use super::{LineSettings, SerialBackend, SerialPort, SpiBackend, SpiDevice, SpiTransfer, Sysfs};

fn os_error(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

#[derive(Default)]
pub struct MemSysfs {
    gpio_root: Option<PathBuf>,
    files: RefCell<BTreeMap<PathBuf, String>>,
    denied: RefCell<BTreeSet<PathBuf>>,
    calls: RefCell<Vec<(PathBuf, Option<String>)>>,
}

impl MemSysfs {
    /// A sysfs holding a GPIO controller at `root`.
    pub fn gpio(root: impl Into<PathBuf>) -> Self {
        Self {
            gpio_root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Create a plain attribute file.
    pub fn add_file(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files.borrow_mut().insert(path.into(), contents.to_string());
    }

    /// Make every access to `path` fail with `EACCES`.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.denied.borrow_mut().insert(path.into());
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files.borrow().contains_key(path.as_ref())
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    /// Every access so far, in order. Reads have no contents.
    pub fn calls(&self) -> Vec<(PathBuf, Option<String>)> {
        self.calls.borrow().clone()
    }

    fn line_dir(&self, line: &str) -> Option<PathBuf> {
        self.gpio_root.as_ref().map(|root| root.join(format!("gpio{line}")))
    }

    fn export(&self, line: &str) -> io::Result<()> {
        let dir = line
            .parse::<u32>()
            .ok()
            .and_then(|_| self.line_dir(line))
            .ok_or_else(|| os_error(libc::EINVAL))?;
        let mut files = self.files.borrow_mut();
        if files.contains_key(&dir.join("value")) {
            return Err(os_error(libc::EBUSY));
        }
        files.insert(dir.join("direction"), "in".into());
        files.insert(dir.join("value"), "0".into());
        files.insert(dir.join("edge"), "none".into());
        Ok(())
    }

    fn unexport(&self, line: &str) -> io::Result<()> {
        let dir = self.line_dir(line).ok_or_else(|| os_error(libc::EINVAL))?;
        let mut files = self.files.borrow_mut();
        if !files.contains_key(&dir.join("value")) {
            return Err(os_error(libc::EINVAL));
        }
        files.retain(|path, _| !path.starts_with(&dir));
        Ok(())
    }
}

impl Sysfs for MemSysfs {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.calls
            .borrow_mut()
            .push((path.to_path_buf(), Some(contents.to_string())));
        if self.denied.borrow().contains(path) {
            return Err(os_error(libc::EACCES));
        }

        if let Some(root) = &self.gpio_root {
            if path == root.join("export") {
                return self.export(contents);
            }
            if path == root.join("unexport") {
                return self.unexport(contents);
            }
        }

        let mut files = self.files.borrow_mut();
        if !files.contains_key(path) {
            return Err(os_error(libc::ENOENT));
        }

        match path.file_name().and_then(|name| name.to_str()) {
            Some("direction") if !["in", "out"].contains(&contents) => {
                return Err(os_error(libc::EINVAL));
            }
            Some("edge") if !["none", "rising", "falling", "both"].contains(&contents) => {
                return Err(os_error(libc::EINVAL));
            }
            Some("value") if self.gpio_root.is_some() => {
                let direction = path.with_file_name("direction");
                if files.get(&direction).map(String::as_str) == Some("in") {
                    return Err(os_error(libc::EPERM));
                }
            }
            _ => {}
        }

        files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn read_byte(&self, path: &Path) -> io::Result<u8> {
        self.calls.borrow_mut().push((path.to_path_buf(), None));
        if self.denied.borrow().contains(path) {
            return Err(os_error(libc::EACCES));
        }
        let files = self.files.borrow();
        let contents = files.get(path).ok_or_else(|| os_error(libc::ENOENT))?;
        contents
            .bytes()
            .next()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }
}

/// One recorded `SPI_IOC_MESSAGE` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub tx: Vec<u8>,
    pub rx_len: usize,
    pub speed_hz: u32,
    pub bits_per_word: u8,
    pub delay_usecs: u16,
}

#[derive(Debug, Default)]
pub struct SpiLog {
    pub opened: Vec<(PathBuf, OFlag)>,
    pub mode: Option<u8>,
    pub bits_per_word: Option<u8>,
    pub speed_hz: Option<u32>,
    pub transfers: Vec<TransferRecord>,
    /// Devices opened and not yet dropped
    pub live: usize,
}

/// Fake spidev. Devices loop MOSI back to MISO.
#[derive(Default)]
pub struct FakeSpi {
    pub log: Rc<RefCell<SpiLog>>,
    /// Fail `open` with this errno
    pub fail_open: Option<i32>,
    /// Fail the named request ("mode", "bits", "speed", "transfer") with EINVAL
    pub fail_request: Option<&'static str>,
}

impl FakeSpi {
    pub fn failing(request: &'static str) -> Self {
        Self {
            fail_request: Some(request),
            ..Default::default()
        }
    }
}

pub struct FakeSpiDevice {
    log: Rc<RefCell<SpiLog>>,
    fail_request: Option<&'static str>,
}

impl FakeSpiDevice {
    fn check(&self, request: &'static str) -> io::Result<()> {
        if self.fail_request == Some(request) {
            Err(os_error(libc::EINVAL))
        } else {
            Ok(())
        }
    }
}

impl Drop for FakeSpiDevice {
    fn drop(&mut self) {
        self.log.borrow_mut().live -= 1;
    }
}

impl SpiDevice for FakeSpiDevice {
    fn set_mode(&mut self, mode: u8) -> io::Result<()> {
        self.check("mode")?;
        self.log.borrow_mut().mode = Some(mode);
        Ok(())
    }

    fn set_bits_per_word(&mut self, bits: u8) -> io::Result<()> {
        self.check("bits")?;
        self.log.borrow_mut().bits_per_word = Some(bits);
        Ok(())
    }

    fn set_max_speed_hz(&mut self, speed_hz: u32) -> io::Result<()> {
        self.check("speed")?;
        self.log.borrow_mut().speed_hz = Some(speed_hz);
        Ok(())
    }

    fn transfer(&mut self, transfer: &mut SpiTransfer<'_>) -> io::Result<()> {
        self.log.borrow_mut().transfers.push(TransferRecord {
            tx: transfer.tx.to_vec(),
            rx_len: transfer.rx.len(),
            speed_hz: transfer.speed_hz,
            bits_per_word: transfer.bits_per_word,
            delay_usecs: transfer.delay_usecs,
        });
        self.check("transfer")?;
        transfer.rx.copy_from_slice(transfer.tx);
        Ok(())
    }
}

impl SpiBackend for FakeSpi {
    type Device = FakeSpiDevice;

    fn open(&self, path: &Path, flags: OFlag) -> io::Result<FakeSpiDevice> {
        let mut log = self.log.borrow_mut();
        log.opened.push((path.to_path_buf(), flags));
        if let Some(code) = self.fail_open {
            return Err(os_error(code));
        }
        log.live += 1;
        Ok(FakeSpiDevice {
            log: Rc::clone(&self.log),
            fail_request: self.fail_request,
        })
    }
}

#[derive(Debug, Default)]
pub struct SerialLog {
    pub opened: Vec<PathBuf>,
    pub settings: Option<LineSettings>,
    pub written: Vec<u8>,
    pub writes: usize,
    pub reads: usize,
    /// Bytes waiting to be read
    pub pending: VecDeque<u8>,
    pub live: usize,
}

#[derive(Default)]
pub struct FakeSerial {
    pub log: Rc<RefCell<SerialLog>>,
    pub fail_open: Option<i32>,
    pub fail_configure: bool,
    /// Accept at most this many bytes per write
    pub write_limit: Option<usize>,
    /// Fail reads with this errno
    pub fail_read: Option<i32>,
}

impl FakeSerial {
    /// Queue bytes for the port to receive.
    pub fn feed(&self, bytes: &[u8]) {
        self.log.borrow_mut().pending.extend(bytes);
    }
}

pub struct FakeSerialPort {
    log: Rc<RefCell<SerialLog>>,
    fail_configure: bool,
    write_limit: Option<usize>,
    fail_read: Option<i32>,
}

impl Drop for FakeSerialPort {
    fn drop(&mut self) {
        self.log.borrow_mut().live -= 1;
    }
}

impl SerialPort for FakeSerialPort {
    fn configure(&mut self, settings: &LineSettings) -> io::Result<()> {
        if self.fail_configure {
            return Err(os_error(libc::ENOTTY));
        }
        let mut log = self.log.borrow_mut();
        if settings.flush_input {
            log.pending.clear();
        }
        log.settings = Some(*settings);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut log = self.log.borrow_mut();
        log.writes += 1;
        let n = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        log.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut log = self.log.borrow_mut();
        log.reads += 1;
        if let Some(code) = self.fail_read {
            return Err(os_error(code));
        }
        if log.pending.is_empty() {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let n = buf.len().min(log.pending.len());
        for (slot, byte) in buf.iter_mut().zip(log.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl SerialBackend for FakeSerial {
    type Port = FakeSerialPort;

    fn open(&self, path: &Path) -> io::Result<FakeSerialPort> {
        let mut log = self.log.borrow_mut();
        log.opened.push(path.to_path_buf());
        if let Some(code) = self.fail_open {
            return Err(os_error(code));
        }
        log.live += 1;
        Ok(FakeSerialPort {
            log: Rc::clone(&self.log),
            fail_configure: self.fail_configure,
            write_limit: self.write_limit,
            fail_read: self.fail_read,
        })
    }
}
