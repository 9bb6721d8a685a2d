//! Pseudo-file access on a mounted sysfs.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::hw_trait::Sysfs;

/// Plain file I/O against the real filesystem.
///
/// Attribute writes must reach the kernel as one `write(2)` with the whole
/// value, so contents are written with a single `write_all` on a fresh handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSysfs;

impl Sysfs for LinuxSysfs {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;
        file.write_all(contents.as_bytes())
    }

    fn read_byte(&self, path: &Path) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        File::open(path)?.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}
