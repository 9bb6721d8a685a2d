//! Linux implementations of the hardware traits.
//!
//! These are the only places that open real files and device nodes. Each
//! module backs one trait from [`crate::hw_trait`].

pub mod spidev;
pub mod sysfs;
pub mod tty;
