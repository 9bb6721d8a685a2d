//! GPIO, SPI and UART access for the BeagleBone Black.
//!
//! Each peripheral is a channel that is opened, used and closed:
//!
//! - [`GpioChannel`] exports a line through sysfs and reads or drives it.
//! - [`SpiChannel`] opens a spidev node and runs full-duplex transfers.
//! - [`UartChannel`] opens a tty node in raw mode and moves bytes.
//!
//! The channels reach the OS through the traits in [`hw_trait`], so they can
//! be exercised without hardware. [`shutdown`], [`tracing`] and [`config`]
//! cover what a program around them needs, and [`demo`] is the example
//! program the `bbdl` binary runs.

pub mod config;
pub mod demo;
pub mod error;
pub mod hw_trait;
pub mod peripheral;
pub mod shutdown;
pub mod tracing;
pub mod transport;

pub use error::{Error, Result};
pub use peripheral::gpio::{Direction, Edge, GpioChannel};
pub use peripheral::leds::{UserLed, UserLeds};
pub use peripheral::spi::{SpiBus, SpiChannel, SpiConfig, SpiMode};
pub use peripheral::uart::{BaudRate, UartChannel, UartPort};
pub use peripheral::Lifecycle;
