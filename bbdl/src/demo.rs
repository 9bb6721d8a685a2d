//! The `bbdl` example program: drive GPIO 60 high, then blink USR0 and send a
//! greeting over a UART until interrupted.
//!
//! Setup opens the UART before touching sysfs. The UART is the only failure
//! that ends the program, and when it happens no GPIO line has been exported
//! yet, so nothing is left behind for the next run.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::hw_trait::{SerialBackend, Sysfs};
use crate::peripheral::gpio::{Direction, GpioChannel};
use crate::peripheral::leds::{UserLed, UserLeds};
use crate::peripheral::uart::UartChannel;
use crate::tracing::prelude::*;
use crate::transport::{sysfs::LinuxSysfs, tty::LinuxSerial};

pub struct Demo<S = LinuxSysfs, B: SerialBackend = LinuxSerial> {
    leds: UserLeds<S>,
    gpio: GpioChannel<S>,
    uart: UartChannel<B>,
    message: Vec<u8>,
    blink: Duration,
}

impl<S: Sysfs + Clone, B: SerialBackend> Demo<S, B> {
    /// Check the configured port and baud rate, open the UART, then the LEDs
    /// and the GPIO line.
    ///
    /// LED and GPIO failures are logged and the demo carries on without them.
    pub fn setup(config: &Config, sysfs: S, serial: B) -> Result<Self> {
        let mut uart = UartChannel::with_backend(
            config.demo.uart_port()?,
            config.demo.baud_rate()?,
            &config.paths.dev_root,
            serial,
        );
        uart.open()?;

        let leds = UserLeds::with_backend(&config.paths.leds_root, sysfs.clone());
        if let Err(e) = leds.init() {
            warn!("{e}");
        }

        let mut gpio = GpioChannel::with_backend(
            config.demo.gpio_line,
            Direction::Output,
            &config.paths.gpio_root,
            sysfs,
        );
        match gpio.open() {
            Ok(()) => {
                if let Err(e) = gpio.write(true) {
                    warn!("{e}");
                }
            }
            Err(e) => error!("Error opening GPIO {}: {e}", config.demo.gpio_line),
        }

        // Terminating NUL included, as the receiving side expects.
        let mut message = config.demo.message.clone().into_bytes();
        message.push(0);

        Ok(Self {
            leds,
            gpio,
            uart,
            message,
            blink: Duration::from_millis(config.demo.blink_ms),
        })
    }

    /// Blink and send until `running` is cancelled or a UART write fails.
    pub async fn run(&mut self, running: &CancellationToken) -> Result<()> {
        while !running.is_cancelled() {
            for on in [true, false] {
                if let Err(e) = self.leds.write(UserLed::Usr0, on) {
                    warn!("{e}");
                }
                tokio::select! {
                    _ = running.cancelled() => return Ok(()),
                    _ = time::sleep(self.blink) => {}
                }
            }

            self.uart.write(&self.message)?;
        }
        Ok(())
    }

    /// Unexport the GPIO line if it was exported, then close the UART.
    pub fn shutdown(mut self) -> Result<()> {
        trace!("Shutting down.");
        if self.gpio.is_exported() {
            if let Err(e) = self.gpio.close() {
                warn!("{e}");
            }
        }
        self.uart.close()
    }
}
