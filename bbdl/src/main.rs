use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use bbdl::config::Config;
use bbdl::demo::Demo;
use bbdl::shutdown;
use bbdl::tracing::{self, prelude::*};
use bbdl::transport::{sysfs::LinuxSysfs, tty::LinuxSerial};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing::init_journald_or_stdout();

    let config = Config::load()?;

    let running = CancellationToken::new();
    let stop = running.clone();
    let signals = shutdown::interrupts().context("failed to install SIGINT handler")?;
    tokio::spawn(shutdown::on_interrupt(signals, move || {
        info!("CTRL-C caught!");
        stop.cancel();
    }));

    // Without the UART there is nothing for this program to do.
    let mut demo = Demo::setup(&config, LinuxSysfs, LinuxSerial)
        .context("failed to set up the demo")?;

    let result = demo
        .run(&running)
        .await
        .context("could not send data to UART peripheral");

    demo.shutdown()?;

    info!("Process finished.");
    result
}
