mod config;

use crate::config::{Backend, Config};
use dotenv::dotenv;
use hdlcd_gpio::delay::StdDelay;
use hdlcd_gpio::gpiod::GpiodPlatform;
use hdlcd_gpio::lcd::hd44780::stream::{CommandSink, DataSink};
use hdlcd_gpio::lcd::hd44780::{GpioHD44780Driver, PinManager, PinMap};
use hdlcd_gpio::raw::RawPlatform;
use hdlcd_gpio::PinPlatform;
use log::{debug, info};
use std::env::args;
use std::io::stdin;
use sysinfo::System;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Mode {
    /// Text, with `\n` moving to the second line.
    Data,
    /// Raw instruction bytes.
    Command,
}

impl Mode {
    fn from_args() -> eyre::Result<Self> {
        match args().nth(1).as_deref() {
            None | Some("data") => Ok(Mode::Data),
            Some("command") => Ok(Mode::Command),
            Some(other) => Err(eyre::eyre!(
                "Unknown mode {:?}, expected \"data\" or \"command\"",
                other
            )),
        }
    }
}

fn run<P: PinPlatform>(platform: P, map: &PinMap, mode: Mode) -> eyre::Result<()> {
    debug!("Acquiring LCD lines on {:?}...", platform);
    let mut pins = PinManager::new(platform, map);
    let session = pins.acquire_all()?;

    debug!("Initializing LCD driver...");
    let driver = GpioHD44780Driver::init(session, StdDelay)?;
    info!("hd44780 driver loaded");

    let input = stdin().lock();
    let driver = match mode {
        Mode::Data => {
            let mut sink = DataSink::new(driver);
            let count = sink.write_from(input)?;
            info!("Wrote {} bytes", count);
            sink.into_inner()
        }
        Mode::Command => {
            let mut sink = CommandSink::new(driver);
            let count = sink.write_from(input)?;
            info!("Sent {} commands", count);
            sink.into_inner()
        }
    };

    driver.release();
    info!("hd44780 driver unloaded");
    Ok(())
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "hdlcd starting on {} ({})",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::cpu_arch()
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let mode = Mode::from_args()?;
    let config = Config::load()?;
    let map: PinMap = config.pins.into();

    info!(
        "LCD @ E: {}, RW: {}, RS: {}, Data: {:?}",
        map.e, map.rw, map.rs, map.data
    );

    match config.backend {
        Backend::Gpiod => run(GpiodPlatform::open(&config.chip)?, &map, mode),
        Backend::Gpiomem => run(RawPlatform::new_gpiomem()?, &map, mode),
        Backend::Mem => run(RawPlatform::new_mem()?, &map, mode),
    }
}
