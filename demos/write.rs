use std::fmt::Write;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

/// Write a line of text to an ST7036 display on a Linux SPI bus.
#[derive(Debug, Parser)]
struct Args {
    /// Text to show, starting top left
    text: String,

    /// spidev device the display is connected to
    #[arg(long, default_value = "/dev/spidev0.0")]
    device: String,

    /// sysfs number of the RS (register select) pin
    #[arg(long, default_value_t = 129)]
    rs_pin: u32,

    /// sysfs number of the backlight pin
    #[arg(long, default_value_t = 502)]
    backlight_pin: u32,

    /// Print every byte sent to the display
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("st7036", level)
        .filter_module("write", level)
        .init();

    let mut display = st7036::linux::init(&args.device, args.rs_pin, args.backlight_pin)
        .with_context(|| format!("could not set up display on {}", args.device))?;

    if let Err(e) = display.set_backlight(true) {
        log::warn!("no backlight: {}", e);
    }
    display.set_cursor_blinking(true)?;
    display.set_cursor_visible(true)?;
    display.clear()?;
    display.set_cursor(0, 0)?;
    write!(display, "{}", args.text).context("could not write text")?;
    log::info!("wrote {} characters", args.text.len());

    display.teardown();
    Ok(())
}
