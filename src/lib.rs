//! # Driver for the ST7036 dot matrix character LCD controller
//!
//! The ST7036 sits on 3 line by 16 character modules like the EA DOGM163, written to over SPI
//! with one extra GPIO selecting between commands and display data and, optionally, one
//! switching the backlight.
//!
//! On Linux (feature `linux`, enabled by default) the display is set up from a spidev device
//! and sysfs GPIO numbers:
//!
//! ```no_run
//! # fn main() -> Result<(), st7036::Error> {
//! let mut display = st7036::linux::init("/dev/spidev0.0", 129, 502)?;
//! display.set_backlight(true)?;
//! display.clear()?;
//! display.set_cursor(0, 0)?;
//! display.write_string("Hello World")?;
//! display.teardown();
//! # Ok(())
//! # }
//! ```
//!
//! Anywhere else, implement [`bus::BusController`] and [`gpio::PinController`] for the
//! platform, or hand an `embedded_hal` SPI to [`bus::HalBus`] and call [`ST7036::new`].

/// Characters per row.
pub const COLUMNS: u8 = 16;
/// Rows of the display.
pub const ROWS: u8 = 3;

pub mod bus;
pub mod display;
pub mod error;
pub mod gpio;
pub mod instructions;
#[cfg(feature = "linux")]
pub mod linux;

#[cfg(test)]
mod test_spy;

pub use bus::{Bus, BusConfig, BusController, HalBus};
pub use display::{ST7036, DEFAULT_CONTRAST, SETTLE_DELAY_US};
pub use error::{Error, ErrorKind};
pub use gpio::{PinController, PinHandle};
