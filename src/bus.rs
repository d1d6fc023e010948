//! # Serial bus transport
//!
//! The ST7036 is written to over a plain 4-wire SPI bus. Every SPI transfer is full duplex, so
//! even though the chip never answers, a receive buffer of the same length comes back with
//! every exchange.
//!
//! A [`BusController`] opens a bus by device name and hands back a [`Bus`]. [`HalBus`] wraps
//! an already set up `embedded_hal` SPI peripheral for targets that don't open devices by name.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;

/// SPI clock polarity and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// CPOL = 0, CPHA = 0
    Mode0,
    /// CPOL = 0, CPHA = 1
    Mode1,
    /// CPOL = 1, CPHA = 0
    Mode2,
    /// CPOL = 1, CPHA = 1
    Mode3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub mode: ClockMode,
    pub bits_per_word: u8,
    pub speed_hz: u32,
    /// Delay after each transfer before the bus is released, in microseconds.
    pub delay_usecs: u16,
}

impl BusConfig {
    /// What the ST7036 is driven with: mode 0, 8 bit words, 1 MHz, 500 µs.
    pub const ST7036: BusConfig = BusConfig {
        mode: ClockMode::Mode0,
        bits_per_word: 8,
        speed_hz: 1_000_000,
        delay_usecs: 500,
    };
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig::ST7036
    }
}

#[derive(Debug)]
pub enum BusError {
    /// The device could not be opened, or refused one of the configuration values.
    Open { device: String, source: io::Error },
    /// A transfer failed. Nothing of it should be assumed to have reached the chip.
    Transfer { source: io::Error },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Open { device, source } => write!(f, "could not open '{}': {}", device, source),
            BusError::Transfer { source } => write!(f, "could not send spi message: {}", source),
        }
    }
}

impl StdError for BusError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BusError::Open { source, .. } | BusError::Transfer { source } => Some(source),
        }
    }
}

/// An open, configured bus.
pub trait Bus {
    /// Full duplex transfer of `tx`. Returns the bytes clocked in, always `tx.len()` of them.
    fn exchange(&mut self, tx: &[u8], delay_usecs: u16) -> Result<Vec<u8>, BusError>;

    /// Close the bus. Closing twice is harmless.
    fn close(&mut self);
}

/// Opens buses by device name.
pub trait BusController {
    type Bus: Bus;

    /// Open `device` and apply `config` in the order mode, word size, speed.
    fn open(&mut self, device: &str, config: &BusConfig) -> Result<Self::Bus, BusError>;
}

/// A [`Bus`] on top of any blocking `embedded_hal` SPI which supports full duplex transfers.
///
/// The SPI has to be configured for [`BusConfig::ST7036`] already, `HalBus` can't change it.
pub struct HalBus<SPI, DELAY> {
    spi: SPI,
    delay: DELAY,
    open: bool,
}

impl<SPI, DELAY, E> HalBus<SPI, DELAY>
where
    SPI: Transfer<u8, Error = E>,
    DELAY: DelayUs<u16>,
    E: fmt::Debug,
{
    pub fn new(spi: SPI, delay: DELAY) -> HalBus<SPI, DELAY> {
        HalBus {
            spi,
            delay,
            open: true,
        }
    }
}

impl<SPI, DELAY, E> Bus for HalBus<SPI, DELAY>
where
    SPI: Transfer<u8, Error = E>,
    DELAY: DelayUs<u16>,
    E: fmt::Debug,
{
    fn exchange(&mut self, tx: &[u8], delay_usecs: u16) -> Result<Vec<u8>, BusError> {
        if !self.open {
            return Err(BusError::Transfer {
                source: io::Error::new(io::ErrorKind::NotConnected, "bus is closed"),
            });
        }
        let mut words = tx.to_vec();
        let rx = self
            .spi
            .transfer(&mut words)
            .map_err(|e| BusError::Transfer {
                source: io::Error::new(io::ErrorKind::Other, format!("{:?}", e)),
            })?
            .to_vec();
        if rx.len() != tx.len() {
            return Err(BusError::Transfer {
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("sent {} bytes but got {} back", tx.len(), rx.len()),
                ),
            });
        }
        self.delay.delay_us(delay_usecs);
        Ok(rx)
    }

    fn close(&mut self) {
        self.open = false;
    }
}
