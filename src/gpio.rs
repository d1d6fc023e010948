//! # Digital pin control
//!
//! The ST7036 needs two extra lines next to the bus: RS (register select, picks command or
//! data for the next transfer) and, on most modules, a backlight switch. Both are write-only.
//!
//! How a pin gets reserved on the host is up to the [`PinController`]; the driver only needs
//! the four operations it exposes. A reserved pin is held by a [`PinHandle`], which gives it
//! back when dropped and implements `OutputPin` so the display code doesn't care where the
//! pin comes from.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use embedded_hal::digital::v2::OutputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Pin reservation and drive mechanism of the host, addressed by pin number.
pub trait PinController {
    /// Request exclusive use of `pin`.
    fn reserve(&mut self, pin: u32) -> io::Result<()>;

    fn set_direction(&mut self, pin: u32, direction: Direction) -> io::Result<()>;

    fn set_level(&mut self, pin: u32, level: Level) -> io::Result<()>;

    /// Give `pin` back. Only called for pins that were reserved.
    fn release(&mut self, pin: u32) -> io::Result<()>;
}

#[derive(Debug)]
pub enum PinError {
    /// The host refused to hand out the pin (in use, no such pin, no permission).
    Reservation { pin: u32, source: io::Error },
    /// The direction could not be configured.
    Config { pin: u32, source: io::Error },
    /// Driving the pin failed.
    Io { pin: u32, source: io::Error },
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::Reservation { pin, source } => {
                write!(f, "could not reserve gpio {}: {}", pin, source)
            }
            PinError::Config { pin, source } => {
                write!(f, "could not set direction of gpio {}: {}", pin, source)
            }
            PinError::Io { pin, source } => {
                write!(f, "could not set value of gpio {}: {}", pin, source)
            }
        }
    }
}

impl StdError for PinError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PinError::Reservation { source, .. }
            | PinError::Config { source, .. }
            | PinError::Io { source, .. } => Some(source),
        }
    }
}

/// A reserved pin. Released exactly once, either by [`PinHandle::release`] or on drop.
#[derive(Debug)]
pub struct PinHandle<C: PinController> {
    controller: C,
    pin: u32,
    direction: Option<Direction>,
    reserved: bool,
}

impl<C: PinController> PinHandle<C> {
    pub fn reserve(mut controller: C, pin: u32) -> Result<PinHandle<C>, PinError> {
        controller
            .reserve(pin)
            .map_err(|source| PinError::Reservation { pin, source })?;
        log::debug!("reserved gpio {}", pin);
        Ok(PinHandle {
            controller,
            pin,
            direction: None,
            reserved: true,
        })
    }

    /// Reserve `pin` and configure it as an output in one go.
    pub fn output(controller: C, pin: u32) -> Result<PinHandle<C>, PinError> {
        let mut handle = PinHandle::reserve(controller, pin)?;
        handle.set_direction(Direction::Output)?;
        Ok(handle)
    }

    pub fn number(&self) -> u32 {
        self.pin
    }

    pub fn set_direction(&mut self, direction: Direction) -> Result<(), PinError> {
        let pin = self.pin;
        self.controller
            .set_direction(pin, direction)
            .map_err(|source| PinError::Config { pin, source })?;
        self.direction = Some(direction);
        Ok(())
    }

    /// Drive the pin.
    ///
    /// Panics if the pin was not configured as an output through this handle: driving an
    /// input is a bug in the caller, not something to recover from.
    pub fn set_level(&mut self, level: Level) -> Result<(), PinError> {
        assert!(
            self.reserved && self.direction == Some(Direction::Output),
            "gpio {} is not a reserved output",
            self.pin
        );
        let pin = self.pin;
        self.controller
            .set_level(pin, level)
            .map_err(|source| PinError::Io { pin, source })
    }

    /// Give the pin back to the host. Calling it again does nothing; failures are only logged.
    pub fn release(&mut self) {
        if !self.reserved {
            return;
        }
        self.reserved = false;
        if let Err(e) = self.controller.release(self.pin) {
            log::warn!("could not release gpio {}: {}", self.pin, e);
        } else {
            log::debug!("released gpio {}", self.pin);
        }
    }
}

impl<C: PinController> Drop for PinHandle<C> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<C: PinController> OutputPin for PinHandle<C> {
    type Error = PinError;

    fn set_low(&mut self) -> Result<(), PinError> {
        self.set_level(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), PinError> {
        self.set_level(Level::High)
    }
}
