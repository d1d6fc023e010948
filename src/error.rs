//! # Errors reported by the ST7036 driver
//!
//! The ST7036 has no way to report anything back, so every error originates on the host side:
//! a pin or bus that could not be set up, a write that failed, or a value the chip can't take.

use std::error::Error as StdError;
use std::fmt;

use crate::bus::BusError;
use crate::gpio::PinError;

/// The component that failed underneath a [`Error::Resource`] or [`Error::Io`].
#[derive(Debug)]
pub enum Fault {
    Pin(PinError),
    Bus(BusError),
}

impl From<PinError> for Fault {
    fn from(e: PinError) -> Self {
        Fault::Pin(e)
    }
}

impl From<BusError> for Fault {
    fn from(e: BusError) -> Self {
        Fault::Bus(e)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Pin(e) => fmt::Display::fmt(e, f),
            Fault::Bus(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// Coarse classification of an [`Error`], for callers that only want to branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resource,
    Io,
    InvalidArgument,
    UnavailableFeature,
}

#[derive(Debug)]
pub enum Error {
    /// Opening or configuring the bus or a pin failed while setting the display up.
    Resource(Fault),

    /// A pin write or bus transfer failed after setup. The display may show a partial result.
    Io(Fault),

    /// A value outside of what the chip accepts. Nothing was sent.
    InvalidArgument {
        name: &'static str,
        value: u32,
        max: u32,
    },

    /// The operation needs a resource which could not be reserved during init.
    UnavailableFeature(&'static str),
}

impl Error {
    pub(crate) fn resource<F: Into<Fault>>(fault: F) -> Self {
        Error::Resource(fault.into())
    }

    pub(crate) fn io<F: Into<Fault>>(fault: F) -> Self {
        Error::Io(fault.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Resource(_) => ErrorKind::Resource,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::UnavailableFeature(_) => ErrorKind::UnavailableFeature,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Resource(fault) => write!(f, "display setup failed: {}", fault),
            Error::Io(fault) => write!(f, "display i/o failed: {}", fault),
            Error::InvalidArgument { name, value, max } => {
                write!(f, "{} must be in 0..={}, got {}", name, max, value)
            }
            Error::UnavailableFeature(feature) => write!(f, "{} is not available", feature),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Resource(Fault::Pin(e)) | Error::Io(Fault::Pin(e)) => Some(e),
            Error::Resource(Fault::Bus(e)) | Error::Io(Fault::Bus(e)) => Some(e),
            _ => None,
        }
    }
}
