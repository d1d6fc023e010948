//! Pin controller, bus and delay for use in unit tests, spying on everything done to them.
//!
//! All three write into one shared [`Log`], so tests can check the order of pin writes,
//! transfers and settle delays across components.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayUs;

use crate::bus::{Bus, BusConfig, BusController, BusError};
use crate::gpio::{Direction, Level, PinController};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Reserve(u32),
    Direction(u32, Direction),
    Level(u32, Level),
    Release(u32),
    Open(String, BusConfig),
    Transfer(Vec<u8>, u16),
    Close,
    Settle(u16),
}

#[derive(Debug, Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Bytes of every transfer, in order.
    pub fn transfers(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Transfer(bytes, _) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpyGpio {
    log: Log,
    refused: Rc<RefCell<Vec<u32>>>,
    unconfigurable: Rc<RefCell<Vec<u32>>>,
    fail_levels: Rc<Cell<bool>>,
}

impl SpyGpio {
    pub fn with_log(log: &Log) -> Self {
        SpyGpio {
            log: log.clone(),
            ..SpyGpio::default()
        }
    }

    pub fn log(&self) -> Log {
        self.log.clone()
    }

    /// Make reserving `pin` fail.
    pub fn refuse(&self, pin: u32) {
        self.refused.borrow_mut().push(pin);
    }

    /// Make setting the direction of `pin` fail.
    pub fn refuse_direction(&self, pin: u32) {
        self.unconfigurable.borrow_mut().push(pin);
    }

    pub fn fail_levels(&self, fail: bool) {
        self.fail_levels.set(fail);
    }
}

fn refused(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, what.to_string())
}

impl PinController for SpyGpio {
    fn reserve(&mut self, pin: u32) -> io::Result<()> {
        if self.refused.borrow().contains(&pin) {
            return Err(refused("reserve"));
        }
        self.log.push(Event::Reserve(pin));
        Ok(())
    }

    fn set_direction(&mut self, pin: u32, direction: Direction) -> io::Result<()> {
        if self.unconfigurable.borrow().contains(&pin) {
            return Err(refused("direction"));
        }
        self.log.push(Event::Direction(pin, direction));
        Ok(())
    }

    fn set_level(&mut self, pin: u32, level: Level) -> io::Result<()> {
        if self.fail_levels.get() {
            return Err(refused("level"));
        }
        self.log.push(Event::Level(pin, level));
        Ok(())
    }

    fn release(&mut self, pin: u32) -> io::Result<()> {
        self.log.push(Event::Release(pin));
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpyBuses {
    log: Log,
    missing: Rc<RefCell<Vec<String>>>,
    transfers_left: Rc<Cell<Option<usize>>>,
}

impl SpyBuses {
    pub fn with_log(log: &Log) -> Self {
        SpyBuses {
            log: log.clone(),
            ..SpyBuses::default()
        }
    }

    /// Make opening `device` fail.
    pub fn remove(&self, device: &str) {
        self.missing.borrow_mut().push(device.to_string());
    }

    /// Let `count` more transfers succeed, fail all after that.
    pub fn fail_after(&self, count: usize) {
        self.transfers_left.set(Some(count));
    }
}

impl BusController for SpyBuses {
    type Bus = SpyBus;

    fn open(&mut self, device: &str, config: &BusConfig) -> Result<SpyBus, BusError> {
        if self.missing.borrow().iter().any(|d| d == device) {
            return Err(BusError::Open {
                device: device.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such device"),
            });
        }
        self.log.push(Event::Open(device.to_string(), *config));
        Ok(SpyBus {
            log: self.log.clone(),
            transfers_left: self.transfers_left.clone(),
            open: true,
        })
    }
}

#[derive(Debug)]
pub struct SpyBus {
    log: Log,
    transfers_left: Rc<Cell<Option<usize>>>,
    open: bool,
}

impl Bus for SpyBus {
    fn exchange(&mut self, tx: &[u8], delay_usecs: u16) -> Result<Vec<u8>, BusError> {
        match self.transfers_left.get() {
            Some(0) => {
                return Err(BusError::Transfer {
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "bus gone"),
                })
            }
            Some(n) => self.transfers_left.set(Some(n - 1)),
            None => {}
        }
        self.log.push(Event::Transfer(tx.to_vec(), delay_usecs));
        Ok(vec![0; tx.len()])
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.push(Event::Close);
        }
    }
}

impl Drop for SpyBus {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpyDelay {
    log: Log,
}

impl SpyDelay {
    pub fn with_log(log: &Log) -> Self {
        SpyDelay { log: log.clone() }
    }
}

impl DelayUs<u16> for SpyDelay {
    fn delay_us(&mut self, us: u16) {
        self.log.push(Event::Settle(us));
    }
}
