//! # Main driver for the ST7036
//!
//! This module exports the main ST7036 struct. It keeps the shadow state of the display (the
//! chip can't be read back, so the driver's copy is the only truth) and sends raw bytes to
//! the device.
//!
//! Every byte goes out the same way: RS is driven low for a command or high for display data,
//! the byte is exchanged over the bus, and then the driver waits [`SETTLE_DELAY_US`] so the chip
//! is done before the next byte arrives. Commands are always preceded by a function set
//! selecting their instruction table.
//!
//! Typically you want to look into the following functions:
//!  - ST7036::init() to open the bus, reserve the pins and initialize the display
//!  - ST7036.set_cursor() and ST7036.write_string() to put text on it
//!  - ST7036.set_contrast() and ST7036.set_backlight() to make it readable
//!
//! A display is not meant to be shared between threads; put it behind a mutex if you have to,
//! so the shadow state and the chip can't drift apart.
use core::fmt;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::{
    bus::{Bus, BusConfig, BusController},
    error::Error,
    gpio::{PinController, PinError, PinHandle},
    instructions::{self, prelude::*},
};

/// Time the chip needs to process a byte.
pub const SETTLE_DELAY_US: u16 = 30;

/// Contrast set by [`ST7036::reset`].
pub const DEFAULT_CONTRAST: u8 = 20;

/// What the next transfer is, selected by the RS pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Register {
    /// RS low
    Command,
    /// RS high
    Data,
}

#[derive(Debug)]
/// main struct for state keeping of the ST7036 driver, owning the bus and both pins
pub struct ST7036<BUS, RS, LIGHT, DELAY>
where
    BUS: Bus,
    RS: OutputPin<Error = PinError>,
    LIGHT: OutputPin<Error = PinError>,
    DELAY: DelayUs<u16>,
{
    bus: BUS,
    rs: RS,
    light: Option<LIGHT>,
    delay: DELAY,
    config: BusConfig,
    double_height: bool,
    display_on: bool,
    cursor_visible: bool,
    cursor_blinking: bool,
    cursor_increment: bool,
    shift_display: bool,
}

impl<BUS, PC, DELAY> ST7036<BUS, PinHandle<PC>, PinHandle<PC>, DELAY>
where
    BUS: Bus,
    PC: PinController + Clone,
    DELAY: DelayUs<u16>,
{
    /// Open the bus, reserve the pins and initialize the display.
    ///
    /// Arguments:
    ///
    /// - buses: opens `device` with [`BusConfig::ST7036`]
    /// - pins: reserves the RS and backlight pins
    /// - rs_pin: number of the pin connected to RS (register select)
    /// - light_pin: number of the pin switching the backlight
    /// - delay: used for the settle delay after every byte
    ///
    /// The backlight is optional: if its pin can't be reserved the display still comes up and
    /// only `set_backlight` fails. Anything else failing releases what was already acquired
    /// and returns the error.
    pub fn init<BC>(
        buses: &mut BC,
        pins: PC,
        device: &str,
        rs_pin: u32,
        light_pin: u32,
        delay: DELAY,
    ) -> Result<Self, Error>
    where
        BC: BusController<Bus = BUS>,
    {
        let config = BusConfig::ST7036;
        let mut bus = buses.open(device, &config).map_err(|e| {
            log::error!("{}", e);
            Error::resource(e)
        })?;

        let rs = match Self::reserve_rs(pins.clone(), rs_pin) {
            Ok(rs) => rs,
            Err(e) => {
                log::error!("{}", e);
                bus.close();
                return Err(Error::resource(e));
            }
        };

        // not critical for the display itself
        let light = match PinHandle::output(pins, light_pin) {
            Ok(light) => Some(light),
            Err(e) => {
                log::warn!("{}, continuing without backlight", e);
                None
            }
        };

        Self::with_config(bus, config, rs, light, delay)
    }

    // RS idles high (data)
    fn reserve_rs(pins: PC, rs_pin: u32) -> Result<PinHandle<PC>, PinError> {
        let mut rs = PinHandle::output(pins, rs_pin)?;
        rs.set_high()?;
        Ok(rs)
    }
}

impl<BUS, RS, LIGHT, DELAY> ST7036<BUS, RS, LIGHT, DELAY>
where
    BUS: Bus,
    RS: OutputPin<Error = PinError>,
    LIGHT: OutputPin<Error = PinError>,
    DELAY: DelayUs<u16>,
{
    /// Create a new instance of the ST7036 driver from resources which are already set up,
    /// and initialize the display.
    ///
    /// Arguments:
    ///
    /// - bus: an open bus configured like [`BusConfig::ST7036`]
    /// - rs: output pin connected to RS
    /// - light: output pin switching the backlight, if there is one
    /// - delay: used for the settle delay after every byte
    pub fn new(bus: BUS, rs: RS, light: Option<LIGHT>, delay: DELAY) -> Result<Self, Error> {
        Self::with_config(bus, BusConfig::ST7036, rs, light, delay)
    }

    fn with_config(
        bus: BUS,
        config: BusConfig,
        rs: RS,
        light: Option<LIGHT>,
        delay: DELAY,
    ) -> Result<Self, Error> {
        let mut st = ST7036 {
            bus,
            rs,
            light,
            delay,
            config,
            double_height: false,
            display_on: true,
            cursor_visible: true,
            cursor_blinking: true,
            cursor_increment: true,
            shift_display: false,
        };

        if let Err(e) = st.reset() {
            log::error!("could not initialize display: {}", e);
            st.teardown();
            return Err(e);
        }
        Ok(st)
    }

    /// Run the power up sequence and put the shadow state back to its defaults: display on,
    /// cursor visible and blinking, cursor moving right, no display shift, contrast 20.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.double_height = false;
        self.display_on = true;
        self.cursor_visible = true;
        self.cursor_blinking = true;
        self.cursor_increment = true;
        self.shift_display = false;

        log::debug!("initializing display");

        // the chip wants the first function set twice after power up
        self.write_function_set(InstructionTable::Extended)?;
        self.write_function_set(InstructionTable::Extended)?;
        self.write_command(SetBias(Bias::Bias1))?;
        self.set_contrast(DEFAULT_CONTRAST)?;
        self.write_command(FollowerControl)?;
        self.send_display_mode()?;
        self.clear()?;
        self.send_entry_mode()
    }

    /// Close the bus and release the pins.
    ///
    /// Never fails; problems while releasing are only logged.
    pub fn teardown(mut self) {
        log::debug!("releasing display");
        self.bus.close();
    }

    /// Switch the backlight on or off.
    ///
    /// The backlight is active low: on means the pin is driven low.
    pub fn set_backlight(&mut self, on: bool) -> Result<(), Error> {
        let light = self
            .light
            .as_mut()
            .ok_or(Error::UnavailableFeature("backlight"))?;
        if on {
            light.set_low().map_err(Error::io)
        } else {
            light.set_high().map_err(Error::io)
        }
    }

    /// Set the contrast, 0..=63. Larger values are refused without sending anything.
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), Error> {
        let [low, high] = instructions::contrast(contrast)?;
        log::debug!("sending contrast {}", contrast);
        self.write_command(low)?;
        self.write_command(high)
    }

    /// Move the cursor to column `x` of row `y`. Out of range positions are not checked.
    pub fn set_cursor(&mut self, x: u8, y: u8) -> Result<(), Error> {
        log::debug!("sending cursor position ({}, {})", x, y);
        self.write_command(instructions::cursor(x, y))
    }

    pub fn set_cursor_visible(&mut self, visible: bool) -> Result<(), Error> {
        self.cursor_visible = visible;
        self.send_display_mode()
    }

    pub fn set_cursor_blinking(&mut self, blinking: bool) -> Result<(), Error> {
        self.cursor_blinking = blinking;
        self.send_display_mode()
    }

    /// Blank or show the display. The DDRAM content is kept.
    pub fn set_display_on(&mut self, on: bool) -> Result<(), Error> {
        self.display_on = on;
        self.send_display_mode()
    }

    /// Whether the cursor moves right (true) or left after each character.
    pub fn set_cursor_increment(&mut self, increment: bool) -> Result<(), Error> {
        self.cursor_increment = increment;
        self.send_entry_mode()
    }

    /// Whether the whole display shifts instead of the cursor after each character.
    pub fn set_shift_display(&mut self, shift: bool) -> Result<(), Error> {
        self.shift_display = shift;
        self.send_entry_mode()
    }

    /// Use double height characters. The bit is part of every function set sent from now on.
    pub fn set_double_height(&mut self, double_height: bool) -> Result<(), Error> {
        self.double_height = double_height;
        self.write_function_set(InstructionTable::Basic)
    }

    /// Clear the display and move the cursor to (0, 0).
    pub fn clear(&mut self) -> Result<(), Error> {
        self.write_command(Clear)
    }

    /// Move the cursor to (0, 0) and undo display shifts, keeping the content.
    pub fn home(&mut self) -> Result<(), Error> {
        self.write_command(Home)
    }

    /// Put one character at the cursor position.
    pub fn write_char(&mut self, c: u8) -> Result<(), Error> {
        self.transfer(Register::Data, &[c])
    }

    /// Put `s` at the cursor position, one transfer per byte.
    ///
    /// Stops at the first failing byte and returns its error; whatever was sent before stays
    /// on the display.
    pub fn write_string(&mut self, s: &str) -> Result<(), Error> {
        for c in s.bytes() {
            self.write_char(c)?;
        }
        Ok(())
    }

    pub fn display_on(&self) -> bool {
        self.display_on
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn cursor_blinking(&self) -> bool {
        self.cursor_blinking
    }

    pub fn cursor_increment(&self) -> bool {
        self.cursor_increment
    }

    pub fn shift_display(&self) -> bool {
        self.shift_display
    }

    pub fn double_height(&self) -> bool {
        self.double_height
    }

    /// false if the backlight pin could not be reserved.
    pub fn has_backlight(&self) -> bool {
        self.light.is_some()
    }

    /// Send a single command to the ST7036.
    ///
    /// The command is automatically preceded by the function set selecting its instruction
    /// table, so you do not have to worry about changing tables.
    pub fn write_command(&mut self, instruction: Instruction) -> Result<(), Error> {
        self.write_function_set(instruction.table())?;
        self.transfer(Register::Command, &[instruction.byte()])
    }

    fn write_function_set(&mut self, table: InstructionTable) -> Result<(), Error> {
        let function_set = FunctionSet {
            table,
            double_height: self.double_height,
        };
        self.transfer(Register::Command, &[function_set.byte()])
    }

    fn send_display_mode(&mut self) -> Result<(), Error> {
        log::debug!("sending display mode");
        self.write_command(DisplayMode {
            on: self.display_on,
            cursor_visible: self.cursor_visible,
            cursor_blinking: self.cursor_blinking,
        })
    }

    fn send_entry_mode(&mut self) -> Result<(), Error> {
        log::debug!("sending entry mode");
        self.write_command(EntryMode {
            increment: self.cursor_increment,
            shift: self.shift_display,
        })
    }

    // RS first, then the bytes, then the settle delay no matter how it went.
    fn transfer(&mut self, register: Register, bytes: &[u8]) -> Result<(), Error> {
        let result = self.select_and_send(register, bytes);
        self.delay.delay_us(SETTLE_DELAY_US);
        result
    }

    fn select_and_send(&mut self, register: Register, bytes: &[u8]) -> Result<(), Error> {
        match register {
            Register::Command => self.rs.set_low(),
            Register::Data => self.rs.set_high(),
        }
        .map_err(Error::io)?;

        log::trace!("sending {:02x?} ({:?})", bytes, register);
        // the chip never answers, what comes back is noise
        let _rx = self
            .bus
            .exchange(bytes, self.config.delay_usecs)
            .map_err(|e| {
                log::error!("{}", e);
                Error::io(e)
            })?;
        Ok(())
    }
}

impl<BUS, RS, LIGHT, DELAY> fmt::Write for ST7036<BUS, RS, LIGHT, DELAY>
where
    BUS: Bus,
    RS: OutputPin<Error = PinError>,
    LIGHT: OutputPin<Error = PinError>,
    DELAY: DelayUs<u16>,
{
    // makes write!() and writeln!() work directly on the display, '\n' is sent as is
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s).map_err(|_| fmt::Error)
    }
}
