//! # Module defining the instruction set of the ST7036
//!
//! All instructions are implemented as an enum, the arguments as plain values or small enums.
//! The bit patterns are written in binary to look the same as the data sheet:
//! <https://www.lcd-module.de/eng/pdf/zubehoer/st7036.pdf>
//!
//! ## Instruction tables
//! The ST7036 decodes the same opcode differently depending on the instruction table selected
//! by the last function set. Table 0 holds the HD44780 style basic commands (clear, entry mode,
//! display mode, ...), table 1 holds the extended ones needed to power up the LCD voltage
//! generator (bias, contrast, booster, follower). Function set and DDRAM address work in every
//! table.
//!
//! Every [`Instruction`] knows its table, and the driver sends the matching function set right
//! in front of it. The selection is never remembered between commands.
//!
//! ## Contrast
//! The contrast is a 6 bit value (0..=63) split over two extended instructions: the low nibble
//! goes into contrast set, the upper two bits into power/icon/contrast set, which also keeps the
//! booster switched on. The driver initializes it with 20.
//!
//! ## Follower control
//! The voltage follower circuit is switched on with a fixed V0 amplifier ratio of 5. That value
//! fits the 3.3V, 3 line modules this driver targets; it is not exposed.

use crate::{error::Error, COLUMNS};

pub const CMD_CLEAR: u8 = 0b0000_0001;
pub const CMD_HOME: u8 = 0b0000_0010;
pub const CMD_ENTRY_MODE: u8 = 0b0000_0100;
pub const CMD_DISPLAY_MODE: u8 = 0b0000_1000;
pub const CMD_BIAS: u8 = 0b0001_0100;
pub const CMD_FUNCTION_SET: u8 = 0b0011_1000;
pub const CMD_POWER_ICON_CONTRAST_HIGH: u8 = 0b0101_0000;
pub const CMD_FOLLOWER_CONTROL: u8 = 0b0110_0000;
pub const CMD_CONTRAST_LOW: u8 = 0b0111_0000;
pub const CMD_DDRAM_ADDRESS: u8 = 0b1000_0000;

const STAT_DISPLAY_ON: u8 = 0b0000_0100;
const STAT_CURSOR_VISIBLE: u8 = 0b0000_0010;
const STAT_CURSOR_BLINKING: u8 = 0b0000_0001;

const STAT_CURSOR_INCREMENT: u8 = 0b0000_0010;
const STAT_SHIFT_DISPLAY: u8 = 0b0000_0001;

const STAT_DOUBLE_HEIGHT: u8 = 0b0000_0100;

const STAT_BIAS_FIXED: u8 = 0b0000_0001;

const STAT_BOOSTER_ON: u8 = 0b0000_0100;
const STAT_FOLLOWER_ON: u8 = 0b0000_1000;
const STAT_V0_AMPLIFIED_RATIO: u8 = 0b0000_0101;

/// Highest contrast value the chip accepts.
pub const MAX_CONTRAST: u8 = 0x3F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
/// The instruction table an instruction is decoded in.
pub enum InstructionTable {
    /// Table 0: clear, home, entry mode, display mode, cursor/display shift.
    Basic = 0,
    /// Table 1: bias, icon address, power/icon/contrast, follower, contrast.
    Extended = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
/// The bias value of the bias set instruction.
pub enum Bias {
    Bias0 = 0,
    Bias1 = 1,
}

/// ST7036 instructions, see data sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Select the instruction table for the next instruction.
    // translates to: 0b0011_1000 OR table bit OR double height bit
    FunctionSet {
        table: InstructionTable,
        double_height: bool,
    },

    /// Write spaces to the whole DDRAM and set the address to 0.
    // translates to: 0x01
    Clear,

    /// Set the DDRAM address to 0 and undo any display shift.
    // translates to: 0x02
    Home,

    /// Cursor move direction and display shift on write.
    // translates to: 0x04 OR I/D bit OR S bit
    EntryMode { increment: bool, shift: bool },

    /// Display, cursor and blink on/off.
    // translates to: 0x08 OR D, C, B bits
    DisplayMode {
        on: bool,
        cursor_visible: bool,
        cursor_blinking: bool,
    },

    /// LCD bias selection, fixed for 3 line modules.
    // translates to: 0b0001_0100 OR bias << 4 OR fixed bit
    SetBias(Bias),

    /// Lower four bits of the contrast.
    // translates to: 0x70 OR contrast & 0x0F
    ContrastLow(u8),

    /// Booster on and the upper two bits of the contrast.
    // translates to: 0x50 OR booster bit OR (contrast >> 4) & 0x03
    PowerIconContrastHigh(u8),

    /// Voltage follower on, V0 amplifier ratio.
    // translates to: 0x60 OR follower bit OR ratio
    FollowerControl,

    /// Move the cursor to a DDRAM address. Not range checked, like the chip.
    // translates to: 0x80 OR address
    DdramAddress(u8),
}

use Instruction::*;

impl Instruction {
    /// Returns the instruction as the byte to send with RS low.
    pub fn byte(self) -> u8 {
        match self {
            FunctionSet {
                table,
                double_height,
            } => {
                let mut val = CMD_FUNCTION_SET | table as u8;
                if double_height {
                    val |= STAT_DOUBLE_HEIGHT;
                }
                val
            }
            Clear => CMD_CLEAR,
            Home => CMD_HOME,
            EntryMode { increment, shift } => {
                let mut val = CMD_ENTRY_MODE;
                if increment {
                    val |= STAT_CURSOR_INCREMENT;
                }
                if shift {
                    val |= STAT_SHIFT_DISPLAY;
                }
                val
            }
            DisplayMode {
                on,
                cursor_visible,
                cursor_blinking,
            } => {
                let mut val = CMD_DISPLAY_MODE;
                if on {
                    val |= STAT_DISPLAY_ON;
                }
                if cursor_visible {
                    val |= STAT_CURSOR_VISIBLE;
                }
                if cursor_blinking {
                    val |= STAT_CURSOR_BLINKING;
                }
                val
            }
            SetBias(bias) => CMD_BIAS | ((bias as u8) << 4) | STAT_BIAS_FIXED,
            ContrastLow(contrast) => CMD_CONTRAST_LOW | (contrast & 0b0000_1111),
            PowerIconContrastHigh(contrast) => {
                CMD_POWER_ICON_CONTRAST_HIGH | STAT_BOOSTER_ON | ((contrast >> 4) & 0b0000_0011)
            }
            FollowerControl => CMD_FOLLOWER_CONTROL | STAT_FOLLOWER_ON | STAT_V0_AMPLIFIED_RATIO,
            DdramAddress(address) => CMD_DDRAM_ADDRESS | address,
        }
    }

    /// The instruction table this instruction has to be sent in.
    pub fn table(&self) -> InstructionTable {
        match self {
            SetBias(_) | ContrastLow(_) | PowerIconContrastHigh(_) | FollowerControl => {
                InstructionTable::Extended
            }
            FunctionSet { .. }
            | Clear
            | Home
            | EntryMode { .. }
            | DisplayMode { .. }
            | DdramAddress(_) => InstructionTable::Basic,
        }
    }
}

/// The two instructions setting `contrast`, low part first.
///
/// Fails for anything above [`MAX_CONTRAST`].
pub fn contrast(contrast: u8) -> Result<[Instruction; 2], Error> {
    if contrast > MAX_CONTRAST {
        return Err(Error::InvalidArgument {
            name: "contrast",
            value: contrast.into(),
            max: MAX_CONTRAST.into(),
        });
    }
    Ok([ContrastLow(contrast), PowerIconContrastHigh(contrast)])
}

/// The instruction moving the cursor to column `x` of row `y`.
///
/// Positions outside the display are passed on as they are; the chip decides what happens.
pub fn cursor(x: u8, y: u8) -> Instruction {
    DdramAddress(y.wrapping_mul(COLUMNS).wrapping_add(x))
}

/// A prelude for convenience, it pulls all enums into scope.
pub mod prelude {
    pub use super::{Bias, Instruction, Instruction::*, InstructionTable};
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn function_set() {
        let basic = FunctionSet {
            table: InstructionTable::Basic,
            double_height: false,
        };
        let extended = FunctionSet {
            table: InstructionTable::Extended,
            double_height: false,
        };
        let extended_double = FunctionSet {
            table: InstructionTable::Extended,
            double_height: true,
        };
        assert_eq!(basic.byte(), 0x38);
        assert_eq!(extended.byte(), 0x39);
        assert_eq!(extended_double.byte(), 0x3D);
    }

    #[test]
    fn basic_commands() {
        assert_eq!(Clear.byte(), 0x01);
        assert_eq!(Home.byte(), 0x02);
        assert_eq!(
            EntryMode {
                increment: true,
                shift: false
            }
            .byte(),
            0x06
        );
        assert_eq!(
            EntryMode {
                increment: false,
                shift: true
            }
            .byte(),
            0x05
        );
        assert_eq!(
            DisplayMode {
                on: true,
                cursor_visible: true,
                cursor_blinking: true
            }
            .byte(),
            0x0F
        );
        assert_eq!(
            DisplayMode {
                on: true,
                cursor_visible: false,
                cursor_blinking: false
            }
            .byte(),
            0x0C
        );
    }

    #[test]
    fn extended_commands() {
        assert_eq!(SetBias(Bias::Bias1).byte(), 0x15);
        assert_eq!(FollowerControl.byte(), 0x6D);
        let [low, high] = contrast(20).unwrap();
        assert_eq!(low.byte(), 0x74);
        assert_eq!(high.byte(), 0x55);
    }

    #[test]
    fn tables() {
        assert_eq!(Clear.table(), InstructionTable::Basic);
        assert_eq!(cursor(3, 1).table(), InstructionTable::Basic);
        assert_eq!(SetBias(Bias::Bias0).table(), InstructionTable::Extended);
        assert_eq!(FollowerControl.table(), InstructionTable::Extended);
        for instruction in contrast(63).unwrap().iter() {
            assert_eq!(instruction.table(), InstructionTable::Extended);
        }
    }

    #[test]
    fn contrast_out_of_range() {
        assert!(matches!(
            contrast(64),
            Err(Error::InvalidArgument {
                name: "contrast",
                value: 64,
                max: 63
            })
        ));
        assert!(contrast(255).is_err());
    }

    #[test]
    fn cursor_beyond_the_display_is_not_checked() {
        assert_eq!(cursor(0, 3).byte(), 0x80 | 48);
        assert_eq!(cursor(20, 0).byte(), 0x80 | 20);
    }

    proptest! {
        #[test]
        fn contrast_is_split_over_both_bytes(c in 0u8..=63) {
            let [low, high] = contrast(c).unwrap();
            prop_assert_eq!(low.byte() & 0x0F, c & 0x0F);
            prop_assert_eq!(low.byte() & 0xF0, CMD_CONTRAST_LOW);
            prop_assert_eq!(high.byte() & 0x03, (c >> 4) & 0x03);
            prop_assert_eq!(high.byte() & 0xFC, CMD_POWER_ICON_CONTRAST_HIGH | STAT_BOOSTER_ON);
        }

        #[test]
        fn contrast_above_63_is_rejected(c in 64u8..) {
            prop_assert!(contrast(c).is_err());
        }

        #[test]
        fn cursor_is_linear_ddram_address(x in 0u8..16, y in 0u8..8) {
            let byte = cursor(x, y).byte();
            prop_assert_eq!(byte, 0x80 | (y * 16 + x));
            prop_assert!(byte & 0x80 != 0);
        }
    }
}
