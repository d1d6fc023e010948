//! # Linux backends
//!
//! Pins through the sysfs GPIO interface and the bus through spidev, both as re-exported by
//! `linux_embedded_hal`. [`init`] wires them up with the ST7036 settings.

use std::io;
use std::path::Path;

use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};
use linux_embedded_hal::sysfs_gpio;
use linux_embedded_hal::Delay;

use crate::bus::{Bus, BusConfig, BusController, BusError, ClockMode};
use crate::display::ST7036;
use crate::error::Error;
use crate::gpio::{Direction, Level, PinController, PinHandle};

/// The display as set up by [`init`].
pub type LinuxST7036 = ST7036<SpidevBus, PinHandle<SysfsGpio>, PinHandle<SysfsGpio>, Delay>;

/// Open `device`, reserve the RS and backlight pins by their sysfs number and initialize the
/// display.
///
/// A backlight pin that can't be reserved is not an error, see [`ST7036::init`].
pub fn init(device: &str, rs_pin: u32, light_pin: u32) -> Result<LinuxST7036, Error> {
    ST7036::init(
        &mut SpidevController,
        SysfsGpio,
        device,
        rs_pin,
        light_pin,
        Delay,
    )
}

fn io_error(e: sysfs_gpio::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

const SYSFS_GPIO: &str = "/sys/class/gpio";

// sysfs_gpio treats an exported pin as exported by us, so check first
fn ensure_unexported(root: &Path, pin: u32) -> io::Result<()> {
    if root.join(format!("gpio{}", pin)).exists() {
        return Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("gpio {} is already exported", pin),
        ));
    }
    Ok(())
}

/// Pins exported through `/sys/class/gpio`.
///
/// A pin which is exported already belongs to someone else and is refused, so it is never
/// unexported by this driver either.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsGpio;

impl PinController for SysfsGpio {
    fn reserve(&mut self, pin: u32) -> io::Result<()> {
        ensure_unexported(Path::new(SYSFS_GPIO), pin)?;
        sysfs_gpio::Pin::new(pin.into()).export().map_err(io_error)
    }

    fn set_direction(&mut self, pin: u32, direction: Direction) -> io::Result<()> {
        let direction = match direction {
            Direction::Input => sysfs_gpio::Direction::In,
            Direction::Output => sysfs_gpio::Direction::Out,
        };
        sysfs_gpio::Pin::new(pin.into())
            .set_direction(direction)
            .map_err(io_error)
    }

    fn set_level(&mut self, pin: u32, level: Level) -> io::Result<()> {
        let value = match level {
            Level::Low => 0,
            Level::High => 1,
        };
        sysfs_gpio::Pin::new(pin.into())
            .set_value(value)
            .map_err(io_error)
    }

    fn release(&mut self, pin: u32) -> io::Result<()> {
        sysfs_gpio::Pin::new(pin.into()).unexport().map_err(io_error)
    }
}

fn mode_flags(mode: ClockMode) -> SpiModeFlags {
    match mode {
        ClockMode::Mode0 => SpiModeFlags::SPI_MODE_0,
        ClockMode::Mode1 => SpiModeFlags::SPI_MODE_1,
        ClockMode::Mode2 => SpiModeFlags::SPI_MODE_2,
        ClockMode::Mode3 => SpiModeFlags::SPI_MODE_3,
    }
}

/// Opens `/dev/spidevB.C` devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpidevController;

impl SpidevController {
    fn configure(device: &str, config: &BusConfig) -> io::Result<Spidev> {
        let mut spi = Spidev::open(device)?;
        // one option per call, so they are applied in this order
        spi.configure(&SpidevOptions::new().mode(mode_flags(config.mode)).build())?;
        spi.configure(
            &SpidevOptions::new()
                .bits_per_word(config.bits_per_word)
                .build(),
        )?;
        spi.configure(&SpidevOptions::new().max_speed_hz(config.speed_hz).build())?;
        Ok(spi)
    }
}

impl BusController for SpidevController {
    type Bus = SpidevBus;

    fn open(&mut self, device: &str, config: &BusConfig) -> Result<SpidevBus, BusError> {
        let spi = Self::configure(device, config).map_err(|source| BusError::Open {
            device: device.to_string(),
            source,
        })?;
        log::debug!("opened {}", device);
        Ok(SpidevBus {
            spi: Some(spi),
            speed_hz: config.speed_hz,
            bits_per_word: config.bits_per_word,
        })
    }
}

/// An open spidev device. Closed on drop.
pub struct SpidevBus {
    spi: Option<Spidev>,
    speed_hz: u32,
    bits_per_word: u8,
}

impl Bus for SpidevBus {
    fn exchange(&mut self, tx: &[u8], delay_usecs: u16) -> Result<Vec<u8>, BusError> {
        let spi = self.spi.as_mut().ok_or_else(|| BusError::Transfer {
            source: io::Error::new(io::ErrorKind::NotConnected, "bus is closed"),
        })?;
        let mut rx = vec![0; tx.len()];
        {
            let mut transfer = SpidevTransfer::read_write(tx, &mut rx);
            transfer.speed_hz = self.speed_hz;
            transfer.bits_per_word = self.bits_per_word;
            transfer.delay_usecs = delay_usecs;
            spi.transfer(&mut transfer)
                .map_err(|source| BusError::Transfer { source })?;
        }
        Ok(rx)
    }

    fn close(&mut self) {
        if self.spi.take().is_some() {
            log::debug!("closed spi device");
        }
    }
}

impl Drop for SpidevBus {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn exported_pin_is_refused() {
        let root = std::env::temp_dir().join(format!("st7036-gpio-{}", std::process::id()));
        fs::create_dir_all(root.join("gpio129")).unwrap();

        let err = ensure_unexported(&root, 129).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        assert!(ensure_unexported(&root, 502).is_ok());
        // still there, nothing was unexported
        assert!(root.join("gpio129").is_dir());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn clock_modes() {
        assert_eq!(mode_flags(ClockMode::Mode0), SpiModeFlags::SPI_MODE_0);
        assert_eq!(mode_flags(ClockMode::Mode3), SpiModeFlags::SPI_MODE_3);
    }

    #[test]
    fn missing_device_is_an_open_error() {
        let result = SpidevController.open("/dev/spidev-does-not-exist", &BusConfig::ST7036);
        match result {
            Err(BusError::Open { device, .. }) => assert_eq!(device, "/dev/spidev-does-not-exist"),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("opened a device that does not exist"),
        }
    }

    #[test]
    fn missing_device_fails_init_as_resource() {
        match init("/dev/spidev-does-not-exist", 129, 502) {
            Err(e) => assert_eq!(e.kind(), crate::ErrorKind::Resource),
            Ok(_) => panic!("initialized a display without a bus"),
        }
    }
}
