//! Relay pins on a Linux GPIO character device (Raspberry Pi).
//!
//! Available with the `gpio` feature on Linux. Every configured BCM pin is
//! requested as an output that already sits at the released level, so
//! opening the bank never closes a relay.

use linux_embedded_hal::gpio_cdev::{errors::Error as CdevError, Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;

use crate::config::RemoteConfig;
use crate::traits::Button;

use super::relay::RelayBank;

/// Consumer label shown by `gpioinfo` for claimed lines.
const CONSUMER: &str = "rs-aluprof";

/// Relay bank over character-device GPIO lines.
pub type GpioRelays = RelayBank<CdevPin>;

/// Errors while claiming the relay pins.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// The GPIO chip could not be opened.
    #[error("cannot open GPIO chip {chip}: {source}")]
    Chip {
        /// Device path from the config.
        chip: String,
        /// Underlying error.
        #[source]
        source: CdevError,
    },

    /// A relay line could not be claimed as an output.
    #[error("cannot claim GPIO {pin} for {button}: {source}")]
    Line {
        /// Button the line drives.
        button: Button,
        /// Configured BCM pin.
        pin: u8,
        /// Underlying error.
        #[source]
        source: CdevError,
    },
}

/// Claim every relay pin in `config.buttons` on `config.gpio_chip`.
///
/// Lines are released when the bank is dropped.
pub fn open_relays(config: &RemoteConfig) -> Result<GpioRelays, GpioError> {
    let chip_path = config.gpio_chip.as_path();
    let mut chip = Chip::new(chip_path).map_err(|source| GpioError::Chip {
        chip: chip_path.display().to_string(),
        source,
    })?;
    let released = u8::from(!config.active_high);

    RelayBank::from_table(&config.buttons, config.active_high, |button, pin| {
        let line_err = |source| GpioError::Line {
            button,
            pin,
            source,
        };
        let handle = chip
            .get_line(u32::from(pin))
            .and_then(|line| line.request(LineRequestFlags::OUTPUT, released, CONSUMER))
            .map_err(line_err)?;
        tracing::debug!(%button, pin, "claimed relay line");
        CdevPin::new(handle).map_err(line_err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_chip_is_reported() {
        let config = RemoteConfig::default().with_gpio_chip("/dev/no-such-gpiochip");
        match open_relays(&config) {
            Err(GpioError::Chip { chip, .. }) => assert_eq!(chip, "/dev/no-such-gpiochip"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("opened a chip that does not exist"),
        }
    }
}
