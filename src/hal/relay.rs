//! Relay board driver over `embedded-hal` output pins.
//!
//! Each remote button is wired through one relay channel. Most cheap relay
//! boards are active-low: driving the input low closes the contact. The
//! bank hides that polarity behind [`ButtonDriver::set_pressed`].
//!
//! Any `embedded_hal::digital::OutputPin` works, so the same driver serves a
//! Raspberry Pi GPIO crate, a port expander, or a test pin.

use embedded_hal::digital::{Error as _, ErrorKind, OutputPin};

use crate::config::ButtonTable;
use crate::traits::{Button, ButtonDriver};

/// Errors from [`RelayBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// No pin was registered for the button.
    #[error("no relay wired for {0}")]
    Unmapped(Button),

    /// The output pin rejected the level change.
    #[error("relay pin for {button} failed: {kind:?}")]
    Pin {
        /// Button whose pin failed.
        button: Button,
        /// Error class reported by the pin.
        kind: ErrorKind,
    },
}

/// Set of relay outputs, one per button.
///
/// # Example
///
/// ```rust
/// use core::convert::Infallible;
/// use embedded_hal::digital::{ErrorType, OutputPin};
/// use rs_aluprof::hal::RelayBank;
/// use rs_aluprof::traits::{Button, ButtonDriver};
///
/// #[derive(Default)]
/// struct Pin(bool);
/// impl ErrorType for Pin { type Error = Infallible; }
/// impl OutputPin for Pin {
///     fn set_low(&mut self) -> Result<(), Infallible> { self.0 = false; Ok(()) }
///     fn set_high(&mut self) -> Result<(), Infallible> { self.0 = true; Ok(()) }
/// }
///
/// let mut bank = RelayBank::new(false).with_pin(Button::Stop, Pin::default());
/// bank.set_pressed(Button::Stop, true).unwrap();
/// assert!(!bank.pin(Button::Stop).unwrap().0); // active-low
/// ```
#[derive(Debug)]
pub struct RelayBank<P> {
    pins: Vec<(Button, P)>,
    active_high: bool,
}

impl<P: OutputPin> RelayBank<P> {
    /// Creates an empty bank. `active_high` selects the pressed level.
    pub fn new(active_high: bool) -> Self {
        Self {
            pins: Vec::with_capacity(Button::ALL.len()),
            active_high,
        }
    }

    /// Build a full bank from the configured pin table.
    ///
    /// `open` is called with each button and its configured pin number, in
    /// [`Button::ALL`] order. The first failure is returned and the pins
    /// opened so far are dropped.
    pub fn from_table<E>(
        buttons: &ButtonTable,
        active_high: bool,
        mut open: impl FnMut(Button, u8) -> Result<P, E>,
    ) -> Result<Self, E> {
        Button::ALL
            .into_iter()
            .try_fold(Self::new(active_high), |bank, button| {
                let pin = open(button, buttons.get(button).pin)?;
                Ok(bank.with_pin(button, pin))
            })
    }

    /// Register the pin for `button`, replacing any earlier one.
    pub fn with_pin(mut self, button: Button, pin: P) -> Self {
        self.pins.retain(|(b, _)| *b != button);
        self.pins.push((button, pin));
        self
    }

    /// The pin wired to `button`.
    pub fn pin(&self, button: Button) -> Option<&P> {
        self.pins.iter().find(|(b, _)| *b == button).map(|(_, p)| p)
    }

    /// Buttons without a pin.
    pub fn unmapped(&self) -> Vec<Button> {
        Button::ALL
            .into_iter()
            .filter(|b| self.pin(*b).is_none())
            .collect()
    }
}

impl<P: OutputPin> ButtonDriver for RelayBank<P> {
    type Error = RelayError;

    fn set_pressed(&mut self, button: Button, pressed: bool) -> Result<(), RelayError> {
        let pin = self
            .pins
            .iter_mut()
            .find(|(b, _)| *b == button)
            .map(|(_, p)| p)
            .ok_or(RelayError::Unmapped(button))?;

        let high = pressed == self.active_high;
        let result = if high { pin.set_high() } else { pin.set_low() };
        result.map_err(|e| RelayError::Pin {
            button,
            kind: e.kind(),
        })
    }
}
