//! Batch command parsing and result records.
//!
//! A batch is a JSON array of loosely-typed items. Each item is validated on
//! its own into a [`Command`]; a bad item becomes an error result and the
//! rest of the batch still runs.
//!
//! # Example
//!
//! ```
//! use rs_aluprof::messages::{Action, Command};
//! use serde_json::json;
//!
//! let cmd = Command::parse(&json!({"nr": 3, "action": "up"}), 15, 60_000).unwrap();
//! assert_eq!(cmd.target, 3);
//! assert_eq!(cmd.action, Action::Up);
//!
//! let cmd = Command::parse(&json!({"nr": 3, "action": "DELAY", "duration": 1.5}), 15, 60_000).unwrap();
//! assert_eq!(cmd.action, Action::Delay { ms: 1_500 });
//!
//! assert!(Command::parse(&json!({"nr": 3}), 15, 60_000).is_err());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;
use crate::traits::{Button, StepDirection};

// ============================================================================
// Commands
// ============================================================================

/// What to do once the target channel is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Press `MOVE_UP`.
    Up,
    /// Press `GO_DOWN`.
    Down,
    /// Press `STOP`.
    Stop,
    /// Wait, pressing nothing.
    Delay {
        /// Wait length in milliseconds.
        ms: u64,
    },
}

impl Action {
    /// Names accepted in the `action` field.
    pub const NAMES: [&'static str; 4] = ["UP", "DOWN", "STOP", "DELAY"];

    /// Upper-case action name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Stop => "STOP",
            Action::Delay { .. } => "DELAY",
        }
    }

    /// The button this action presses, if any.
    pub const fn button(&self) -> Option<Button> {
        match self {
            Action::Up => Some(Button::MoveUp),
            Action::Down => Some(Button::GoDown),
            Action::Stop => Some(Button::Stop),
            Action::Delay { .. } => None,
        }
    }
}

/// One validated batch item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// Channel to select first.
    pub target: u8,
    /// Terminal action.
    pub action: Action,
    /// `DELAY` duration as given, in seconds.
    pub duration_secs: Option<f64>,
}

impl Command {
    /// Validate a raw batch item.
    ///
    /// `nr` must be an integer in `0..=max`. `action` is matched
    /// case-insensitively. `DELAY` additionally needs a finite, non-negative
    /// `duration` in seconds no longer than `max_wait_ms`.
    pub fn parse(item: &Value, max: u8, max_wait_ms: u64) -> Result<Self, CommandError> {
        let obj = item.as_object().ok_or(CommandError::NotAnObject)?;
        let (Some(nr), Some(action)) = (obj.get("nr"), obj.get("action")) else {
            return Err(CommandError::MissingField);
        };

        let target = nr
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .filter(|v| *v <= max)
            .ok_or(CommandError::InvalidTarget { max })?;

        let name = match action {
            Value::String(s) => s.trim().to_ascii_uppercase(),
            other => other.to_string(),
        };

        let action = match name.as_str() {
            "UP" => Action::Up,
            "DOWN" => Action::Down,
            "STOP" => Action::Stop,
            "DELAY" => {
                let seconds = obj
                    .get("duration")
                    .and_then(Value::as_f64)
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .ok_or(CommandError::InvalidDuration)?;
                let max_seconds = max_wait_ms as f64 / 1000.0;
                if seconds > max_seconds {
                    return Err(CommandError::DurationTooLong {
                        seconds,
                        max_seconds,
                    });
                }
                return Ok(Self {
                    target,
                    action: Action::Delay {
                        ms: (seconds * 1000.0).round() as u64,
                    },
                    duration_secs: Some(seconds),
                });
            }
            _ => return Err(CommandError::UnknownAction { action: name }),
        };

        Ok(Self {
            target,
            action,
            duration_secs: None,
        })
    }
}

// ============================================================================
// Results
// ============================================================================

/// How the target channel was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GotoDetails {
    /// No presses were needed.
    AlreadyAtTarget {
        /// Channel after navigation.
        final_value: u8,
        /// Always 0.
        steps_taken: u8,
    },
    /// Channel buttons were pressed.
    MovedToTarget {
        /// Channel before navigation.
        initial_value: u8,
        /// Channel after navigation.
        final_value: u8,
        /// Presses that succeeded.
        steps_taken: u8,
        /// Which button was used.
        direction: StepDirection,
    },
}

impl GotoDetails {
    /// Channel after navigation.
    pub fn final_value(&self) -> u8 {
        match self {
            GotoDetails::AlreadyAtTarget { final_value, .. }
            | GotoDetails::MovedToTarget { final_value, .. } => *final_value,
        }
    }

    /// Presses that succeeded.
    pub fn steps_taken(&self) -> u8 {
        match self {
            GotoDetails::AlreadyAtTarget { .. } => 0,
            GotoDetails::MovedToTarget { steps_taken, .. } => *steps_taken,
        }
    }
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    /// Navigation followed by a button press.
    SequencedCommand {
        /// Requested channel.
        target_nr: u8,
        /// Action name.
        action: String,
        /// Navigation summary.
        goto_details: GotoDetails,
        /// Channel after the item.
        final_value: u8,
    },
    /// Navigation followed by a wait.
    DelayCommand {
        /// Requested channel.
        target_nr: u8,
        /// Always `DELAY`.
        action: String,
        /// Wait length in seconds.
        duration: f64,
        /// Navigation summary.
        goto_details: GotoDetails,
        /// Channel after the item.
        final_value: u8,
    },
    /// The item was rejected or a press failed.
    Error {
        /// Human-readable reason.
        details: String,
        /// Requested channel, when the item got that far.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_nr: Option<u8>,
        /// Channel after the failure, when any press was attempted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_value: Option<u8>,
    },
}

impl CommandResult {
    /// Error result for an item that failed validation.
    pub fn rejected(err: &CommandError) -> Self {
        CommandResult::Error {
            details: err.to_string(),
            target_nr: None,
            final_value: None,
        }
    }

    /// Whether this is an error result.
    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Error { .. })
    }
}

/// Everything a batch produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One result per item, in order.
    pub results: Vec<CommandResult>,
    /// Channel once the batch finished.
    pub current_state: u8,
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Channel the remote is actually on.
    pub value: i64,
}

// ============================================================================
// Tests
// ============================================================================
