//! Error types for the remote controller.

use crate::traits::Button;

/// Errors returned by [`RemoteController`](crate::RemoteController) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// A channel value was outside `0..=max`.
    #[error("Value {value} out of range (0-{max})")]
    ChannelOutOfRange {
        /// The rejected value.
        value: i64,
        /// Highest valid channel.
        max: u8,
    },

    /// A button id did not name any known button.
    #[error("Unknown button: {0}")]
    UnknownButton(String),

    /// The relay driver failed while pressing a button.
    #[error("Failed to press {button}: {message}")]
    Driver {
        /// The button being pressed.
        button: Button,
        /// Driver error text.
        message: String,
    },

    /// Driving every output back to its released level failed.
    #[error("Failed to release outputs: {0}")]
    Release(String),
}

/// Validation errors for a single batch item.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// The item lacks `nr` or `action`.
    #[error("Each command must include both 'nr' and 'action'.")]
    MissingField,

    /// The item is not a JSON object.
    #[error("Each command must be a JSON object.")]
    NotAnObject,

    /// `nr` is not an integer in range.
    #[error("'nr' must be an integer (0-{max}).")]
    InvalidTarget {
        /// Highest valid channel.
        max: u8,
    },

    /// `action` is not one of the known tags.
    #[error("Invalid action: {action}. Valid actions: [UP, DOWN, STOP, DELAY]")]
    UnknownAction {
        /// The rejected action text.
        action: String,
    },

    /// `DELAY` without a usable `duration`.
    #[error("DELAY action requires a non-negative numeric 'duration' field (seconds).")]
    InvalidDuration,

    /// `DELAY` longer than the configured bound.
    #[error("DELAY duration {seconds}s exceeds the maximum of {max_seconds}s.")]
    DurationTooLong {
        /// Requested duration in seconds.
        seconds: f64,
        /// Configured maximum in seconds.
        max_seconds: f64,
    },
}

/// State file errors. Logged and swallowed by the channel store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the state file failed.
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file did not contain valid JSON.
    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the config file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The config parsed but describes an unusable setup.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message() {
        let err = RemoteError::ChannelOutOfRange { value: 16, max: 15 };
        assert_eq!(err.to_string(), "Value 16 out of range (0-15)");
    }

    #[test]
    fn driver_error_names_button() {
        let err = RemoteError::Driver {
            button: Button::GoDown,
            message: "relay stuck".into(),
        };
        assert_eq!(err.to_string(), "Failed to press GO_DOWN: relay stuck");
    }

    #[test]
    fn command_error_messages() {
        assert_eq!(
            CommandError::InvalidTarget { max: 15 }.to_string(),
            "'nr' must be an integer (0-15)."
        );
        assert!(CommandError::UnknownAction {
            action: "JUMP".into()
        }
        .to_string()
        .starts_with("Invalid action: JUMP"));
    }
}
