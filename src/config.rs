//! Configuration for the remote controller, the state file and the web server.
//!
//! Every struct has sensible defaults matching the reference wiring (16
//! channels, active-low relay board) and builder-style `with_*` setters. A
//! JSON config file may override any subset of fields.
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::config::{Config, RemoteConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.remote.max_channel, 15);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_remote(RemoteConfig::default().with_max_channel(7))
//!     .with_web(WebConfig::default().with_port(3000));
//! assert_eq!(config.web.port, 3000);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::traits::Button;

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote timing, channel range and button table
    pub remote: RemoteConfig,
    /// Channel state file
    pub storage: StorageConfig,
    /// Web server configuration
    pub web: WebConfig,
}

impl Config {
    /// Set remote configuration
    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = remote;
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Parse a configuration from JSON text.
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.max_channel == u8::MAX {
            return Err(ConfigError::Invalid(
                "remote.max_channel must be below 255".into(),
            ));
        }
        if self.remote.sleep_threshold_ms > self.remote.sleep_delay_ms {
            return Err(ConfigError::Invalid(
                "remote.sleep_threshold_ms must not exceed remote.sleep_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Remote Config
// ============================================================================

/// Channel range, sleep inference constants and press timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Highest channel number; channels are `0..=max_channel`
    pub max_channel: u8,
    /// Idle time after which the remote powers down (milliseconds)
    pub sleep_delay_ms: u64,
    /// Uncertainty margin around `sleep_delay_ms` (milliseconds)
    pub sleep_threshold_ms: u64,
    /// Stabilization wait after a wake press (milliseconds)
    pub wake_delay_ms: u64,
    /// Longest accepted `DELAY` command (milliseconds)
    pub max_wait_ms: u64,
    /// How long every output is asserted during a reset (milliseconds)
    pub reset_pulse_ms: u64,
    /// Button pressed to wake a sleeping remote
    pub wake_button: Button,
    /// Relay polarity: `true` if a high output closes the relay
    pub active_high: bool,
    /// GPIO character device the relay pins live on
    pub gpio_chip: PathBuf,
    /// Per-button pin and timing table
    pub buttons: ButtonTable,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            max_channel: 15,
            sleep_delay_ms: 8_000,
            sleep_threshold_ms: 1_000,
            wake_delay_ms: 500,
            max_wait_ms: 60_000,
            reset_pulse_ms: 300,
            wake_button: Button::Increase,
            active_high: false,
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            buttons: ButtonTable::default(),
        }
    }
}

impl RemoteConfig {
    /// Set the highest channel number
    pub fn with_max_channel(mut self, max: u8) -> Self {
        self.max_channel = max;
        self
    }

    /// Set the sleep delay and its uncertainty threshold
    pub fn with_sleep(mut self, delay_ms: u64, threshold_ms: u64) -> Self {
        self.sleep_delay_ms = delay_ms;
        self.sleep_threshold_ms = threshold_ms;
        self
    }

    /// Set the post-wake stabilization wait
    pub fn with_wake_delay_ms(mut self, ms: u64) -> Self {
        self.wake_delay_ms = ms;
        self
    }

    /// Set the button used for wake presses
    pub fn with_wake_button(mut self, button: Button) -> Self {
        self.wake_button = button;
        self
    }

    /// Set the longest accepted delay command
    pub fn with_max_wait_ms(mut self, ms: u64) -> Self {
        self.max_wait_ms = ms;
        self
    }

    /// Set the reset pulse length
    pub fn with_reset_pulse_ms(mut self, ms: u64) -> Self {
        self.reset_pulse_ms = ms;
        self
    }

    /// Set the relay polarity
    pub fn with_active_high(mut self, active_high: bool) -> Self {
        self.active_high = active_high;
        self
    }

    /// Set the GPIO character device
    pub fn with_gpio_chip(mut self, path: impl Into<PathBuf>) -> Self {
        self.gpio_chip = path.into();
        self
    }

    /// Set the button table
    pub fn with_buttons(mut self, buttons: ButtonTable) -> Self {
        self.buttons = buttons;
        self
    }

    /// Number of channels on the ring (`max_channel + 1`)
    #[inline]
    pub fn channel_count(&self) -> u16 {
        u16::from(self.max_channel) + 1
    }
}

// ============================================================================
// Button Table
// ============================================================================

/// Pin assignment and timing for one button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// BCM pin number wired to the relay input
    pub pin: u8,
    /// How long the relay is held closed (milliseconds)
    pub hold_ms: u64,
    /// Wait after release before the next press (milliseconds)
    #[serde(default = "default_release_ms")]
    pub release_ms: u64,
}

fn default_release_ms() -> u64 {
    100
}

impl ButtonConfig {
    /// Create a button entry with the default release delay.
    pub const fn new(pin: u8, hold_ms: u64) -> Self {
        Self {
            pin,
            hold_ms,
            release_ms: 100,
        }
    }

    /// Set the release delay
    pub fn with_release_ms(mut self, ms: u64) -> Self {
        self.release_ms = ms;
        self
    }
}

/// Pin and timing table keyed by logical button.
///
/// Channel buttons use short taps; movement buttons need a longer hold to
/// register on the remote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonTable {
    /// `DECREASE` (previous channel)
    pub decrease: ButtonConfig,
    /// `INCREASE` (next channel)
    pub increase: ButtonConfig,
    /// `MOVE_UP`
    pub move_up: ButtonConfig,
    /// `STOP`
    pub stop: ButtonConfig,
    /// `GO_DOWN`
    pub go_down: ButtonConfig,
}

impl Default for ButtonTable {
    fn default() -> Self {
        Self {
            decrease: ButtonConfig::new(2, 100),
            increase: ButtonConfig::new(14, 100),
            move_up: ButtonConfig::new(3, 300),
            stop: ButtonConfig::new(4, 300),
            go_down: ButtonConfig::new(15, 300),
        }
    }
}

impl ButtonTable {
    /// Look up the entry for `button`
    pub fn get(&self, button: Button) -> &ButtonConfig {
        match button {
            Button::Decrease => &self.decrease,
            Button::Increase => &self.increase,
            Button::MoveUp => &self.move_up,
            Button::Stop => &self.stop,
            Button::GoDown => &self.go_down,
        }
    }

    /// Replace the entry for `button`
    pub fn with(mut self, button: Button, entry: ButtonConfig) -> Self {
        match button {
            Button::Decrease => self.decrease = entry,
            Button::Increase => self.increase = entry,
            Button::MoveUp => self.move_up = entry,
            Button::Stop => self.stop = entry,
            Button::GoDown => self.go_down = entry,
        }
        self
    }
}

// ============================================================================
// Storage Config
// ============================================================================

/// Channel state file configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON state file
    pub state_file: PathBuf,
    /// Whether the channel is persisted at all
    pub enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("storage/display_state.json"),
            enabled: true,
        }
    }
}

impl StorageConfig {
    /// Set the state file path
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    /// Enable or disable persistence
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            cors_permissive: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
