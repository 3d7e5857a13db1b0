//! Shortest-path planning on the ring of channels.
//!
//! Channels `0..=max` form a ring: increasing past `max` wraps to 0 and
//! decreasing below 0 wraps to `max`. [`plan`] picks the direction that needs
//! fewer presses. When both directions need the same number of presses (an
//! even channel count with the target exactly opposite) it always picks
//! [`StepDirection::Increase`].
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::planner::{plan, Plan};
//! use rs_aluprof::traits::StepDirection;
//!
//! // 15 -> 1 wraps through 0: two presses up instead of fourteen down.
//! assert_eq!(
//!     plan(15, 1, 15).unwrap(),
//!     Plan::Move { direction: StepDirection::Increase, steps: 2 }
//! );
//!
//! assert_eq!(plan(4, 4, 15).unwrap(), Plan::AtTarget);
//! ```

use crate::error::RemoteError;
use crate::traits::StepDirection;

/// Result of planning a move between two channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plan {
    /// Already on the target; no presses needed.
    AtTarget,
    /// Press the `direction` button `steps` times.
    Move {
        /// Which channel button to press.
        direction: StepDirection,
        /// How many presses (always at least 1).
        steps: u8,
    },
}

impl Plan {
    /// Number of presses this plan needs.
    #[inline]
    pub fn steps(&self) -> u8 {
        match self {
            Plan::AtTarget => 0,
            Plan::Move { steps, .. } => *steps,
        }
    }

    /// Direction of travel, or `None` when already at the target.
    #[inline]
    pub fn direction(&self) -> Option<StepDirection> {
        match self {
            Plan::AtTarget => None,
            Plan::Move { direction, .. } => Some(*direction),
        }
    }
}

/// Plan the presses that take the remote from `current` to `target`.
///
/// Both values must lie in `0..=max`; anything else is rejected with
/// [`RemoteError::ChannelOutOfRange`] before any distance is computed.
pub fn plan(current: u8, target: u8, max: u8) -> Result<Plan, RemoteError> {
    for value in [target, current] {
        if value > max {
            return Err(RemoteError::ChannelOutOfRange {
                value: i64::from(value),
                max,
            });
        }
    }

    if current == target {
        return Ok(Plan::AtTarget);
    }

    let ring = u16::from(max) + 1;
    let (current, target) = (u16::from(current), u16::from(target));
    let forward = (target + ring - current) % ring;
    let backward = (current + ring - target) % ring;

    // Both distances are below `ring`, which fits in a u8 when max < 255.
    let (direction, steps) = if forward <= backward {
        (StepDirection::Increase, forward)
    } else {
        (StepDirection::Decrease, backward)
    };

    Ok(Plan::Move {
        direction,
        steps: steps as u8,
    })
}
