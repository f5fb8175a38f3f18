//! Discrete trading actions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::env::EnvError;

/// One of the three discrete choices available each step.
///
/// The numeric codes are part of the external contract: learning algorithms
/// emit `0`, `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Hold = 0,
    Buy = 1,
    Sell = 2,
}

impl Action {
    /// All actions in code order.
    pub const ALL: [Action; 3] = [Action::Hold, Action::Buy, Action::Sell];

    /// Size of the action space.
    pub const COUNT: usize = 3;

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for Action {
    type Error = EnvError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Action::Hold),
            1 => Ok(Action::Buy),
            2 => Ok(Action::Sell),
            other => Err(EnvError::InvalidAction(other)),
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = EnvError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Action::try_from(i64::from(code))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Hold => "HOLD",
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        };
        f.write_str(s)
    }
}
