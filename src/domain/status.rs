use crate::error::LoanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a loan request.
///
/// `Pending` is the only initial state and the only state a transition may
/// leave; `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub const fn id(self) -> u8 {
        match self {
            Self::Pending => 1,
            Self::Approved => 2,
            Self::Rejected => 3,
        }
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Approved),
            3 => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Human-readable label carried in outbound notifications.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pending => "Pending review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Only `Approved` and `Rejected` may be requested as a new status.
    pub fn ensure_target(self) -> Result<Self, LoanError> {
        if self.is_terminal() {
            Ok(self)
        } else {
            Err(LoanError::InvalidStatus(format!(
                "{self:?} is not a valid target status"
            )))
        }
    }

    /// Checks the `Pending -> Approved | Rejected` state machine.
    pub fn transition_to(self, target: Self) -> Result<Self, LoanError> {
        let target = target.ensure_target()?;
        if self != Self::Pending {
            return Err(LoanError::InvalidTransition {
                from: self,
                to: target,
            });
        }
        Ok(target)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Parses the numeric id text used by external notifications (`"1"`, `"2"`, `"3"`).
impl FromStr for Status {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_id)
            .ok_or_else(|| LoanError::InvalidStatus(format!("unknown status id '{s}'")))
    }
}
