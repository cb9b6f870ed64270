//! Refresh interval field.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("The refresh interval must be between 3 and 20 seconds")]
    OutOfRange { input: String },
}

/// Whole seconds in `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshInterval(u64);

impl RefreshInterval {
    pub const MIN: u64 = 3;
    pub const MAX: u64 = 20;
    pub const DEFAULT: RefreshInterval = RefreshInterval(5);

    pub fn new(seconds: u64) -> Result<Self, IntervalError> {
        if (Self::MIN..=Self::MAX).contains(&seconds) {
            Ok(Self(seconds))
        } else {
            Err(IntervalError::OutOfRange {
                input: seconds.to_string(),
            })
        }
    }

    /// Parse user input. Fractions, signs and blanks are rejected.
    pub fn parse(input: &str) -> Result<Self, IntervalError> {
        let trimmed = input.trim();
        let out_of_range = || IntervalError::OutOfRange {
            input: trimmed.to_string(),
        };
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(out_of_range());
        }
        let seconds: u64 = trimmed.parse().map_err(|_| out_of_range())?;
        Self::new(seconds).map_err(|_| out_of_range())
    }

    pub fn seconds(self) -> u64 {
        self.0
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
