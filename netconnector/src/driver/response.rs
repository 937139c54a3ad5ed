//! Outcome of a capability call.

use crate::error::{DriverError, Result};

/// Result of a capability call that reached the device layer.
///
/// A missing command in the platform definition or a port the vendor rule
/// rejects are answers, not failures; neither touches the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Unsupported,
    InvalidPort,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Unsupported => Outcome::Unsupported,
            Outcome::InvalidPort => Outcome::InvalidPort,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }

    /// Fold the non-`Done` variants into errors.
    pub fn into_result(self, operation: &str, platform: &str, port: Option<&str>) -> Result<T> {
        match self {
            Outcome::Done(value) => Ok(value),
            Outcome::Unsupported => Err(DriverError::Unsupported {
                operation: operation.to_string(),
                platform: platform.to_string(),
            }
            .into()),
            Outcome::InvalidPort => Err(DriverError::InvalidPort {
                port: port.unwrap_or_default().to_string(),
            }
            .into()),
        }
    }
}
