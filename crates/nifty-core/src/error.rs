//! Error taxonomy for the Nifty toolkit

use core::fmt;

/// Result type for Nifty operations.
pub type NiftyResult<T> = Result<T, NiftyError>;

/// Errors surfaced synchronously from Nifty operations.
///
/// This mirrors the status codes a C implementation would return, but as
/// a proper enum: `INVALID_HANDLE`, `OUT_OF_MEMORY`, `SHUTDOWN`, `TIMEOUT`
/// all have a direct variant; `OK` is simply `Ok(..)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NiftyError {
    /// Handle is unknown, stale, or fails a class constraint.
    InvalidHandle,

    /// Allocation failed (handle table full, heap allocation failure).
    OutOfMemory,

    /// The container (queue/pool/scheduler) is no longer RUNNING.
    Shutdown,

    /// A bounded wait expired before the operation could complete.
    Timeout,

    /// `cast`/typed lookup found an object whose class does not match.
    WrongClass {
        expected: &'static str,
        found: String,
    },
}

impl fmt::Display for NiftyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NiftyError::InvalidHandle => write!(f, "invalid handle"),
            NiftyError::OutOfMemory => write!(f, "out of memory"),
            NiftyError::Shutdown => write!(f, "container is shut down"),
            NiftyError::Timeout => write!(f, "operation timed out"),
            NiftyError::WrongClass { expected, found } => {
                write!(f, "expected class prefix '{}', found '{}'", expected, found)
            }
        }
    }
}

impl std::error::Error for NiftyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_variant() {
        assert_eq!(format!("{}", NiftyError::Timeout), "operation timed out");
        assert_eq!(format!("{}", NiftyError::Shutdown), "container is shut down");
    }

    #[test]
    fn wrong_class_carries_context() {
        let e = NiftyError::WrongClass {
            expected: "core:queue",
            found: "core:task".to_string(),
        };
        assert!(format!("{}", e).contains("core:queue"));
        assert!(format!("{}", e).contains("core:task"));
    }
}
