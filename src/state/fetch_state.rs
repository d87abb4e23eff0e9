/// Fetch state definitions for the transport retry loop
///
/// A fetch starts `Idle`, alternates between `Fetching` and `Retrying` while
/// transient failures occur, and ends in exactly one terminal state.
use crate::FetchFailure;
use std::fmt;

/// Represents the current state of one URL fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    // ===== Active States =====
    /// No request has been issued yet
    Idle,

    /// Attempt number `attempt` (1-based) is about to be sent
    Fetching { attempt: u32 },

    /// Attempt `attempt` failed transiently and another one is allowed
    Retrying { attempt: u32, cause: FetchFailure },

    // ===== Terminal States =====
    /// The body was received on attempt `attempts`
    Succeeded { attempts: u32, body: String },

    /// No further attempt will be made
    Failed { attempts: u32, cause: FetchFailure },
}

impl FetchState {
    /// Computes the state that follows a finished attempt
    ///
    /// # Arguments
    ///
    /// * `attempt` - The 1-based number of the attempt that just finished
    /// * `outcome` - The body or the failure cause of that attempt
    /// * `max_attempts` - The total attempt budget
    pub fn after_attempt(
        attempt: u32,
        outcome: Result<String, FetchFailure>,
        max_attempts: u32,
    ) -> Self {
        match outcome {
            Ok(body) => Self::Succeeded {
                attempts: attempt,
                body,
            },
            Err(cause) if cause.is_retryable() && attempt < max_attempts => {
                Self::Retrying { attempt, cause }
            }
            Err(cause) => Self::Failed {
                attempts: attempt,
                cause,
            },
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching { attempt } => write!(f, "fetching (attempt {})", attempt),
            Self::Retrying { attempt, cause } => {
                write!(f, "retrying after attempt {}: {}", attempt, cause)
            }
            Self::Failed { attempts, cause } => {
                write!(f, "failed after {} attempt(s): {}", attempts, cause)
            }
            Self::Succeeded { attempts, .. } => {
                write!(f, "succeeded on attempt {}", attempts)
            }
            Self::Idle => write!(f, "idle"),
        }
    }
}
