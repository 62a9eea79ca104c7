//! Engine error type.

use thiserror::Error;

/// Errors raised by the engine, its local store and its backend clients.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The static rotation has no prompts to show.
    #[error("Playlist has no prompts")]
    EmptyPlaylist,

    /// The requested action does not apply in the current state.
    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("Checklist item {index} does not exist ({len} items)")]
    InvalidItem { index: usize, len: usize },

    #[error("Reflection needs at least {required} words, got {actual}")]
    ReflectionTooShort { required: usize, actual: usize },

    /// The current prompt has no server id, so it cannot be liked or synced.
    #[error("Prompt '{0}' has no server id")]
    UnsyncedPrompt(String),

    /// Non-success response from the Joy Nudge API.
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Local store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local store is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// True when a remote call failed, as opposed to a local misuse.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::Http(_))
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EngineError::InvalidState {
            action: "skip",
            state: "celebrating",
        };
        assert_eq!(err.to_string(), "Cannot skip while celebrating");

        let err = EngineError::Backend {
            status: 400,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "Backend returned 400: Unauthorized");
        assert!(err.is_remote());
        assert!(!EngineError::EmptyPlaylist.is_remote());
    }
}
