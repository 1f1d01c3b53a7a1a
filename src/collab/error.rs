//! Collaborator failures.

use crate::sync::GameId;

/// A collaborator could not complete a request.
///
/// None of these reach the rules engine: the lobby turns them into status
/// indicators and the runner into a logged error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollabError {
    /// No identity has been established yet.
    #[error("not signed in")]
    NotSignedIn,

    /// The backing service refused or failed the request.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Failure detail.
        reason: String,
    },

    /// No game record exists under this identifier.
    #[error("unknown game {0}")]
    UnknownGame(GameId),
}

impl CollabError {
    /// Shorthand for [`CollabError::Unavailable`].
    pub fn unavailable(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            reason: reason.into(),
        }
    }
}
