//! Client-facing errors.

use crate::collab::CollabError;
use crate::session::SubmitError;

/// Errors surfaced by [`GameClient`](super::GameClient) and
/// [`SessionHandle`](super::SessionHandle).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// A collaborator failed.
    #[error(transparent)]
    Collab(#[from] CollabError),

    /// The local move was refused before reaching the log.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// No game has been started.
    #[error("no game in progress")]
    NoSession,

    /// The session task stopped before the awaited state was reached.
    #[error("session ended")]
    Cancelled,
}
