//! Turn and session control.
//!
//! A [`Session`] is one game seen from one client: the canonical board in
//! local perspective, the side on turn, the phase and the replay
//! watermark. The reducer in `sync` is the only thing that advances it.

pub mod turn;
pub mod state;
pub mod message;
pub mod snapshot;

pub use turn::{next_turn, GameRole};
pub use state::{AppliedMove, Phase, Session, SubmitError};
pub use message::{PlayerNames, StatusMessage};
pub use snapshot::{SessionSnapshot, SnapshotError};
