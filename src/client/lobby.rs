//! Sign-in and challenge flow.
//!
//! Two users find each other by name: each registers the name they are
//! seeking on their own profile, and whoever challenges second finds the
//! first and creates the game record, becoming player 0. Both profiles
//! then carry the new `game-id`.
//!
//! Collaborator failures never escape as panics or engine errors; they
//! only move the status indicators.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::collab::{
    CollabError, GamePlayers, Identity, Matchmaker, ProfileStore, GAME_ID_KEY, SEEK_USERNAME_KEY,
    USERNAME_KEY,
};
use crate::session::PlayerNames;
use crate::sync::{GameId, Uid};

/// Sign-in indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignInStatus {
    /// No username stored yet, or the last write failed.
    #[default]
    Idle,
    /// A username is stored on the profile.
    Done,
}

/// Challenge indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChallengeStatus {
    /// No challenge registered.
    #[default]
    Idle,
    /// Challenge registered; waiting for the opponent to challenge back.
    Done,
    /// A game has been assigned.
    Matched,
    /// The named user is not seeking us (yet).
    NoOpponent,
    /// A collaborator failed while registering or matching.
    Failed,
}

/// Lobby state for one client.
pub struct Lobby {
    identity: Arc<dyn Identity>,
    profiles: Arc<dyn ProfileStore>,
    matchmaker: Arc<dyn Matchmaker>,
    uid: Option<Uid>,
    username: Option<String>,
    seek_username: Option<String>,
    game_id: Option<GameId>,
    sign_in: SignInStatus,
    challenge: ChallengeStatus,
}

impl Lobby {
    /// Lobby over the given collaborators. Nothing is contacted yet.
    pub fn new(
        identity: Arc<dyn Identity>,
        profiles: Arc<dyn ProfileStore>,
        matchmaker: Arc<dyn Matchmaker>,
    ) -> Self {
        Self {
            identity,
            profiles,
            matchmaker,
            uid: None,
            username: None,
            seek_username: None,
            game_id: None,
            sign_in: SignInStatus::Idle,
            challenge: ChallengeStatus::Idle,
        }
    }

    // === Accessors ===

    /// Signed-in identity.
    #[must_use]
    pub fn uid(&self) -> Option<&Uid> {
        self.uid.as_ref()
    }

    /// Stored display name.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Name last challenged (or loaded from the profile at sign-in).
    #[must_use]
    pub fn seek_username(&self) -> Option<&str> {
        self.seek_username.as_deref()
    }

    /// Game assigned to this client, if any.
    #[must_use]
    pub fn game_id(&self) -> Option<&GameId> {
        self.game_id.as_ref()
    }

    /// Sign-in indicator.
    #[must_use]
    pub fn sign_in_status(&self) -> SignInStatus {
        self.sign_in
    }

    /// Outcome of the last challenge.
    #[must_use]
    pub fn challenge_status(&self) -> ChallengeStatus {
        self.challenge
    }

    /// Names for status messages. Missing names are empty.
    #[must_use]
    pub fn player_names(&self) -> PlayerNames {
        PlayerNames::new(
            self.username.clone().unwrap_or_default(),
            self.seek_username.clone().unwrap_or_default(),
        )
    }

    // === Flow ===

    /// Establish identity, load the stored names and clear any stale
    /// challenge or game assignment.
    #[instrument(skip(self))]
    pub async fn sign_in(&mut self) -> Result<Uid, CollabError> {
        let uid = self.identity.current_user().await.map_err(|err| {
            warn!(error = %err, "Sign-in failed");
            err
        })?;
        self.uid = Some(uid.clone());

        self.username = self.profiles.get(&uid, USERNAME_KEY).await?;
        self.seek_username = self.profiles.get(&uid, SEEK_USERNAME_KEY).await?;
        for key in [SEEK_USERNAME_KEY, GAME_ID_KEY] {
            if let Err(err) = self.profiles.delete(&uid, key).await {
                warn!(error = %err, key, "Could not clear stale profile key");
            }
        }

        self.sign_in = if self.username.is_some() {
            SignInStatus::Done
        } else {
            SignInStatus::Idle
        };
        info!(%uid, username = ?self.username, "Signed in");
        Ok(uid)
    }

    /// Store `name` as the display name. Writes only when it changed.
    #[instrument(skip(self))]
    pub async fn set_username(&mut self, name: &str) -> SignInStatus {
        if name.is_empty() {
            return self.sign_in;
        }
        if self.username.as_deref() == Some(name) {
            self.sign_in = SignInStatus::Done;
            return self.sign_in;
        }
        let Some(uid) = self.uid.clone() else {
            warn!("Cannot set username before signing in");
            self.sign_in = SignInStatus::Idle;
            return self.sign_in;
        };

        match self.profiles.set(&uid, USERNAME_KEY, name).await {
            Ok(()) => {
                self.username = Some(name.to_owned());
                self.sign_in = SignInStatus::Done;
            }
            Err(err) => {
                warn!(error = %err, "Could not set username");
                self.sign_in = SignInStatus::Idle;
            }
        }
        self.sign_in
    }

    /// Challenge the user named `name`.
    ///
    /// Registers the challenge, then looks for `name` seeking us back. On a
    /// match this client creates the game as player 0 and assigns it to
    /// both profiles. If an assignment write fails the status is `Failed`
    /// but [`game_id`](Self::game_id) already names the created game.
    #[instrument(skip(self))]
    pub async fn challenge(&mut self, name: &str) -> ChallengeStatus {
        if name.is_empty() {
            return self.challenge;
        }
        self.seek_username = Some(name.to_owned());
        self.challenge = match self.try_challenge(name).await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, opponent = name, "Challenge failed");
                ChallengeStatus::Failed
            }
        };
        self.challenge
    }

    async fn try_challenge(&mut self, name: &str) -> Result<ChallengeStatus, CollabError> {
        let uid = self.uid.clone().ok_or(CollabError::NotSignedIn)?;
        self.profiles.set(&uid, SEEK_USERNAME_KEY, name).await?;
        self.challenge = ChallengeStatus::Done;

        let Some(username) = self.username.clone() else {
            info!("No username stored; nobody can be seeking us");
            return Ok(ChallengeStatus::NoOpponent);
        };
        let Some(opponent) = self.matchmaker.find_opponent(name, &username).await? else {
            info!(opponent = name, "No matching opponent online");
            return Ok(ChallengeStatus::NoOpponent);
        };

        let game = self
            .matchmaker
            .create_game(GamePlayers {
                player0: uid.clone(),
                player1: opponent.clone(),
            })
            .await?;
        info!(%game, %opponent, "Game created");
        // The game exists even if an assignment below fails.
        self.game_id = Some(game.clone());

        for player in [&opponent, &uid] {
            self.profiles.set(player, GAME_ID_KEY, game.as_str()).await?;
            self.profiles.delete(player, SEEK_USERNAME_KEY).await?;
        }
        Ok(ChallengeStatus::Matched)
    }

    /// Check the local profile for an assigned game.
    ///
    /// The challenged side learns about its game this way.
    pub async fn poll_assignment(&mut self) -> Result<Option<GameId>, CollabError> {
        let uid = self.uid.clone().ok_or(CollabError::NotSignedIn)?;
        let assigned = self.profiles.get(&uid, GAME_ID_KEY).await?.map(GameId::new);
        if let Some(game) = &assigned {
            self.challenge = ChallengeStatus::Matched;
            self.game_id = Some(game.clone());
        }
        Ok(assigned)
    }
}

impl std::fmt::Debug for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lobby")
            .field("uid", &self.uid)
            .field("username", &self.username)
            .field("seek_username", &self.seek_username)
            .field("game_id", &self.game_id)
            .field("sign_in", &self.sign_in)
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}
