//! Score-tracking business logic layer.

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info, instrument};

use crate::{
    GameSession, HighScore, NewGameSession, Player, RunOutcome, ScoreStore, StoreError,
    StoreErrorKind,
};

/// Level used when a score is submitted without one.
pub const DEFAULT_LEVEL: &str = "default";

/// Current wall-clock time as stored in the database (UTC, no offset).
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Service layer for score operations.
///
/// Wraps [`ScoreStore`] with higher-level business logic such as
/// get-or-create semantics and recording completed runs.
#[derive(Debug, Clone)]
pub struct ScoreService {
    store: ScoreStore,
}

impl ScoreService {
    /// Creates a new score service backed by the given store.
    #[instrument(skip(store))]
    pub fn new(store: ScoreStore) -> Self {
        info!(db_path = %store.db_path(), "Creating ScoreService");
        Self { store }
    }

    /// Returns the underlying store.
    #[instrument(skip(self))]
    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    /// Registers a player. The display name defaults to the username.
    #[instrument(skip(self))]
    pub fn register_player(
        &self,
        username: &str,
        display_name: Option<&str>,
        created_at: NaiveDateTime,
    ) -> Result<Player, StoreError> {
        self.store
            .add_player(username, display_name.unwrap_or(username), created_at)
    }

    /// Returns an existing player or registers one if not found.
    #[instrument(skip(self))]
    pub fn get_or_create_player(
        &self,
        username: &str,
        display_name: Option<&str>,
        created_at: NaiveDateTime,
    ) -> Result<Player, StoreError> {
        debug!("Getting or creating player");

        match self.store.get_player(username) {
            Ok(player) => {
                debug!("Existing player found");
                return Ok(player);
            }
            Err(e) if e.kind() == StoreErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        info!(username, "Creating new player");
        match self.register_player(username, display_name, created_at) {
            // Lost a registration race; the winner's row is what we want.
            Err(e) if e.kind() == StoreErrorKind::AlreadyExists => self.store.get_player(username),
            other => other,
        }
    }

    /// Records a bare score for a player on a level, registering the player
    /// on first sight.
    #[instrument(skip(self))]
    pub fn submit_score(
        &self,
        username: &str,
        level_id: &str,
        score: i64,
        at: NaiveDateTime,
    ) -> Result<RunOutcome, StoreError> {
        self.get_or_create_player(username, None, at)?;
        let session = NewGameSession::new(username.to_string(), level_id.to_string(), score, at);
        self.record_run(&session)
    }

    /// Records a completed session together with its high-score submission.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub fn record_run(&self, session: &NewGameSession) -> Result<RunOutcome, StoreError> {
        let outcome = self.store.record_run(session)?;
        info!(
            session_id = outcome.session().id(),
            new_best = outcome.high_score().improved(),
            "Run recorded"
        );
        Ok(outcome)
    }

    /// Accumulated score for a player, 0 if the player is unknown.
    #[instrument(skip(self))]
    pub fn score_of(&self, username: &str) -> Result<i64, StoreError> {
        match self.store.get_player(username) {
            Ok(player) => Ok(*player.total_score()),
            Err(e) if e.kind() == StoreErrorKind::NotFound => {
                debug!("Unknown player scores zero");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Loads one player.
    #[instrument(skip(self))]
    pub fn player(&self, username: &str) -> Result<Player, StoreError> {
        self.store.get_player(username)
    }

    /// Lists all players in registration order.
    #[instrument(skip(self))]
    pub fn players(&self) -> Result<Vec<Player>, StoreError> {
        self.store.list_players()
    }

    /// Awards an achievement to a player.
    #[instrument(skip(self))]
    pub fn award_achievement(&self, username: &str, achievement: &str) -> Result<Player, StoreError> {
        self.store.award_achievement(username, achievement)
    }

    /// Returns a player's sessions, most recent first.
    #[instrument(skip(self))]
    pub fn history(&self, username: &str) -> Result<Vec<GameSession>, StoreError> {
        self.store.list_sessions(username)
    }

    /// Returns a player's best score on each level.
    #[instrument(skip(self))]
    pub fn high_scores(&self, username: &str) -> Result<Vec<HighScore>, StoreError> {
        self.store.player_high_scores(username)
    }

    /// Returns the top `limit` scores on a level.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, level_id: &str, limit: i64) -> Result<Vec<HighScore>, StoreError> {
        self.store.level_leaderboard(level_id, limit)
    }
}
