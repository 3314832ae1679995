//! SQLite-backed store for players, game sessions and high scores.

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{GameSessionRow, NewGameSessionRow, NewPlayerRow, PlayerRow};
use crate::db::schema::{game_sessions, high_scores, players};
use crate::db::{
    GameSession, HighScore, HighScoreUpdate, NewGameSession, Player, RunOutcome, StoreError,
    achievements,
};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Default wait for a locked database before a write gives up.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Store for players, game sessions and per-level high scores.
///
/// Every operation opens its own connection and drops it before returning.
/// Writes run in `BEGIN IMMEDIATE` transactions, so concurrent writers on
/// the same database file queue on SQLite's write lock (bounded by the busy
/// timeout) instead of interleaving.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    db_path: String,
    busy_timeout_ms: u64,
}

impl ScoreStore {
    /// Creates a store for the database file at the given path.
    ///
    /// Each call opens a fresh connection, so `":memory:"` would give every
    /// operation an empty database. Use a file path, even in tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, StoreError> {
        Self::with_busy_timeout(db_path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Creates a store with an explicit busy timeout in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn with_busy_timeout(db_path: String, busy_timeout_ms: u64) -> Result<Self, StoreError> {
        if db_path.trim().is_empty() {
            return Err(StoreError::storage("Database path is empty"));
        }
        info!(path = %db_path, busy_timeout_ms, "Creating ScoreStore");
        Ok(Self {
            db_path,
            busy_timeout_ms,
        })
    }

    /// Path of the backing database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a configured database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::storage(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))?;
        Ok(conn)
    }

    /// Applies any pending schema migrations. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, StoreError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::storage(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    fn exists(conn: &mut SqliteConnection, username: &str) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            players::table.filter(players::username.eq(username)),
        ))
        .get_result(conn)
    }

    /// Returns whether a player with this username is registered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn player_exists(&self, username: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let found = Self::exists(&mut conn, username)?;
        debug!(username, found, "Checked player existence");
        Ok(found)
    }

    /// Registers a new player with zeroed counters and no achievements.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `AlreadyExists` if the username is
    /// taken; the existing player is left untouched.
    #[instrument(skip(self))]
    pub fn add_player(
        &self,
        username: &str,
        display_name: &str,
        created_at: NaiveDateTime,
    ) -> Result<Player, StoreError> {
        debug!("Adding player");
        let mut conn = self.connection()?;

        let row = conn.immediate_transaction(|conn| {
            if Self::exists(conn, username)? {
                warn!(username, "Username already registered");
                return Err(StoreError::already_exists(username));
            }
            diesel::insert_into(players::table)
                .values(&NewPlayerRow::new(username, display_name, created_at))
                .returning(PlayerRow::as_returning())
                .get_result(conn)
                .map_err(StoreError::from)
        })?;

        let player = Player::try_from(row)?;
        info!(username = %player.username(), "Player added");
        Ok(player)
    }

    fn load_player(conn: &mut SqliteConnection, username: &str) -> Result<PlayerRow, StoreError> {
        players::table
            .find(username)
            .select(PlayerRow::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("Player '{}' not found", username)))
    }

    /// Loads a player, decoding their achievements.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `NotFound` for unknown usernames.
    #[instrument(skip(self))]
    pub fn get_player(&self, username: &str) -> Result<Player, StoreError> {
        let mut conn = self.connection()?;
        let row = Self::load_player(&mut conn, username)?;
        Player::try_from(row)
    }

    /// Lists all players in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_players(&self) -> Result<Vec<Player>, StoreError> {
        let mut conn = self.connection()?;
        let rows = players::table
            .order((players::created_at.asc(), players::username.asc()))
            .select(PlayerRow::as_select())
            .load(&mut conn)?;

        info!(count = rows.len(), "Players loaded");
        rows.into_iter().map(Player::try_from).collect()
    }

    /// Appends an achievement to a player's list unless they already hold it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `NotFound` for unknown usernames.
    #[instrument(skip(self))]
    pub fn award_achievement(&self, username: &str, achievement: &str) -> Result<Player, StoreError> {
        let mut conn = self.connection()?;

        let row = conn.immediate_transaction(|conn| {
            let row = Self::load_player(conn, username)?;
            let mut list = achievements::decode(&row.achievements)?;
            if list.iter().any(|a| a == achievement) {
                debug!(username, achievement, "Achievement already held");
                return Ok(row);
            }
            list.push(achievement.to_string());
            diesel::update(players::table.find(username))
                .set(players::achievements.eq(achievements::encode(&list)?))
                .returning(PlayerRow::as_returning())
                .get_result(conn)
                .map_err(StoreError::from)
        })?;

        info!(username, achievement, "Achievement awarded");
        Player::try_from(row)
    }

    /// Inserts a session and bumps the owner's counters on an open transaction.
    fn insert_session(
        conn: &mut SqliteConnection,
        session: &NewGameSession,
    ) -> Result<GameSession, StoreError> {
        let username = session.username().as_str();
        let score = *session.score();
        if score < 0 {
            return Err(StoreError::invalid_score(format!(
                "Session score {} for '{}' is negative",
                score, username
            )));
        }

        let Some((total_score, sessions_played)) = players::table
            .find(username)
            .select((players::total_score, players::sessions_played))
            .first::<(i64, i64)>(conn)
            .optional()?
        else {
            warn!(username, "Session for unregistered player");
            return Err(StoreError::unknown_player(username));
        };
        let total_score = total_score.checked_add(score).ok_or_else(|| {
            warn!(username, total_score, score, "Total score would overflow");
            StoreError::invalid_score(format!(
                "Total score for '{}' would overflow: {} + {}",
                username, total_score, score
            ))
        })?;
        let sessions_played = sessions_played.checked_add(1).ok_or_else(|| {
            StoreError::invalid_score(format!("Session count for '{}' would overflow", username))
        })?;

        let row = NewGameSessionRow::encode(session)?;
        let inserted = diesel::insert_into(game_sessions::table)
            .values(&row)
            .returning(GameSessionRow::as_returning())
            .get_result(conn)?;

        let updated = diesel::update(players::table.find(username))
            .set((
                players::total_score.eq(total_score),
                players::sessions_played.eq(sessions_played),
            ))
            .execute(conn)?;
        if updated != 1 {
            return Err(StoreError::storage(format!(
                "Expected to update one player row for '{}', updated {}",
                username, updated
            )));
        }

        GameSession::try_from(inserted)
    }

    /// Records a completed session and adds its score to the owner's totals.
    ///
    /// The insert and the counter update commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `UnknownPlayer` if the owner is not
    /// registered, or `InvalidScore` if the score is negative or the total
    /// would overflow. Nothing is written in either case.
    #[instrument(skip(self, session), fields(username = %session.username(), level_id = %session.level_id(), score = session.score()))]
    pub fn add_game_session(&self, session: &NewGameSession) -> Result<GameSession, StoreError> {
        debug!("Recording game session");
        let mut conn = self.connection()?;
        let recorded = conn.immediate_transaction(|conn| Self::insert_session(conn, session))?;
        info!(session_id = recorded.id(), "Game session recorded");
        Ok(recorded)
    }

    /// Lists a player's sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `NotFound` for unknown usernames.
    #[instrument(skip(self))]
    pub fn list_sessions(&self, username: &str) -> Result<Vec<GameSession>, StoreError> {
        let mut conn = self.connection()?;
        if !Self::exists(&mut conn, username)? {
            return Err(StoreError::not_found(format!("Player '{}' not found", username)));
        }

        let rows = game_sessions::table
            .filter(game_sessions::username.eq(username))
            .order((game_sessions::completed_at.desc(), game_sessions::id.desc()))
            .select(GameSessionRow::as_select())
            .load(&mut conn)?;

        info!(username, count = rows.len(), "Sessions loaded");
        rows.into_iter().map(GameSession::try_from).collect()
    }

    /// Keeps the best score for `(username, level_id)` on an open transaction.
    fn upsert_high_score(
        conn: &mut SqliteConnection,
        username: &str,
        level_id: &str,
        score: i64,
        achieved_at: NaiveDateTime,
    ) -> Result<HighScoreUpdate, StoreError> {
        if !Self::exists(conn, username)? {
            return Err(StoreError::unknown_player(username));
        }

        let current = high_scores::table
            .find((username, level_id))
            .select(HighScore::as_select())
            .first(conn)
            .optional()?;

        match current {
            None => {
                let row = diesel::insert_into(high_scores::table)
                    .values(&HighScore::new(
                        username.to_string(),
                        level_id.to_string(),
                        score,
                        achieved_at,
                    ))
                    .returning(HighScore::as_returning())
                    .get_result(conn)?;
                debug!(username, level_id, score, "First score on level");
                Ok(HighScoreUpdate::new(row, true))
            }
            Some(existing) if score > *existing.score() => {
                let row = diesel::update(high_scores::table.find((username, level_id)))
                    .set((
                        high_scores::score.eq(score),
                        high_scores::achieved_at.eq(achieved_at),
                    ))
                    .returning(HighScore::as_returning())
                    .get_result(conn)?;
                debug!(username, level_id, previous = existing.score(), score, "New best");
                Ok(HighScoreUpdate::new(row, true))
            }
            Some(existing) => {
                debug!(username, level_id, best = existing.score(), score, "Below best");
                Ok(HighScoreUpdate::new(existing, false))
            }
        }
    }

    /// Submits a score for a level, keeping only the best per player and level.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `UnknownPlayer` if the player is not
    /// registered.
    #[instrument(skip(self))]
    pub fn record_high_score(
        &self,
        username: &str,
        level_id: &str,
        score: i64,
        achieved_at: NaiveDateTime,
    ) -> Result<HighScoreUpdate, StoreError> {
        let mut conn = self.connection()?;
        let update = conn.immediate_transaction(|conn| {
            Self::upsert_high_score(conn, username, level_id, score, achieved_at)
        })?;
        info!(
            username,
            level_id,
            best = update.high_score().score(),
            improved = update.improved(),
            "High score submitted"
        );
        Ok(update)
    }

    /// Records a session and its high-score submission in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `UnknownPlayer` if the owner is not
    /// registered, or `InvalidScore` if the score is negative or the total
    /// would overflow. Nothing is written in either case.
    #[instrument(skip(self, session), fields(username = %session.username(), level_id = %session.level_id(), score = session.score()))]
    pub fn record_run(&self, session: &NewGameSession) -> Result<RunOutcome, StoreError> {
        let mut conn = self.connection()?;
        let outcome = conn.immediate_transaction(|conn| {
            let recorded = Self::insert_session(conn, session)?;
            let high_score = Self::upsert_high_score(
                conn,
                session.username(),
                session.level_id(),
                *session.score(),
                *session.completed_at(),
            )?;
            Ok::<_, StoreError>(RunOutcome::new(recorded, high_score))
        })?;
        info!(
            session_id = outcome.session().id(),
            new_best = outcome.high_score().improved(),
            "Run recorded"
        );
        Ok(outcome)
    }

    /// Gets the best score for one player on one level, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_high_score(
        &self,
        username: &str,
        level_id: &str,
    ) -> Result<Option<HighScore>, StoreError> {
        let mut conn = self.connection()?;
        let row = high_scores::table
            .find((username, level_id))
            .select(HighScore::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row)
    }

    /// Lists a player's best score on every level they have played.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with kind `NotFound` for unknown usernames.
    #[instrument(skip(self))]
    pub fn player_high_scores(&self, username: &str) -> Result<Vec<HighScore>, StoreError> {
        let mut conn = self.connection()?;
        if !Self::exists(&mut conn, username)? {
            return Err(StoreError::not_found(format!("Player '{}' not found", username)));
        }

        let rows = high_scores::table
            .filter(high_scores::username.eq(username))
            .order(high_scores::level_id.asc())
            .select(HighScore::as_select())
            .load(&mut conn)?;
        debug!(username, count = rows.len(), "High scores loaded");
        Ok(rows)
    }

    /// Top scores on a level. Ties go to whoever reached the score first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn level_leaderboard(&self, level_id: &str, limit: i64) -> Result<Vec<HighScore>, StoreError> {
        let mut conn = self.connection()?;
        let rows = high_scores::table
            .filter(high_scores::level_id.eq(level_id))
            .order((
                high_scores::score.desc(),
                high_scores::achieved_at.asc(),
                high_scores::username.asc(),
            ))
            .limit(limit)
            .select(HighScore::as_select())
            .load(&mut conn)?;
        info!(level_id, count = rows.len(), "Leaderboard loaded");
        Ok(rows)
    }
}
