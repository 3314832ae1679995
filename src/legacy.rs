//! In-memory last-write-wins score board.
//!
//! Keeps only the most recent score reported per username. Nothing survives a
//! restart. Each board owns its map; clones share it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument};

/// Shared handle to an in-memory score map.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    scores: Arc<RwLock<HashMap<String, i64>>>,
}

impl ScoreBoard {
    /// Creates an empty score board.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory score board");
        Self::default()
    }

    /// Stores `score` for `username`, replacing whatever was there.
    #[instrument(skip(self))]
    pub fn update_score(&self, username: &str, score: i64) {
        let mut scores = self.scores.write().unwrap_or_else(PoisonError::into_inner);
        let previous = scores.insert(username.to_string(), score);
        debug!(?previous, "Score overwritten");
    }

    /// Last score reported for `username`, or 0 if none was.
    #[instrument(skip(self))]
    pub fn get_score(&self, username: &str) -> i64 {
        let scores = self.scores.read().unwrap_or_else(PoisonError::into_inner);
        scores.get(username).copied().unwrap_or(0)
    }

    /// Number of usernames with a stored score.
    pub fn len(&self) -> usize {
        self.scores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no score has been reported yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_username_scores_zero() {
        let board = ScoreBoard::new();
        assert_eq!(board.get_score("nobody"), 0);
        assert!(board.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let board = ScoreBoard::new();
        for score in [10, 300, 5, 42] {
            board.update_score("alice", score);
        }
        assert_eq!(board.get_score("alice"), 42);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn clones_share_state_but_boards_are_isolated() {
        let board = ScoreBoard::new();
        let handle = board.clone();
        handle.update_score("bob", 7);
        assert_eq!(board.get_score("bob"), 7);

        let other = ScoreBoard::new();
        assert_eq!(other.get_score("bob"), 0);
    }

    #[test]
    fn concurrent_writers_leave_one_of_their_values() {
        let board = ScoreBoard::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let board = board.clone();
                std::thread::spawn(move || board.update_score("carol", i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!((0..8).contains(&board.get_score("carol")));
    }
}
