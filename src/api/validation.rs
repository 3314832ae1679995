//! Request field checks applied before anything reaches the store.

use crate::api::ApiError;

/// Longest accepted username or level id, in characters.
pub const MAX_ID_LEN: usize = 64;

/// Longest accepted display name or achievement id, in characters.
pub const MAX_TEXT_LEN: usize = 128;

/// Largest leaderboard page.
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Leaderboard page size when none is given.
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

fn identifier(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(ApiError::validation(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(())
}

/// Checks a username.
pub fn username(value: &str) -> Result<(), ApiError> {
    identifier("username", value, MAX_ID_LEN)
}

/// Checks a level id.
pub fn level_id(value: &str) -> Result<(), ApiError> {
    identifier("level_id", value, MAX_ID_LEN)
}

/// Checks a display name.
pub fn display_name(value: &str) -> Result<(), ApiError> {
    identifier("display_name", value, MAX_TEXT_LEN)
}

/// Checks every achievement id in a list.
pub fn achievements<S: AsRef<str>>(values: &[S]) -> Result<(), ApiError> {
    values
        .iter()
        .try_for_each(|a| identifier("achievement", a.as_ref(), MAX_TEXT_LEN))
}

/// Checks that a counter is not negative.
pub fn non_negative(field: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Resolves a requested leaderboard size.
pub fn leaderboard_limit(requested: Option<i64>) -> Result<i64, ApiError> {
    match requested {
        None => Ok(DEFAULT_LEADERBOARD_LIMIT),
        Some(n) if (1..=MAX_LEADERBOARD_LIMIT).contains(&n) => Ok(n),
        Some(n) => Err(ApiError::validation(format!(
            "limit must be between 1 and {MAX_LEADERBOARD_LIMIT}, got {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(username("alice").is_ok());
        assert!(username("Ünïcødé player").is_ok());
        assert!(level_id("World_1-3").is_ok());
    }

    #[test]
    fn rejects_blank_long_and_control() {
        assert!(username("").is_err());
        assert!(username("   ").is_err());
        assert!(username(&"x".repeat(MAX_ID_LEN + 1)).is_err());
        assert!(username(&"x".repeat(MAX_ID_LEN)).is_ok());
        assert!(level_id("lvl\n1").is_err());
    }

    #[test]
    fn achievement_lists_are_checked_per_item() {
        assert!(achievements::<&str>(&[]).is_ok());
        assert!(achievements(&["first_blood", "speedrun"]).is_ok());
        assert!(achievements(&["ok", ""]).is_err());
    }

    #[test]
    fn negative_counters_rejected() {
        assert!(non_negative("score", 0).is_ok());
        assert!(non_negative("score", -1).is_err());
    }

    #[test]
    fn leaderboard_limit_bounds() {
        assert_eq!(leaderboard_limit(None).unwrap(), DEFAULT_LEADERBOARD_LIMIT);
        assert_eq!(leaderboard_limit(Some(1)).unwrap(), 1);
        assert_eq!(leaderboard_limit(Some(100)).unwrap(), 100);
        assert!(leaderboard_limit(Some(0)).is_err());
        assert!(leaderboard_limit(Some(101)).is_err());
    }
}
