//! Text encoding for achievement lists stored in `achievements` columns.
//!
//! Lists are stored as a JSON array of strings. Order and content survive a
//! round trip exactly.

use tracing::instrument;

use crate::db::StoreError;

/// Encodes an ordered achievement list into its stored text form.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization fails.
#[instrument(skip(achievements), fields(count = achievements.len()))]
pub fn encode(achievements: &[String]) -> Result<String, StoreError> {
    Ok(serde_json::to_string(achievements)?)
}

/// Decodes stored text back into an ordered achievement list.
///
/// An empty column is read as an empty list.
///
/// # Errors
///
/// Returns [`StoreError`] if the text is not a JSON array of strings.
#[instrument(skip(text))]
pub fn decode(text: &str) -> Result<Vec<String>, StoreError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| {
        StoreError::storage(format!("Malformed achievements column '{}': {}", text, e))
    })
}
