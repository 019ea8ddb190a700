//! Table and column names of the remote schema, plus row codecs

use serde_json::{json, Value};

use super::{value_text, Row};
use crate::domain::{CanonicalId, CatalogItem, PlayerStats};

pub const TRACKS: &str = "tracks";
pub const FAVORITES: &str = "favorites";
pub const USER_STATS: &str = "user_stats";

pub const ID: &str = "id";
pub const TRACK_NAME: &str = "name";
pub const TRACK_GAME: &str = "game_name";
pub const TRACK_URL: &str = "url";
pub const TRACK_GENERATION: &str = "generation";
pub const USER_ID: &str = "user_id";
pub const TRACK_ID: &str = "track_id";
pub const TOTAL_PLAYS: &str = "total_plays";
pub const CORRECT_ANSWERS: &str = "correct_answers";
pub const BEST_STREAK: &str = "best_streak";

/// Row identifier as a canonical id (string or numeric column)
pub fn row_id(row: &Row) -> Option<CanonicalId> {
    row.get(ID)
        .filter(|v| !v.is_null())
        .map(|v| CanonicalId::new(value_text(v)))
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(Value::as_str).map(str::to_string)
}

fn count(row: &Row, column: &str) -> u32 {
    row.get(column)
        .and_then(Value::as_u64)
        .map(|n| n.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

/// Decode a `tracks` row; rows without a title or game are skipped
pub fn track_from_row(row: &Row) -> Option<CatalogItem> {
    let title = text(row, TRACK_NAME).filter(|s| !s.trim().is_empty())?;
    let category = text(row, TRACK_GAME).filter(|s| !s.trim().is_empty())?;
    Some(CatalogItem {
        category,
        title,
        media_ref: text(row, TRACK_URL).unwrap_or_default(),
        generation: row
            .get(TRACK_GENERATION)
            .and_then(Value::as_u64)
            .map(|g| g as u32)
            .unwrap_or(1),
        canonical_id: row_id(row),
    })
}

pub fn track_to_row(item: &CatalogItem) -> Row {
    let mut row = Row::new();
    if let Some(id) = &item.canonical_id {
        row.insert(ID.into(), json!(id.as_str()));
    }
    row.insert(TRACK_NAME.into(), json!(item.title));
    row.insert(TRACK_GAME.into(), json!(item.category));
    row.insert(TRACK_URL.into(), json!(item.media_ref));
    row.insert(TRACK_GENERATION.into(), json!(item.generation));
    row
}

pub fn stats_from_row(row: &Row) -> PlayerStats {
    PlayerStats {
        total_plays: count(row, TOTAL_PLAYS),
        correct_answers: count(row, CORRECT_ANSWERS),
        best_streak: count(row, BEST_STREAK),
    }
}

pub fn stats_to_row(user_id: &str, stats: &PlayerStats) -> Row {
    let mut row = stats_patch(stats);
    row.insert(USER_ID.into(), json!(user_id));
    row
}

/// Counter columns only, for updates keyed by `user_id`
pub fn stats_patch(stats: &PlayerStats) -> Row {
    let mut row = Row::new();
    row.insert(TOTAL_PLAYS.into(), json!(stats.total_plays));
    row.insert(CORRECT_ANSWERS.into(), json!(stats.correct_answers));
    row.insert(BEST_STREAK.into(), json!(stats.best_streak));
    row
}

pub fn favorite_row(user_id: &str, track_id: &CanonicalId) -> Row {
    let mut row = Row::new();
    row.insert(USER_ID.into(), json!(user_id));
    row.insert(TRACK_ID.into(), json!(track_id.as_str()));
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_row_with_numeric_id() {
        let row = json!({
            "id": 12,
            "name": "Lumiose City",
            "game_name": "Pokemon X Y",
            "url": "xy/lumiose.mp3",
            "generation": 6
        });
        let item = track_from_row(row.as_object().unwrap()).unwrap();
        assert_eq!(item.canonical_id, Some(CanonicalId::new("12")));
        assert_eq!(item.generation, 6);
    }

    #[test]
    fn test_track_row_without_game_is_skipped() {
        let row = json!({"id": "a", "name": "Orphan"});
        assert!(track_from_row(row.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_stats_row_defaults_missing_counters() {
        let row = json!({"user_id": "u1", "total_plays": 4});
        let stats = stats_from_row(row.as_object().unwrap());
        assert_eq!(stats.total_plays, 4);
        assert_eq!(stats.correct_answers, 0);
        assert_eq!(stats.best_streak, 0);
    }
}
