//! Daily questions pinned on first display

use chrono::{Days, NaiveDate, Utc};
use rusqlite::OptionalExtension;

use super::Question;
use crate::error::Result;
use crate::storage::db::date_to_sql;
use crate::storage::LocalDb;

/// Pins older than this are pruned when a new day is pinned
const KEEP_DAYS: u64 = 7;

/// The question shown for each day, so grading never reloads the catalog.
///
/// Pins are per device: every profile sees the same daily question anyway.
#[derive(Clone)]
pub struct DailyPins {
    db: LocalDb,
}

impl DailyPins {
    pub fn new(db: LocalDb) -> Self {
        Self { db }
    }

    pub fn get(&self, date: NaiveDate) -> Result<Option<Question>> {
        let conn = self.db.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT question FROM daily_pin WHERE date = ?1",
                [date_to_sql(Some(date))],
                |r| r.get(0),
            )
            .optional()?;
        Ok(raw.map(|raw| serde_json::from_str(&raw)).transpose()?)
    }

    /// Pin `question` for `date` unless one is pinned already; returns the pin
    pub fn pin(&self, date: NaiveDate, question: &Question) -> Result<Question> {
        let payload = serde_json::to_string(question)?;
        {
            let mut conn = self.db.conn();
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO daily_pin (date, question, pinned_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![date_to_sql(Some(date)), payload, Utc::now().timestamp_millis()],
            )?;
            if let Some(cutoff) = date.checked_sub_days(Days::new(KEEP_DAYS)) {
                tx.execute(
                    "DELETE FROM daily_pin WHERE date < ?1",
                    [date_to_sql(Some(cutoff))],
                )?;
            }
            tx.commit()?;
        }
        Ok(self.get(date)?.unwrap_or_else(|| question.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSource;
    use crate::domain::CatalogItem;

    fn question(category: &str, source: CatalogSource) -> Question {
        Question {
            item: CatalogItem {
                category: category.into(),
                title: "Route 113".into(),
                media_ref: "route-113.mp3".into(),
                generation: 3,
                canonical_id: None,
            },
            options: vec![category.into(), "Pokemon Gold Silver".into()],
            source,
        }
    }

    #[test]
    fn test_first_pin_wins() {
        let pins = DailyPins::new(LocalDb::open_in_memory().unwrap());
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(pins.get(day).unwrap().is_none());

        let shown = question("Pokemon Ruby Sapphire", CatalogSource::Remote);
        assert_eq!(pins.pin(day, &shown).unwrap(), shown);
        let later = question("Pokemon Sun Moon", CatalogSource::Fallback);
        assert_eq!(pins.pin(day, &later).unwrap(), shown);
    }

    #[test]
    fn test_old_pins_are_pruned() {
        let pins = DailyPins::new(LocalDb::open_in_memory().unwrap());
        let old = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        pins.pin(old, &question("Pokemon Red Blue", CatalogSource::Remote))
            .unwrap();
        pins.pin(today, &question("Pokemon Gold Silver", CatalogSource::Remote))
            .unwrap();
        assert!(pins.get(old).unwrap().is_none());
        assert!(pins.get(today).unwrap().is_some());
    }
}
