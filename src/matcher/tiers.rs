//! Match tiers: each turns a `(title, category)` query into a table query

use once_cell::sync::Lazy;
use regex::Regex;

use crate::remote::{tables, Filter, Query};

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical pattern"));

/// Remove `(...)` annotations and collapse the remaining whitespace
pub fn strip_annotations(title: &str) -> String {
    let stripped = PARENTHETICAL.replace_all(title, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title text before the first `(`, trimmed
pub fn title_stem(title: &str) -> &str {
    title.split('(').next().unwrap_or(title).trim()
}

/// One step of the resolution cascade.
///
/// Returning `None` skips the tier (e.g. the query would be too broad).
pub trait MatchTier: Send + Sync {
    fn name(&self) -> &'static str;

    fn query(&self, title: &str, category: &str) -> Option<Query>;
}

/// Case-sensitive equality on both title and category
pub struct ExactTier;

impl MatchTier for ExactTier {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn query(&self, title: &str, category: &str) -> Option<Query> {
        Some(
            Query::from(tables::TRACKS)
                .eq(tables::TRACK_NAME, title)
                .eq(tables::TRACK_GAME, category)
                .limit(1),
        )
    }
}

/// Same category, title contains the annotation-free query title
pub struct FuzzyNameTier;

impl MatchTier for FuzzyNameTier {
    fn name(&self) -> &'static str {
        "fuzzy-name"
    }

    fn query(&self, title: &str, category: &str) -> Option<Query> {
        let needle = strip_annotations(title);
        if needle.is_empty() {
            return None;
        }
        Some(
            Query::from(tables::TRACKS)
                .eq(tables::TRACK_GAME, category)
                .ilike(tables::TRACK_NAME, needle),
        )
    }
}

/// Title stem match in any category sharing a word with the query category
pub struct CategoryTokenTier;

impl MatchTier for CategoryTokenTier {
    fn name(&self) -> &'static str {
        "category-token"
    }

    fn query(&self, title: &str, category: &str) -> Option<Query> {
        let stem = title_stem(title);
        let tokens: Vec<Filter> = category
            .split_whitespace()
            .map(|token| Filter::ILike(tables::TRACK_GAME.to_string(), token.to_string()))
            .collect();
        if stem.is_empty() || tokens.is_empty() {
            return None;
        }
        Some(
            Query::from(tables::TRACKS)
                .ilike(tables::TRACK_NAME, stem)
                .or(tokens),
        )
    }
}
