//! Table queries with equality, substring and disjunctive filters

use serde_json::Value;

use super::Row;

/// A column filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value
    Eq(String, Value),
    /// Column contains the needle, ignoring case
    ILike(String, String),
    /// Any of the nested filters matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq(column, expected) => row
                .get(column)
                .is_some_and(|actual| value_text(actual) == value_text(expected)),
            Self::ILike(column, needle) => row.get(column).is_some_and(|actual| {
                value_text(actual)
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            }),
            Self::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

/// Text form of a scalar value, used for comparisons and URL rendering
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Select/update/delete target: one table plus AND-combined filters
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    pub fn ilike(mut self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike(column.into(), needle.into()));
        self
    }

    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(filters));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_compares_text_form() {
        let r = row(json!({"id": 7, "name": "Route 1"}));
        assert!(Filter::Eq("id".into(), json!("7")).matches(&r));
        assert!(Filter::Eq("name".into(), json!("Route 1")).matches(&r));
        assert!(!Filter::Eq("name".into(), json!("route 1")).matches(&r));
        assert!(!Filter::Eq("missing".into(), json!("x")).matches(&r));
    }

    #[test]
    fn test_ilike_is_case_insensitive_substring() {
        let r = row(json!({"game_name": "Pokemon Red Blue"}));
        assert!(Filter::ILike("game_name".into(), "red".into()).matches(&r));
        assert!(!Filter::ILike("game_name".into(), "gold".into()).matches(&r));
    }

    #[test]
    fn test_query_ands_filters_and_ors_groups() {
        let r = row(json!({"name": "Lavender Town", "game_name": "Pokemon Fire Red"}));
        let q = Query::from("tracks").ilike("name", "lavender").or(vec![
            Filter::ILike("game_name".into(), "gold".into()),
            Filter::ILike("game_name".into(), "fire".into()),
        ]);
        assert!(q.matches(&r));

        let q = q.eq("name", "Cerulean City");
        assert!(!q.matches(&r));
    }
}
