use std::fmt;

use normform_helpers::IndexSet;

/// An ordered, deduplicated set of attribute names.
///
/// `IndexSet` rather than a plain hash set so that iteration order is
/// deterministic: every "lexicographic tie-break" the spec calls for falls
/// out of sorting this set rather than needing a side channel.
pub type AttributeSet = IndexSet<String>;

pub fn attribute_set<I: IntoIterator<Item = S>, S: Into<String>>(iter: I) -> AttributeSet {
    iter.into_iter().map(Into::into).collect()
}

/// Returns the members of `set` as a `Vec`, sorted lexicographically.
pub fn sorted(set: &AttributeSet) -> Vec<&str> {
    let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
    v.sort_unstable();
    v
}

/// The fixed enumeration of column types this workbench understands.
///
/// Anything introspected from a live schema that doesn't match one of these
/// is treated as `Text` by the orchestrator's type-mapping heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Int,
    Varchar255,
    Text,
    Date,
    Boolean,
    Decimal10_2,
    Timestamp,
    Float,
}

impl LogicalType {
    /// Maps a raw `DESCRIBE`/`INFORMATION_SCHEMA.COLUMNS` type string onto
    /// the fixed enumeration, defaulting to `Text` when nothing matches.
    pub fn from_raw(raw: &str) -> Self {
        let upper = raw.to_ascii_uppercase();
        if upper.contains("INT") {
            LogicalType::Int
        } else if upper.contains("VARCHAR") {
            LogicalType::Varchar255
        } else if upper.contains("TEXT") {
            LogicalType::Text
        } else if upper.contains("DATE") && !upper.contains("TIMESTAMP") {
            LogicalType::Date
        } else if upper.contains("BOOL") {
            LogicalType::Boolean
        } else if upper.contains("DECIMAL") || upper.contains("NUMERIC") {
            LogicalType::Decimal10_2
        } else if upper.contains("TIMESTAMP") {
            LogicalType::Timestamp
        } else if upper.contains("FLOAT") || upper.contains("DOUBLE") {
            LogicalType::Float
        } else {
            LogicalType::Text
        }
    }

    /// The SQL DDL fragment for this type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            LogicalType::Int => "INT",
            LogicalType::Varchar255 => "VARCHAR(255)",
            LogicalType::Text => "TEXT",
            LogicalType::Date => "DATE",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::Decimal10_2 => "DECIMAL(10, 2)",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::Float => "FLOAT",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single column: a sanitized name, its logical type, and its facets.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub logical_type: LogicalType,
    pub is_pk: bool,
    pub is_not_null: bool,
    pub is_unique: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Attribute {
            name: name.into(),
            logical_type,
            is_pk: false,
            is_not_null: false,
            is_unique: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_orders_lexicographically_regardless_of_insertion_order() {
        let set = attribute_set(["name", "id", "email"]);
        assert_eq!(sorted(&set), vec!["email", "id", "name"]);
    }

    #[test]
    fn logical_type_from_raw_matches_on_substring_case_insensitively() {
        assert_eq!(LogicalType::from_raw("varchar(255)"), LogicalType::Varchar255);
        assert_eq!(LogicalType::from_raw("INT(11)"), LogicalType::Int);
        assert_eq!(LogicalType::from_raw("DECIMAL(10,2)"), LogicalType::Decimal10_2);
        assert_eq!(LogicalType::from_raw("NUMERIC"), LogicalType::Decimal10_2);
    }

    #[test]
    fn logical_type_from_raw_prefers_date_over_timestamp_substring_match() {
        assert_eq!(LogicalType::from_raw("DATE"), LogicalType::Date);
        assert_eq!(LogicalType::from_raw("TIMESTAMP"), LogicalType::Timestamp);
    }

    #[test]
    fn logical_type_from_raw_defaults_unknown_to_text() {
        assert_eq!(LogicalType::from_raw("JSON"), LogicalType::Text);
    }

    #[test]
    fn logical_type_display_matches_as_sql() {
        assert_eq!(LogicalType::Boolean.to_string(), "BOOLEAN");
        assert_eq!(LogicalType::Decimal10_2.as_sql(), "DECIMAL(10, 2)");
    }
}
