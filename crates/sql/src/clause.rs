use crate::error::SqlError;
use crate::sanitize::{sanitize, SanitizeContext};

pub const ALLOWED_AGGREGATES: &[&str] = &["COUNT", "SUM", "AVG", "MIN", "MAX"];
pub const ALLOWED_JOIN_TYPES: &[&str] = &["INNER", "LEFT", "RIGHT"];
pub const ALLOWED_OPERATORS: &[&str] = &["=", "!=", ">", "<", ">=", "<=", "LIKE", "NOT LIKE", "IS NULL", "IS NOT NULL"];
pub const ALLOWED_ORDER_DIRECTIONS: &[&str] = &["ASC", "DESC"];

/// A JSON-value-shaped parameter for a parameterized SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A single `WHERE`/`HAVING` condition, as accepted from the request body.
#[derive(Debug, Clone)]
pub struct Condition {
    pub column_ref: String,
    pub operator: String,
    pub value: Option<SqlValue>,
    pub connector: Option<String>,
    /// HAVING only: an aggregate function applied to `column_ref`.
    pub func: Option<String>,
}

impl Condition {
    pub fn new(column_ref: impl Into<String>, operator: impl Into<String>) -> Self {
        Condition {
            column_ref: column_ref.into(),
            operator: operator.into(),
            value: None,
            connector: None,
            func: None,
        }
    }

    pub fn with_value(mut self, value: SqlValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_connector(mut self, connector: impl Into<String>) -> Self {
        self.connector = Some(connector.into());
        self
    }
}

fn validate_operator(operator: &str) -> Result<String, SqlError> {
    let upper = operator.trim().to_ascii_uppercase();
    if ALLOWED_OPERATORS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(SqlError::InputValidation(format!("invalid operator: {operator}")))
    }
}

fn validate_connector(connector: Option<&str>, is_first: bool) -> Result<Option<String>, SqlError> {
    if is_first {
        return Ok(None);
    }
    let upper = connector.unwrap_or("AND").trim().to_ascii_uppercase();
    if upper == "AND" || upper == "OR" {
        Ok(Some(upper))
    } else {
        Err(SqlError::InputValidation(format!("invalid connector: {upper}")))
    }
}

fn quote_column_ref(column_ref: &str) -> Result<String, SqlError> {
    let id = sanitize(column_ref, SanitizeContext::Column)
        .ok_or_else(|| SqlError::InputValidation("missing column reference".into()))?;
    Ok(if id.as_str().contains('.') {
        let (left, right) = id.as_str().split_once('.').unwrap();
        format!("`{left}`.`{right}`")
    } else {
        format!("`{}`", id.as_str())
    })
}

/// Builds a `WHERE` fragment and its positional parameters (§4.5.1).
///
/// Returns `("", [])` if `conditions` is empty; callers decide whether that
/// emptiness is acceptable (e.g. the DML path rejects an empty WHERE for
/// UPDATE/DELETE).
pub fn build_where_clause(conditions: &[Condition]) -> Result<(String, Vec<SqlValue>), SqlError> {
    let mut parts = Vec::new();
    let mut params = Vec::new();

    for (index, condition) in conditions.iter().enumerate() {
        if condition.column_ref.is_empty() {
            return Err(SqlError::InputValidation(format!(
                "incomplete WHERE condition (missing column): {condition:?}"
            )));
        }
        let operator = validate_operator(&condition.operator)?;
        let connector = validate_connector(condition.connector.as_deref(), index == 0)?;
        let safe_col = quote_column_ref(&condition.column_ref)?;

        if let Some(connector) = connector {
            parts.push(connector);
        }

        if operator == "IS NULL" || operator == "IS NOT NULL" {
            parts.push(format!("{safe_col} {operator}"));
            if condition.value.is_some() {
                log::warn!(
                    "value provided for WHERE operator '{operator}' on column '{}' will be ignored",
                    condition.column_ref
                );
            }
        } else {
            parts.push(format!("{safe_col} {operator} ?"));
            params.push(condition.value.clone().unwrap_or(SqlValue::Null));
        }
    }

    if parts.is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    Ok((parts.join(" "), params))
}

/// Builds a `HAVING` fragment and its positional parameters (§4.5.2).
///
/// As [`build_where_clause`], with aggregate-function handling: when a
/// condition carries `func`, the emitted term is `FUNC(target)`; `target`
/// may be `*` only when `func = COUNT`. Absent `func`, a reference matching
/// one of `allowed_select_aliases` is emitted as a bare identifier.
pub fn build_having_clause(
    conditions: &[Condition],
    allowed_select_aliases: &[String],
) -> Result<(String, Vec<SqlValue>), SqlError> {
    let mut parts = Vec::new();
    let mut params = Vec::new();

    for (index, condition) in conditions.iter().enumerate() {
        if condition.column_ref.is_empty() {
            return Err(SqlError::InputValidation(format!(
                "incomplete HAVING condition (missing column/alias reference): {condition:?}"
            )));
        }
        if let Some(func) = &condition.func {
            let upper = func.trim().to_ascii_uppercase();
            if !ALLOWED_AGGREGATES.contains(&upper.as_str()) {
                return Err(SqlError::InputValidation(format!("invalid aggregate function in HAVING: {func}")));
            }
        }
        let operator = validate_operator(&condition.operator)?;
        let connector = validate_connector(condition.connector.as_deref(), index == 0)?;

        let term = if let Some(func) = &condition.func {
            let upper = func.trim().to_ascii_uppercase();
            if condition.column_ref == "*" {
                if upper != "COUNT" {
                    return Err(SqlError::InputValidation("HAVING: '*' only allowed with COUNT".into()));
                }
                format!("{upper}(*)")
            } else {
                let target = quote_column_ref(&condition.column_ref)?;
                format!("{upper}({target})")
            }
        } else {
            let safe = sanitize(&condition.column_ref, SanitizeContext::Column)
                .ok_or_else(|| SqlError::InputValidation("missing column/alias reference".into()))?;
            if allowed_select_aliases.contains(&safe.as_str().to_string()) || !safe.as_str().contains('.') {
                format!("`{}`", safe.as_str())
            } else {
                let (left, right) = safe.as_str().split_once('.').unwrap();
                format!("`{left}`.`{right}`")
            }
        };

        if let Some(connector) = connector {
            parts.push(connector);
        }

        if operator == "IS NULL" || operator == "IS NOT NULL" {
            parts.push(format!("{term} {operator}"));
            if condition.value.is_some() {
                log::warn!("value provided for HAVING operator '{operator}' on term '{term}' will be ignored");
            }
        } else {
            parts.push(format!("{term} {operator} ?"));
            params.push(condition.value.clone().unwrap_or(SqlValue::Null));
        }
    }

    if parts.is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    Ok((parts.join(" "), params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_builder_scenario_from_spec() {
        let conditions = vec![
            Condition::new("a", "=").with_value(SqlValue::Int(1)),
            Condition::new("b", "IS NULL").with_connector("OR"),
        ];
        let (sql, params) = build_where_clause(&conditions).unwrap();
        assert_eq!(sql, "`a` = ? OR `b` IS NULL");
        assert_eq!(params, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn where_builder_rejects_bad_operator() {
        let conditions = vec![Condition::new("a", "DROP TABLE")];
        assert!(build_where_clause(&conditions).is_err());
    }

    #[test]
    fn where_builder_qualifies_table_dot_column() {
        let conditions = vec![Condition::new("orders.id", "=").with_value(SqlValue::Int(4))];
        let (sql, _) = build_where_clause(&conditions).unwrap();
        assert_eq!(sql, "`orders`.`id` = ?");
    }

    #[test]
    fn having_builder_count_star() {
        let mut c = Condition::new("*", ">").with_value(SqlValue::Int(5));
        c.func = Some("COUNT".to_string());
        let (sql, params) = build_having_clause(&[c], &[]).unwrap();
        assert_eq!(sql, "COUNT(*) > ?");
        assert_eq!(params, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn having_builder_rejects_star_without_count() {
        let mut c = Condition::new("*", ">").with_value(SqlValue::Int(5));
        c.func = Some("SUM".to_string());
        assert!(build_having_clause(&[c], &[]).is_err());
    }
}
