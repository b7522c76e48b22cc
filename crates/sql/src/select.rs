use crate::clause::{build_having_clause, build_where_clause, Condition, SqlValue, ALLOWED_JOIN_TYPES, ALLOWED_ORDER_DIRECTIONS};
use crate::error::SqlError;
use crate::sanitize::{sanitize, SanitizeContext};

/// A single projected column, optionally wrapped in an aggregate and
/// optionally aliased. Mirrors the shape `execute_select_query` accepts for
/// its `columns` request field.
#[derive(Debug, Clone)]
pub struct SelectColumn {
    pub column_ref: String,
    pub func: Option<String>,
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn plain(column_ref: impl Into<String>) -> Self {
        SelectColumn {
            column_ref: column_ref.into(),
            func: None,
            alias: None,
        }
    }

    pub fn aggregate(column_ref: impl Into<String>, func: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectColumn {
            column_ref: column_ref.into(),
            func: Some(func.into()),
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: String,
    pub table: String,
    pub left_column: String,
    pub right_column: String,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column_ref: String,
    pub direction: String,
}

#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub table: String,
    pub columns: Vec<SelectColumn>,
    pub joins: Vec<Join>,
    pub conditions: Vec<Condition>,
    pub group_by: Vec<String>,
    pub having: Vec<Condition>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
}

fn quote_ref(column_ref: &str) -> Result<String, SqlError> {
    let id = sanitize(column_ref, SanitizeContext::Column)
        .ok_or_else(|| SqlError::InputValidation(format!("invalid column reference: {column_ref}")))?;
    Ok(if id.as_str().contains('.') {
        let (left, right) = id.as_str().split_once('.').unwrap();
        format!("`{left}`.`{right}`")
    } else {
        format!("`{}`", id.as_str())
    })
}

fn select_term(col: &SelectColumn) -> Result<(String, Option<String>), SqlError> {
    let base = if col.column_ref == "*" {
        "*".to_string()
    } else {
        quote_ref(&col.column_ref)?
    };
    let term = if let Some(func) = &col.func {
        let upper = func.trim().to_ascii_uppercase();
        if !crate::clause::ALLOWED_AGGREGATES.contains(&upper.as_str()) {
            return Err(SqlError::InputValidation(format!("invalid aggregate function: {func}")));
        }
        if col.column_ref == "*" && upper != "COUNT" {
            return Err(SqlError::InputValidation("'*' only allowed with COUNT".into()));
        }
        format!("{upper}({base})")
    } else {
        base
    };
    Ok((term.clone(), col.alias.clone().map(|a| format!("{term} AS `{a}`"))))
}

/// Assembles a fully validated, parameterized `SELECT` statement (spec
/// §4.5 addendum). Every identifier is passed through [`sanitize`]; `WHERE`
/// and `HAVING` are built with [`build_where_clause`]/[`build_having_clause`];
/// `JOIN` type and `ORDER BY` direction are checked against their whitelists.
///
/// Returns the SQL text and the positional parameters in `WHERE`-then-
/// `HAVING` order, matching the order the fragments appear in the statement.
pub fn build_select_sql(query: &SelectQuery) -> Result<(String, Vec<SqlValue>), SqlError> {
    let safe_table = sanitize(&query.table, SanitizeContext::Table)
        .ok_or_else(|| SqlError::InputValidation("invalid table name".into()))?;

    if query.columns.is_empty() {
        return Err(SqlError::InputValidation("SELECT requires at least one column".into()));
    }

    let mut select_terms = Vec::with_capacity(query.columns.len());
    let mut aliases = Vec::new();
    for col in &query.columns {
        let (bare, aliased) = select_term(col)?;
        select_terms.push(aliased.unwrap_or(bare));
        if let Some(alias) = &col.alias {
            aliases.push(alias.clone());
        }
    }

    let mut sql = format!("SELECT {}\nFROM `{}`", select_terms.join(", "), safe_table.as_str());

    for join in &query.joins {
        let join_type = join.join_type.trim().to_ascii_uppercase();
        if !ALLOWED_JOIN_TYPES.contains(&join_type.as_str()) {
            return Err(SqlError::InputValidation(format!("invalid join type: {}", join.join_type)));
        }
        let safe_join_table = sanitize(&join.table, SanitizeContext::Table)
            .ok_or_else(|| SqlError::InputValidation(format!("invalid join table: {}", join.table)))?;
        let left = quote_ref(&join.left_column)?;
        let right = quote_ref(&join.right_column)?;
        sql.push_str(&format!("\n{join_type} JOIN `{}` ON {left} = {right}", safe_join_table.as_str()));
    }

    let (where_sql, mut params) = build_where_clause(&query.conditions)?;
    if !where_sql.is_empty() {
        sql.push_str(&format!("\nWHERE {where_sql}"));
    }

    if !query.group_by.is_empty() {
        let safe_group: Result<Vec<String>, SqlError> = query.group_by.iter().map(|c| quote_ref(c)).collect();
        sql.push_str(&format!("\nGROUP BY {}", safe_group?.join(", ")));
    }

    let (having_sql, having_params) = build_having_clause(&query.having, &aliases)?;
    if !having_sql.is_empty() {
        if query.group_by.is_empty() {
            return Err(SqlError::InputValidation("HAVING requires a GROUP BY clause".into()));
        }
        sql.push_str(&format!("\nHAVING {having_sql}"));
    }
    params.extend(having_params);

    if !query.order_by.is_empty() {
        let mut terms = Vec::with_capacity(query.order_by.len());
        for ob in &query.order_by {
            let direction = ob.direction.trim().to_ascii_uppercase();
            if !ALLOWED_ORDER_DIRECTIONS.contains(&direction.as_str()) {
                return Err(SqlError::InputValidation(format!("invalid order direction: {}", ob.direction)));
            }
            let col = quote_ref(&ob.column_ref)?;
            terms.push(format!("{col} {direction}"));
        }
        sql.push_str(&format!("\nORDER BY {}", terms.join(", ")));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!("\nLIMIT {limit}"));
    }

    sql.push(';');
    Ok((sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_simple_select() {
        let query = SelectQuery {
            table: "orders".to_string(),
            columns: vec![SelectColumn::plain("id"), SelectColumn::plain("total")],
            conditions: vec![Condition::new("status", "=").with_value(SqlValue::Text("paid".to_string()))],
            order_by: vec![OrderBy {
                column_ref: "total".to_string(),
                direction: "DESC".to_string(),
            }],
            limit: Some(10),
            ..Default::default()
        };
        let (sql, params) = build_select_sql(&query).unwrap();
        assert!(sql.contains("SELECT `id`, `total`"));
        assert!(sql.contains("FROM `orders`"));
        assert!(sql.contains("WHERE `status` = ?"));
        assert!(sql.contains("ORDER BY `total` DESC"));
        assert!(sql.contains("LIMIT 10"));
        assert_eq!(params, vec![SqlValue::Text("paid".to_string())]);
    }

    #[test]
    fn having_without_group_by_is_rejected() {
        let mut c = Condition::new("total", ">").with_value(SqlValue::Int(100));
        c.func = Some("SUM".to_string());
        let query = SelectQuery {
            table: "orders".to_string(),
            columns: vec![SelectColumn::plain("id")],
            having: vec![c],
            ..Default::default()
        };
        assert!(build_select_sql(&query).is_err());
    }

    #[test]
    fn rejects_invalid_join_type() {
        let query = SelectQuery {
            table: "orders".to_string(),
            columns: vec![SelectColumn::plain("id")],
            joins: vec![Join {
                join_type: "FULL OUTER".to_string(),
                table: "customers".to_string(),
                left_column: "orders.customer_id".to_string(),
                right_column: "customers.id".to_string(),
            }],
            ..Default::default()
        };
        assert!(build_select_sql(&query).is_err());
    }

    #[test]
    fn count_star_aggregate_with_group_by() {
        let query = SelectQuery {
            table: "orders".to_string(),
            columns: vec![
                SelectColumn::plain("customer_id"),
                SelectColumn::aggregate("*", "COUNT", "order_count"),
            ],
            group_by: vec!["customer_id".to_string()],
            ..Default::default()
        };
        let (sql, _) = build_select_sql(&query).unwrap();
        assert!(sql.contains("COUNT(*) AS `order_count`"));
        assert!(sql.contains("GROUP BY `customer_id`"));
    }
}
