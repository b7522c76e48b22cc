use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use normform_sql::clause::{build_where_clause, Condition, SqlValue};
use normform_sql::sanitize::{sanitize, SanitizeContext};

use crate::dto::{ConditionReq, ExecuteDmlRequest, ExecuteDmlResponse, JsonValue};
use crate::error::ApiError;
use crate::state::AppState;

fn condition_from_req(req: ConditionReq) -> Condition {
    let mut condition = Condition::new(req.column, req.operator);
    if let Some(value) = req.value {
        condition = condition.with_value(value.into());
    }
    if let Some(connector) = req.connector {
        condition = condition.with_connector(connector);
    }
    condition.func = req.func;
    condition
}

fn quoted_table(name: &str) -> Result<String, ApiError> {
    sanitize(name, SanitizeContext::Table)
        .map(|id| format!("`{}`", id.as_str()))
        .ok_or_else(|| ApiError::bad_request(format!("invalid table name: {name}")))
}

fn quoted_column(name: &str) -> Result<String, ApiError> {
    sanitize(name, SanitizeContext::Column)
        .map(|id| format!("`{}`", id.as_str()))
        .ok_or_else(|| ApiError::bad_request(format!("invalid column name: {name}")))
}

async fn run_insert(
    state: &AppState,
    table: &str,
    values: Vec<std::collections::BTreeMap<String, JsonValue>>,
) -> Result<u64, ApiError> {
    let first = values
        .first()
        .ok_or_else(|| ApiError::bad_request("INSERT requires a non-empty 'values' list"))?;
    let columns: Vec<String> = first.keys().cloned().collect();
    let safe_table = quoted_table(table)?;
    let safe_columns: Result<Vec<String>, ApiError> = columns.iter().map(|c| quoted_column(c)).collect();
    let safe_columns = safe_columns?;

    let row_placeholder = format!("({})", vec!["?"; columns.len()].join(", "));
    let placeholders = vec![row_placeholder; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {safe_table} ({}) VALUES {placeholders};",
        safe_columns.join(", ")
    );

    let mut params: Vec<SqlValue> = Vec::with_capacity(columns.len() * values.len());
    for row in &values {
        for column in &columns {
            let value = row
                .get(column)
                .cloned()
                .ok_or_else(|| ApiError::bad_request("every row in 'values' must share the same columns"))?;
            params.push(value.into());
        }
    }

    log::debug!("executing insert: {sql}");
    Ok(state.executor.execute(&sql, &params).await?)
}

async fn run_update(
    state: &AppState,
    table: &str,
    set: std::collections::BTreeMap<String, JsonValue>,
    where_: Vec<ConditionReq>,
) -> Result<u64, ApiError> {
    if set.is_empty() {
        return Err(ApiError::bad_request("UPDATE requires a non-empty 'set'"));
    }
    if where_.is_empty() {
        return Err(ApiError::bad_request("UPDATE requires a non-empty 'where' (refusing an unconditioned update)"));
    }

    let safe_table = quoted_table(table)?;
    let mut assignments = Vec::with_capacity(set.len());
    let mut params = Vec::with_capacity(set.len());
    for (column, value) in set {
        assignments.push(format!("{} = ?", quoted_column(&column)?));
        params.push(SqlValue::from(value));
    }

    let conditions: Vec<Condition> = where_.into_iter().map(condition_from_req).collect();
    let (where_sql, where_params) = build_where_clause(&conditions).map_err(ApiError::Sql)?;
    params.extend(where_params);

    let sql = format!("UPDATE {safe_table} SET {} WHERE {where_sql};", assignments.join(", "));
    log::debug!("executing update: {sql}");
    Ok(state.executor.execute(&sql, &params).await?)
}

async fn run_delete(state: &AppState, table: &str, where_: Vec<ConditionReq>) -> Result<u64, ApiError> {
    if where_.is_empty() {
        return Err(ApiError::bad_request("DELETE requires a non-empty 'where' (refusing an unconditioned delete)"));
    }
    let safe_table = quoted_table(table)?;
    let conditions: Vec<Condition> = where_.into_iter().map(condition_from_req).collect();
    let (where_sql, params) = build_where_clause(&conditions).map_err(ApiError::Sql)?;

    let sql = format!("DELETE FROM {safe_table} WHERE {where_sql};");
    log::debug!("executing delete: {sql}");
    Ok(state.executor.execute(&sql, &params).await?)
}

pub async fn execute_dml(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteDmlRequest>,
) -> Result<Json<ExecuteDmlResponse>, ApiError> {
    let operation = req.operation.trim().to_ascii_uppercase();
    let affected_rows = match operation.as_str() {
        "INSERT" => run_insert(&state, &req.table, req.values).await?,
        "UPDATE" => run_update(&state, &req.table, req.set, req.where_).await?,
        "DELETE" => run_delete(&state, &req.table, req.where_).await?,
        other => return Err(ApiError::bad_request(format!("unsupported operation: {other}"))),
    };

    let message = match operation.as_str() {
        "INSERT" => format!("inserted {affected_rows} row(s)"),
        "UPDATE" if affected_rows == 0 => "update matched no rows".to_string(),
        "UPDATE" => format!("updated {affected_rows} row(s)"),
        "DELETE" if affected_rows == 0 => "delete matched no rows".to_string(),
        "DELETE" => format!("deleted {affected_rows} row(s)"),
        _ => unreachable!(),
    };

    Ok(Json(ExecuteDmlResponse { message, affected_rows }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_table_rejects_unsafe_identifier() {
        assert!(quoted_table("orders; DROP TABLE users").is_err());
    }

    #[test]
    fn quoted_table_backtick_quotes_a_clean_identifier() {
        assert_eq!(quoted_table("orders").unwrap(), "`orders`");
    }

    #[test]
    fn quoted_column_backtick_quotes_a_clean_identifier() {
        assert_eq!(quoted_column("total").unwrap(), "`total`");
    }

    #[test]
    fn condition_from_req_defaults_connector_and_func_to_none() {
        let req = ConditionReq {
            column: "id".to_string(),
            operator: "=".to_string(),
            value: Some(JsonValue::Int(1)),
            connector: None,
            func: None,
        };
        let condition = condition_from_req(req);
        assert!(condition.connector.is_none());
        assert!(condition.func.is_none());
    }
}
