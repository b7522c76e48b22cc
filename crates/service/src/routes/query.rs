use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use normform_sql::clause::Condition;
use normform_sql::select::{build_select_sql, Join, OrderBy, SelectColumn, SelectQuery};

use crate::dto::{ConditionReq, ExecuteSelectRequest, ExecuteSelectResponse, JsonValue, JoinReq, OrderByReq, SelectItemReq};
use crate::error::ApiError;
use crate::state::AppState;

/// Rejects a GROUP BY column that references a table not reachable via
/// FROM/JOIN, or (when aggregates are present) one that isn't also a plain,
/// non-aggregated SELECT column — matching `query_routes.py`'s GROUP BY
/// checks, both 400s there.
fn validate_group_by(group_by: &[String], select: &[SelectItemReq], tables_in_query: &HashSet<&str>) -> Result<(), ApiError> {
    let has_aggregates = select.iter().any(|item| matches!(item, SelectItemReq::Aggregate { .. }));
    let allowed_group_by_cols: HashSet<String> = select
        .iter()
        .filter_map(|item| match item {
            SelectItemReq::Column { table, column } => Some(format!("{table}.{column}")),
            SelectItemReq::Aggregate { .. } => None,
        })
        .collect();

    for col_ref in group_by {
        let Some((table, column)) = col_ref.split_once('.') else {
            return Err(ApiError::bad_request(format!("invalid GROUP BY format: {col_ref}")));
        };
        if !tables_in_query.contains(table) {
            return Err(ApiError::bad_request(format!("GROUP BY column '{col_ref}' uses table not in query")));
        }
        if has_aggregates && !allowed_group_by_cols.contains(&format!("{table}.{column}")) {
            return Err(ApiError::bad_request(format!(
                "GROUP BY column '{col_ref}' must be in non-aggregated SELECT list"
            )));
        }
    }
    Ok(())
}

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

/// Qualifies `table.column` only when more than one `FROM` table is in
/// play, matching `query_routes.py`'s `qualify = len(from_tables) > 1`.
fn select_column_from_req(item: SelectItemReq, qualify: bool) -> SelectColumn {
    match item {
        SelectItemReq::Column { table, column } => {
            let column_ref = if qualify { format!("{table}.{column}") } else { column };
            SelectColumn::plain(column_ref)
        }
        SelectItemReq::Aggregate {
            table,
            column,
            func,
            alias,
        } => {
            let column_ref = if column == "*" {
                "*".to_string()
            } else if qualify {
                format!("{table}.{column}")
            } else {
                column.clone()
            };
            let alias = alias.unwrap_or_else(|| format!("{}_{table}_{column}", func.to_ascii_lowercase()));
            SelectColumn::aggregate(column_ref, func, alias)
        }
    }
}

fn join_from_req(req: JoinReq) -> Join {
    Join {
        join_type: req.join_type,
        table: req.right_table.clone(),
        left_column: format!("{}.{}", req.left_table, req.left_col),
        right_column: format!("{}.{}", req.right_table, req.right_col),
    }
}

fn order_by_from_req(req: OrderByReq) -> OrderBy {
    OrderBy {
        column_ref: req.term,
        direction: req.direction,
    }
}

pub async fn execute_select(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteSelectRequest>,
) -> Result<Json<ExecuteSelectResponse>, ApiError> {
    if req.from.is_empty() {
        return Err(ApiError::bad_request("'from' must name at least one table"));
    }
    if req.select.is_empty() {
        return Err(ApiError::bad_request("'select' must name at least one column"));
    }
    if req.from.len() > 1 && req.joins.is_empty() {
        return Err(ApiError::bad_request("multiple 'from' tables require 'joins'"));
    }

    let joins: Vec<Join> = req.joins.into_iter().map(join_from_req).collect();
    let joined_tables: Vec<&str> = joins.iter().map(|j| j.table.as_str()).collect();
    for table in req.from.iter().skip(1) {
        if !joined_tables.contains(&table.as_str()) {
            return Err(ApiError::bad_request(format!("table '{table}' is not reachable via 'joins'")));
        }
    }

    let tables_in_query: HashSet<&str> = req.from.iter().map(String::as_str).collect();
    validate_group_by(&req.group_by, &req.select, &tables_in_query)?;
    let qualify = req.from.len() > 1;

    let query = SelectQuery {
        table: req.from[0].clone(),
        columns: req.select.into_iter().map(|item| select_column_from_req(item, qualify)).collect(),
        joins,
        conditions: req.where_.into_iter().map(condition_from_req).collect(),
        group_by: req.group_by,
        having: req.having.into_iter().map(condition_from_req).collect(),
        order_by: req.order_by.into_iter().map(order_by_from_req).collect(),
        limit: None,
    };

    let (sql, params) = build_select_sql(&query).map_err(ApiError::Sql)?;
    log::debug!("executing select: {sql}");
    let result = state.executor.query(&sql, &params).await?;

    let rows = result
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(JsonValue::from).collect())
        .collect();

    Ok(Json(ExecuteSelectResponse {
        columns: result.columns,
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::JsonValue;
    use normform_sql::clause::SqlValue as CoreSqlValue;

    #[test]
    fn condition_from_req_carries_value_connector_and_func() {
        let req = ConditionReq {
            column: "orders.total".to_string(),
            operator: ">".to_string(),
            value: Some(JsonValue::Int(100)),
            connector: Some("AND".to_string()),
            func: Some("SUM".to_string()),
        };
        let condition = condition_from_req(req);
        assert_eq!(condition.column_ref, "orders.total");
        assert_eq!(condition.operator, ">");
        assert!(matches!(condition.value, Some(CoreSqlValue::Int(100))));
        assert_eq!(condition.connector.as_deref(), Some("AND"));
        assert_eq!(condition.func.as_deref(), Some("SUM"));
    }

    #[test]
    fn join_from_req_builds_fully_qualified_columns() {
        let req = JoinReq {
            join_type: "LEFT".to_string(),
            left_table: "orders".to_string(),
            left_col: "customer_id".to_string(),
            right_table: "customers".to_string(),
            right_col: "id".to_string(),
        };
        let join = join_from_req(req);
        assert_eq!(join.table, "customers");
        assert_eq!(join.left_column, "orders.customer_id");
        assert_eq!(join.right_column, "customers.id");
    }

    #[test]
    fn select_column_from_req_defaults_aggregate_alias() {
        let item = SelectItemReq::Aggregate {
            table: "orders".to_string(),
            column: "total".to_string(),
            func: "SUM".to_string(),
            alias: None,
        };
        let column = select_column_from_req(item, true);
        assert_eq!(column.alias.as_deref(), Some("sum_orders_total"));
    }

    #[test]
    fn select_column_from_req_allows_star_aggregate() {
        let item = SelectItemReq::Aggregate {
            table: "orders".to_string(),
            column: "*".to_string(),
            func: "COUNT".to_string(),
            alias: Some("order_count".to_string()),
        };
        let column = select_column_from_req(item, true);
        assert_eq!(column.column_ref, "*");
        assert_eq!(column.alias.as_deref(), Some("order_count"));
    }

    #[test]
    fn select_column_from_req_qualifies_only_for_multi_table_queries() {
        let item = SelectItemReq::Column {
            table: "orders".to_string(),
            column: "total".to_string(),
        };
        let unqualified = select_column_from_req(item.clone(), false);
        assert_eq!(unqualified.column_ref, "total");
        let qualified = select_column_from_req(item, true);
        assert_eq!(qualified.column_ref, "orders.total");
    }

    #[test]
    fn validate_group_by_rejects_unqualified_column() {
        let tables: HashSet<&str> = ["orders"].into_iter().collect();
        let err = validate_group_by(&["total".to_string()], &[], &tables).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_group_by_rejects_table_not_in_query() {
        let tables: HashSet<&str> = ["orders"].into_iter().collect();
        let err = validate_group_by(&["customers.id".to_string()], &[], &tables).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_group_by_rejects_column_not_in_non_aggregated_select_when_aggregates_present() {
        let tables: HashSet<&str> = ["orders"].into_iter().collect();
        let select = vec![SelectItemReq::Aggregate {
            table: "orders".to_string(),
            column: "total".to_string(),
            func: "SUM".to_string(),
            alias: None,
        }];
        let err = validate_group_by(&["orders.customer_id".to_string()], &select, &tables).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_group_by_allows_plain_select_column_with_aggregates() {
        let tables: HashSet<&str> = ["orders"].into_iter().collect();
        let select = vec![
            SelectItemReq::Column {
                table: "orders".to_string(),
                column: "customer_id".to_string(),
            },
            SelectItemReq::Aggregate {
                table: "orders".to_string(),
                column: "total".to_string(),
                func: "SUM".to_string(),
                alias: None,
            },
        ];
        assert!(validate_group_by(&["orders.customer_id".to_string()], &select, &tables).is_ok());
    }
}
