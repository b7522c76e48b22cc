use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use normform_core::attribute::LogicalType;
use normform_sql::clause::SqlValue;
use normform_sql::orchestrator::{apply_canvas_diff, CanvasAttribute, CanvasRelationship, CanvasTable};
use normform_sql::sanitize::{sanitize, SanitizeContext};

use crate::dto::{
    ApplySchemaRequest, ApplySchemaResponse, AttributeDescription, CurrentSchemaResponse, RelationshipDescription,
    TableDescription, TableDetailsResponse, TablesResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// 207 when the canvas apply recorded any per-table/per-FK error alongside
/// its successes, 200 otherwise (spec §6/§7 multi-status contract).
fn apply_schema_status(errors: &[String]) -> StatusCode {
    if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    }
}

pub async fn apply_schema(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApplySchemaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tables: Vec<CanvasTable> = req
        .tables
        .into_iter()
        .map(|t| CanvasTable {
            id: t.id,
            name: t.name,
            attributes: t
                .attributes
                .into_iter()
                .map(|a| CanvasAttribute {
                    name: a.name,
                    raw_type: a.type_,
                    is_pk: a.is_pk,
                    is_not_null: a.is_not_null,
                    is_unique: a.is_unique,
                })
                .collect(),
        })
        .collect();

    let relationships: Vec<CanvasRelationship> = req
        .relationships
        .into_iter()
        .map(|r| CanvasRelationship {
            source_table_id: r.source_table_id,
            target_table_id: r.target_table_id,
        })
        .collect();

    log::info!("applying canvas schema diff: {} table(s)", tables.len());
    let report = apply_canvas_diff(state.executor.as_ref(), &tables, &relationships).await?;

    Ok((
        apply_schema_status(&report.errors),
        Json(ApplySchemaResponse {
            created_tables: report.created_tables,
            dropped_tables: report.dropped_tables,
            added_foreign_keys: report.added_foreign_keys,
            errors: report.errors,
        }),
    ))
}

pub async fn list_tables(State(state): State<Arc<AppState>>) -> Result<Json<TablesResponse>, ApiError> {
    let result = state.executor.query("SHOW TABLES;", &[]).await?;
    let tables = result
        .rows
        .into_iter()
        .filter_map(|row| match row.into_iter().next() {
            Some(SqlValue::Text(name)) => Some(name),
            _ => None,
        })
        .collect();
    Ok(Json(TablesResponse { tables }))
}

pub async fn table_details(
    State(state): State<Arc<AppState>>,
    Path(table_name): Path<String>,
) -> Result<Json<TableDetailsResponse>, ApiError> {
    let safe_name = sanitize(&table_name, SanitizeContext::Table).ok_or_else(|| ApiError::bad_request("invalid table name"))?;

    let describe_sql = format!("DESCRIBE `{}`;", safe_name.as_str());
    let result = state.executor.query(&describe_sql, &[]).await.map_err(|e| match e {
        normform_sql::error::SqlError::Database {
            code: normform_sql::error::MysqlErrorCode::UnknownTable,
            ..
        } => ApiError::NotFound(format!("table '{}' not found", safe_name.as_str())),
        other => ApiError::Sql(other),
    })?;

    let attributes = describe_rows_to_attributes(&result);
    Ok(Json(TableDetailsResponse {
        table_name: safe_name.into_inner(),
        attributes,
    }))
}

fn describe_rows_to_attributes(result: &normform_sql::executor::QueryResult) -> Vec<AttributeDescription> {
    let idx = |name: &str| result.columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let field_idx = idx("Field");
    let type_idx = idx("Type");
    let null_idx = idx("Null");
    let key_idx = idx("Key");

    result
        .rows
        .iter()
        .filter_map(|row| {
            let name = field_idx.and_then(|i| row.get(i)).and_then(text_value)?;
            let raw_type = type_idx.and_then(|i| row.get(i)).and_then(text_value).unwrap_or_default();
            let is_not_null = null_idx
                .and_then(|i| row.get(i))
                .and_then(text_value)
                .map(|v| v.eq_ignore_ascii_case("NO"))
                .unwrap_or(false);
            let key = key_idx.and_then(|i| row.get(i)).and_then(text_value).unwrap_or_default();

            Some(AttributeDescription {
                name,
                type_: LogicalType::from_raw(&raw_type).as_sql().to_string(),
                is_pk: key.eq_ignore_ascii_case("PRI"),
                is_not_null,
                is_unique: key.eq_ignore_ascii_case("UNI"),
            })
        })
        .collect()
}

fn text_value(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(s) => Some(s.clone()),
        _ => None,
    }
}

pub async fn current_schema(State(state): State<Arc<AppState>>) -> Result<Json<CurrentSchemaResponse>, ApiError> {
    let mut response = CurrentSchemaResponse::default();

    let tables_result = state.executor.query("SHOW TABLES;", &[]).await?;
    let table_names: Vec<String> = tables_result
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().next().and_then(|v| text_value(&v)))
        .collect();

    if table_names.is_empty() {
        return Ok(Json(response));
    }

    let cols_sql = "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, COLUMN_KEY \
        FROM INFORMATION_SCHEMA.COLUMNS \
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION;";

    for table_name in &table_names {
        let result = state
            .executor
            .query(
                cols_sql,
                &[
                    SqlValue::Text(state.config.mysql_db.clone()),
                    SqlValue::Text(table_name.clone()),
                ],
            )
            .await?;

        let idx = |name: &str| result.columns.iter().position(|c| c.eq_ignore_ascii_case(name));
        let name_idx = idx("COLUMN_NAME");
        let type_idx = idx("DATA_TYPE");
        let null_idx = idx("IS_NULLABLE");
        let key_idx = idx("COLUMN_KEY");

        let attributes = result
            .rows
            .iter()
            .filter_map(|row| {
                let name = name_idx.and_then(|i| row.get(i)).and_then(text_value)?;
                let raw_type = type_idx.and_then(|i| row.get(i)).and_then(text_value).unwrap_or_default();
                let is_not_null = null_idx
                    .and_then(|i| row.get(i))
                    .and_then(text_value)
                    .map(|v| v.eq_ignore_ascii_case("NO"))
                    .unwrap_or(false);
                let key = key_idx.and_then(|i| row.get(i)).and_then(text_value).unwrap_or_default();
                Some(AttributeDescription {
                    name,
                    type_: LogicalType::from_raw(&raw_type).as_sql().to_string(),
                    is_pk: key.eq_ignore_ascii_case("PRI"),
                    is_not_null,
                    is_unique: key.eq_ignore_ascii_case("UNI"),
                })
            })
            .collect();

        response.tables.insert(
            table_name.clone(),
            TableDescription {
                name: table_name.clone(),
                attributes,
            },
        );
    }

    let fks_sql = "SELECT TABLE_NAME, CONSTRAINT_NAME, REFERENCED_TABLE_NAME \
        FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE \
        WHERE TABLE_SCHEMA = ? AND REFERENCED_TABLE_SCHEMA IS NOT NULL;";
    let fk_result = state
        .executor
        .query(fks_sql, &[SqlValue::Text(state.config.mysql_db.clone())])
        .await?;

    let idx = |name: &str| fk_result.columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let table_idx = idx("TABLE_NAME");
    let constraint_idx = idx("CONSTRAINT_NAME");
    let referenced_idx = idx("REFERENCED_TABLE_NAME");

    let mut seen: BTreeMap<String, ()> = BTreeMap::new();
    for row in &fk_result.rows {
        let Some(source) = table_idx.and_then(|i| row.get(i)).and_then(text_value) else { continue };
        let Some(target) = referenced_idx.and_then(|i| row.get(i)).and_then(text_value) else { continue };
        let Some(constraint) = constraint_idx.and_then(|i| row.get(i)).and_then(text_value) else { continue };

        if response.tables.contains_key(&source) && response.tables.contains_key(&target) {
            let id = format!("fk-{constraint}");
            if seen.insert(id.clone(), ()).is_none() {
                response.relationships.push(RelationshipDescription {
                    id,
                    source,
                    target,
                });
            }
        }
    }

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_schema_status_is_ok_with_no_errors() {
        assert_eq!(apply_schema_status(&[]), StatusCode::OK);
    }

    #[test]
    fn apply_schema_status_is_multi_status_with_any_error() {
        let errors = vec!["foreign key 'fk_a_b' failed: ...".to_string()];
        assert_eq!(apply_schema_status(&errors), StatusCode::MULTI_STATUS);
    }
}
