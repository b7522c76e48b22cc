use normform_core::attribute::{Attribute, AttributeSet, LogicalType};
use normform_helpers::IndexMap;

use crate::clause::SqlValue;
use crate::ddl::{generate_create_table_sql, generate_data_migration_sql};
use crate::error::{MysqlErrorCode, SqlError};
use crate::executor::{Executor, Transaction};
use crate::sanitize::{sanitize, SanitizeContext};

/// A column as it appears on the canvas UI's in-progress schema, before any
/// introspection has happened against the live database.
#[derive(Debug, Clone)]
pub struct CanvasAttribute {
    pub name: String,
    pub raw_type: String,
    pub is_pk: bool,
    pub is_not_null: bool,
    pub is_unique: bool,
}

#[derive(Debug, Clone)]
pub struct CanvasTable {
    pub id: String,
    pub name: String,
    pub attributes: Vec<CanvasAttribute>,
}

#[derive(Debug, Clone)]
pub struct CanvasRelationship {
    pub source_table_id: String,
    pub target_table_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct CanvasApplyReport {
    pub created_tables: Vec<String>,
    pub dropped_tables: Vec<String>,
    pub added_foreign_keys: Vec<String>,
    pub errors: Vec<String>,
}

async fn show_tables(executor: &dyn Executor) -> Result<Vec<String>, SqlError> {
    let result = executor.query("SHOW TABLES;", &[]).await?;
    let mut tables = Vec::with_capacity(result.rows.len());
    for row in result.rows {
        if let Some(SqlValue::Text(name)) = row.into_iter().next() {
            tables.push(name);
        }
    }
    Ok(tables)
}

/// Applies a canvas diff against the live database: drops tables removed
/// from the canvas, destructively re-creates every canvas table, then adds
/// foreign keys (§4.6 "canvas diff apply").
///
/// Duplicate-column (1060) and duplicate-constraint (1061) errors during FK
/// creation are tolerated and recorded without aborting; any other FK error
/// (notably 1822, constraint failure) is recorded as an error and the
/// overall report reflects partial success.
pub async fn apply_canvas_diff(
    executor: &dyn Executor,
    tables: &[CanvasTable],
    relationships: &[CanvasRelationship],
) -> Result<CanvasApplyReport, SqlError> {
    let mut report = CanvasApplyReport::default();

    let existing = show_tables(executor).await?;
    let canvas_names: Vec<String> = tables
        .iter()
        .filter_map(|t| sanitize(&t.name, SanitizeContext::Table).map(|id| id.into_inner()))
        .collect();

    let to_explicitly_drop: Vec<&String> = existing.iter().filter(|t| !canvas_names.contains(t)).collect();

    let mut tx = executor.begin().await?;

    let outcome = apply_canvas_diff_in_tx(
        tx.as_mut(),
        tables,
        relationships,
        &to_explicitly_drop,
        &canvas_names,
        &mut report,
    )
    .await;

    match outcome {
        Ok(()) => {
            tx.commit().await?;
            Ok(report)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

async fn apply_canvas_diff_in_tx(
    tx: &mut dyn Transaction,
    tables: &[CanvasTable],
    relationships: &[CanvasRelationship],
    to_explicitly_drop: &[&String],
    canvas_names: &[String],
    report: &mut CanvasApplyReport,
) -> Result<(), SqlError> {
    tx.execute("SET FOREIGN_KEY_CHECKS=0;", &[]).await?;

    for table in to_explicitly_drop {
        tx.execute(&format!("DROP TABLE IF EXISTS `{table}`;"), &[]).await?;
        report.dropped_tables.push((*table).clone());
    }
    for name in canvas_names.iter().rev() {
        tx.execute(&format!("DROP TABLE IF EXISTS `{name}`;"), &[]).await?;
        if !report.dropped_tables.contains(name) {
            report.dropped_tables.push(name.clone());
        }
    }

    tx.execute("SET FOREIGN_KEY_CHECKS=1;", &[]).await?;

    let mut table_by_id: IndexMap<String, String> = IndexMap::default();

    for table in tables {
        let safe_name = sanitize(&table.name, SanitizeContext::Table)
            .ok_or_else(|| SqlError::InputValidation(format!("invalid table name: {}", table.name)))?;
        table_by_id.insert(table.id.clone(), safe_name.as_str().to_string());

        let mut column_defs = Vec::with_capacity(table.attributes.len());
        let mut pk_cols = Vec::new();
        for attr in &table.attributes {
            let safe_col = sanitize(&attr.name, SanitizeContext::Column)
                .ok_or_else(|| SqlError::InputValidation(format!("invalid column name: {}", attr.name)))?;
            let logical_type = LogicalType::from_raw(&attr.raw_type);
            let mut def = format!("`{}` {}", safe_col.as_str(), logical_type.as_sql());
            if attr.is_not_null || attr.is_pk {
                def.push_str(" NOT NULL");
            }
            if attr.is_unique && !attr.is_pk {
                def.push_str(" UNIQUE");
            }
            if attr.is_pk {
                pk_cols.push(format!("`{}`", safe_col.as_str()));
            }
            column_defs.push(def);
        }

        let mut sql = format!("CREATE TABLE `{}` (\n", safe_name.as_str());
        sql.push_str(&column_defs.iter().map(|c| format!("    {c}")).collect::<Vec<_>>().join(",\n"));
        if !pk_cols.is_empty() {
            sql.push_str(&format!(",\n    PRIMARY KEY ({})", pk_cols.join(", ")));
        }
        sql.push_str("\n);");

        tx.execute(&sql, &[]).await?;
        report.created_tables.push(safe_name.as_str().to_string());
    }

    for rel in relationships {
        let Some(src) = table_by_id.get(&rel.source_table_id) else {
            continue;
        };
        let Some(tgt) = table_by_id.get(&rel.target_table_id) else {
            continue;
        };
        let target_table = tables.iter().find(|t| t.id == rel.target_table_id);
        let Some(target_table) = target_table else { continue };
        let Some(target_pk) = target_table.attributes.iter().find(|a| a.is_pk) else {
            continue;
        };
        let safe_pk = sanitize(&target_pk.name, SanitizeContext::Column).unwrap();
        let fk_col = format!("{tgt}_{}", safe_pk.as_str());
        let constraint_name = format!("fk_{src}_{tgt}_{fk_col}");
        let logical_type = LogicalType::from_raw(&target_pk.raw_type);

        let add_column_sql = format!("ALTER TABLE `{src}` ADD COLUMN `{fk_col}` {};", logical_type.as_sql());
        match tx.execute(&add_column_sql, &[]).await {
            Ok(_) => {}
            Err(SqlError::Database { code: MysqlErrorCode::DuplicateColumn, .. }) => {}
            Err(e) => {
                report.errors.push(format!("failed to add column '{fk_col}' to '{src}': {e}"));
                continue;
            }
        }

        let add_constraint_sql = format!(
            "ALTER TABLE `{src}` ADD CONSTRAINT `{constraint_name}` FOREIGN KEY (`{fk_col}`) REFERENCES `{tgt}` (`{}`);",
            safe_pk.as_str()
        );
        match tx.execute(&add_constraint_sql, &[]).await {
            Ok(_) => report.added_foreign_keys.push(constraint_name),
            Err(SqlError::Database { code: MysqlErrorCode::DuplicateKey, .. }) => {}
            Err(SqlError::Database { code: MysqlErrorCode::FkConstraintFailed, message, .. }) => {
                report.errors.push(format!("foreign key '{constraint_name}' failed: {message}"));
            }
            Err(e) => {
                report.errors.push(format!("foreign key '{constraint_name}' failed: {e}"));
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct DecomposedTableSpec {
    pub new_table_name: String,
    pub attributes: AttributeSet,
    pub primary_key: AttributeSet,
}

impl From<&normform_analyze::decomposer::SubSchema> for DecomposedTableSpec {
    fn from(sub: &normform_analyze::decomposer::SubSchema) -> Self {
        DecomposedTableSpec {
            new_table_name: sub.name.clone(),
            attributes: sub.attributes.clone(),
            primary_key: sub.primary_key.clone(),
        }
    }
}

/// Builds the table specs an `apply_decomposition` call needs directly from
/// a computed [`normform_analyze::decomposer::Decomposition`].
pub fn specs_from_decomposition(decomposition: &normform_analyze::decomposer::Decomposition) -> Vec<DecomposedTableSpec> {
    decomposition.sub_schemas.iter().map(DecomposedTableSpec::from).collect()
}

#[derive(Debug, Clone, Default)]
pub struct DecompositionApplyReport {
    pub created_tables: Vec<String>,
    pub data_migrated_to: Vec<String>,
    pub original_table_dropped: bool,
}

/// Applies a decomposition: creates each new sub-schema, migrates its
/// distinct data out of the original table, then drops the original —
/// all inside a single transaction (§4.6 "decomposition apply").
pub async fn apply_decomposition(
    executor: &dyn Executor,
    original_table: &str,
    sub_schemas: &[DecomposedTableSpec],
    attributes_info: &IndexMap<String, Attribute>,
) -> Result<DecompositionApplyReport, SqlError> {
    let mut report = DecompositionApplyReport::default();
    let mut tx = executor.begin().await?;

    let outcome: Result<(), SqlError> = async {
        for spec in sub_schemas {
            tx.execute(&format!("DROP TABLE IF EXISTS `{}`;", spec.new_table_name), &[])
                .await?;
            let create_sql =
                generate_create_table_sql(&spec.new_table_name, &spec.attributes, &spec.primary_key, attributes_info)?;
            tx.execute(&create_sql, &[]).await?;
            report.created_tables.push(spec.new_table_name.clone());
        }
        for spec in sub_schemas {
            let migrate_sql = generate_data_migration_sql(original_table, &spec.new_table_name, &spec.attributes)?;
            tx.execute(&migrate_sql, &[]).await?;
            report.data_migrated_to.push(spec.new_table_name.clone());
        }
        tx.execute(&format!("DROP TABLE `{original_table}`;"), &[]).await?;
        report.original_table_dropped = true;
        Ok(())
    }
    .await;

    match outcome {
        Ok(()) => {
            tx.commit().await?;
            Ok(report)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use normform_core::attribute::attribute_set;

    use super::*;
    use crate::executor::QueryResult;

    #[derive(Default)]
    struct MockState {
        executed: Vec<String>,
        tables: Vec<String>,
    }

    struct MockExecutor {
        state: Arc<Mutex<MockState>>,
    }

    struct MockTransaction {
        state: Arc<Mutex<MockState>>,
    }

    fn show_tables_result(state: &Mutex<MockState>) -> QueryResult {
        let rows = state
            .lock()
            .unwrap()
            .tables
            .iter()
            .map(|t| vec![SqlValue::Text(t.clone())])
            .collect();
        QueryResult { columns: vec!["Tables_in_db".to_string()], rows }
    }

    #[async_trait]
    impl Executor for MockExecutor {
        async fn query(&self, sql: &str, _params: &[SqlValue]) -> Result<QueryResult, SqlError> {
            if sql.trim() == "SHOW TABLES;" {
                return Ok(show_tables_result(&self.state));
            }
            Ok(QueryResult::default())
        }

        async fn execute(&self, sql: &str, _params: &[SqlValue]) -> Result<u64, SqlError> {
            self.state.lock().unwrap().executed.push(sql.to_string());
            Ok(0)
        }

        async fn begin(&self) -> Result<Box<dyn Transaction>, SqlError> {
            Ok(Box::new(MockTransaction { state: self.state.clone() }))
        }
    }

    #[async_trait]
    impl Transaction for MockTransaction {
        async fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<QueryResult, SqlError> {
            if sql.trim() == "SHOW TABLES;" {
                return Ok(show_tables_result(&self.state));
            }
            Ok(QueryResult::default())
        }

        async fn execute(&mut self, sql: &str, _params: &[SqlValue]) -> Result<u64, SqlError> {
            self.state.lock().unwrap().executed.push(sql.to_string());
            Ok(1)
        }

        async fn commit(self: Box<Self>) -> Result<(), SqlError> {
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), SqlError> {
            Ok(())
        }
    }

    fn pk_attribute(name: &str, raw_type: &str) -> CanvasAttribute {
        CanvasAttribute {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            is_pk: true,
            is_not_null: true,
            is_unique: false,
        }
    }

    fn plain_attribute(name: &str, raw_type: &str) -> CanvasAttribute {
        CanvasAttribute {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            is_pk: false,
            is_not_null: false,
            is_unique: false,
        }
    }

    #[tokio::test]
    async fn apply_canvas_diff_creates_table_and_drops_removed() {
        let state = Arc::new(Mutex::new(MockState { tables: vec!["stale_table".to_string()], ..Default::default() }));
        let executor = MockExecutor { state: state.clone() };

        let tables = vec![CanvasTable {
            id: "t1".to_string(),
            name: "customers".to_string(),
            attributes: vec![pk_attribute("id", "INT"), plain_attribute("name", "VARCHAR(255)")],
        }];

        let report = apply_canvas_diff(&executor, &tables, &[]).await.unwrap();

        assert_eq!(report.created_tables, vec!["customers".to_string()]);
        assert!(report.dropped_tables.contains(&"stale_table".to_string()));
        assert!(report.errors.is_empty());

        let executed = state.lock().unwrap().executed.clone();
        assert!(executed.iter().any(|s| s.contains("DROP TABLE IF EXISTS `stale_table`")));
        assert!(executed.iter().any(|s| s.contains("CREATE TABLE `customers`")));
        assert!(executed.iter().any(|s| s.contains("`id` INT NOT NULL")));
        assert!(executed.iter().any(|s| s.contains("PRIMARY KEY (`id`)")));
    }

    #[tokio::test]
    async fn apply_canvas_diff_adds_foreign_key_for_relationship() {
        let state = Arc::new(Mutex::new(MockState::default()));
        let executor = MockExecutor { state: state.clone() };

        let tables = vec![
            CanvasTable { id: "orders".to_string(), name: "orders".to_string(), attributes: vec![pk_attribute("id", "INT")] },
            CanvasTable {
                id: "customers".to_string(),
                name: "customers".to_string(),
                attributes: vec![pk_attribute("id", "INT")],
            },
        ];
        let relationships =
            vec![CanvasRelationship { source_table_id: "orders".to_string(), target_table_id: "customers".to_string() }];

        let report = apply_canvas_diff(&executor, &tables, &relationships).await.unwrap();

        assert_eq!(report.added_foreign_keys, vec!["fk_orders_customers_customers_id".to_string()]);
        let executed = state.lock().unwrap().executed.clone();
        assert!(executed.iter().any(|s| s.contains("ADD COLUMN `customers_id`")));
        assert!(executed.iter().any(|s| s.contains("ADD CONSTRAINT `fk_orders_customers_customers_id`")));
    }

    #[tokio::test]
    async fn apply_decomposition_creates_migrates_and_drops_original() {
        let state = Arc::new(Mutex::new(MockState::default()));
        let executor = MockExecutor { state: state.clone() };

        let specs = vec![DecomposedTableSpec {
            new_table_name: "orders_1".to_string(),
            attributes: attribute_set(["id", "total"]),
            primary_key: attribute_set(["id"]),
        }];
        let mut attributes_info = IndexMap::default();
        attributes_info.insert("id".to_string(), Attribute::new("id", LogicalType::Int));
        attributes_info.insert("total".to_string(), Attribute::new("total", LogicalType::Int));

        let report = apply_decomposition(&executor, "orders", &specs, &attributes_info).await.unwrap();

        assert_eq!(report.created_tables, vec!["orders_1".to_string()]);
        assert_eq!(report.data_migrated_to, vec!["orders_1".to_string()]);
        assert!(report.original_table_dropped);

        let executed = state.lock().unwrap().executed.clone();
        let create_pos = executed.iter().position(|s| s.contains("CREATE TABLE `orders_1`")).unwrap();
        let migrate_pos = executed.iter().position(|s| s.contains("INSERT INTO `orders_1`")).unwrap();
        let drop_pos = executed.iter().position(|s| s == "DROP TABLE `orders`;").unwrap();
        assert!(create_pos < migrate_pos);
        assert!(migrate_pos < drop_pos);
    }

    #[test]
    fn decomposed_table_spec_from_sub_schema() {
        let sub = normform_analyze::decomposer::SubSchema {
            name: "orders_1".to_string(),
            attributes: attribute_set(["id", "total"]),
            primary_key: attribute_set(["id"]),
        };
        let spec = DecomposedTableSpec::from(&sub);
        assert_eq!(spec.new_table_name, "orders_1");
        assert_eq!(spec.attributes, sub.attributes);
        assert_eq!(spec.primary_key, sub.primary_key);
    }
}
