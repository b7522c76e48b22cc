use normform_core::attribute::{Attribute, AttributeSet, LogicalType};
use normform_helpers::IndexMap;

use crate::error::SqlError;
use crate::sanitize::{sanitize, SanitizeContext};

/// Generates `CREATE TABLE` DDL for a decomposed sub-schema.
///
/// Columns are emitted in lexicographic order for determinism. A column
/// with no type information in `attributes_info` defaults to `TEXT`,
/// matching the original schema-introspection fallback.
pub fn generate_create_table_sql(
    table_name: &str,
    attrs: &AttributeSet,
    primary_key: &AttributeSet,
    attributes_info: &IndexMap<String, Attribute>,
) -> Result<String, SqlError> {
    let safe_table = sanitize(table_name, SanitizeContext::Table)
        .ok_or_else(|| SqlError::InputValidation("invalid table name".into()))?;

    if attrs.is_empty() {
        return Err(SqlError::InputValidation(format!(
            "cannot create table '{safe_table}' with no columns"
        )));
    }
    if primary_key.is_empty() {
        return Err(SqlError::InputValidation(format!(
            "cannot create table '{safe_table}' without a primary key"
        )));
    }

    let mut sorted_attrs = normform_core::attribute::sorted(attrs);
    sorted_attrs.sort_unstable();

    let mut column_defs = Vec::with_capacity(sorted_attrs.len());
    let mut pk_cols = Vec::new();

    for attr in sorted_attrs {
        let safe_col = sanitize(attr, SanitizeContext::Column)
            .ok_or_else(|| SqlError::InputValidation(format!("invalid column name: {attr}")))?;
        let logical_type = attributes_info
            .get(attr)
            .map(|info| info.logical_type)
            .unwrap_or(LogicalType::Text);

        let mut def = format!("`{}` {}", safe_col.as_str(), logical_type.as_sql());
        if primary_key.contains(attr) {
            def.push_str(" NOT NULL");
            pk_cols.push(format!("`{}`", safe_col.as_str()));
        }
        column_defs.push(def);
    }

    if pk_cols.is_empty() {
        return Err(SqlError::InputValidation(format!(
            "primary key columns {primary_key:?} not found in attributes {attrs:?} for table {safe_table}"
        )));
    }

    let mut sql = format!("CREATE TABLE `{}` (\n", safe_table.as_str());
    sql.push_str(&column_defs.iter().map(|c| format!("    {c}")).collect::<Vec<_>>().join(",\n"));
    sql.push_str(&format!(",\n    PRIMARY KEY ({})", pk_cols.join(", ")));
    sql.push_str("\n);");
    Ok(sql)
}

/// Generates `INSERT INTO ... SELECT DISTINCT ...` data-migration DDL for
/// moving a decomposed sub-schema's data out of the original table.
pub fn generate_data_migration_sql(original_table: &str, new_table: &str, attrs: &AttributeSet) -> Result<String, SqlError> {
    let safe_original = sanitize(original_table, SanitizeContext::Table)
        .ok_or_else(|| SqlError::InputValidation("invalid original table name".into()))?;
    let safe_new = sanitize(new_table, SanitizeContext::Table)
        .ok_or_else(|| SqlError::InputValidation("invalid new table name".into()))?;

    let mut sorted_attrs = normform_core::attribute::sorted(attrs);
    sorted_attrs.sort_unstable();
    let safe_cols: Result<Vec<String>, SqlError> = sorted_attrs
        .into_iter()
        .map(|a| {
            sanitize(a, SanitizeContext::Column)
                .map(|id| format!("`{}`", id.as_str()))
                .ok_or_else(|| SqlError::InputValidation(format!("invalid column name: {a}")))
        })
        .collect();
    let safe_cols = safe_cols?;
    if safe_cols.is_empty() {
        return Err(SqlError::InputValidation(format!(
            "no columns specified for data migration to {}",
            safe_new.as_str()
        )));
    }
    let cols_str = safe_cols.join(", ");

    Ok(format!(
        "INSERT INTO `{new}` ({cols})\nSELECT DISTINCT {cols}\nFROM `{orig}`;",
        new = safe_new.as_str(),
        cols = cols_str,
        orig = safe_original.as_str(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use normform_core::attribute::attribute_set;

    fn attrs_info() -> IndexMap<String, Attribute> {
        let mut info = IndexMap::default();
        info.insert("id".to_string(), Attribute::new("id", LogicalType::Int));
        info.insert("name".to_string(), Attribute::new("name", LogicalType::Varchar255));
        info
    }

    #[test]
    fn create_table_orders_columns_lexicographically_and_marks_pk_not_null() {
        let attrs = attribute_set(["name", "id"]);
        let pk = attribute_set(["id"]);
        let sql = generate_create_table_sql("customers", &attrs, &pk, &attrs_info()).unwrap();
        assert!(sql.contains("CREATE TABLE `customers` ("));
        let id_pos = sql.find("`id` INT NOT NULL").unwrap();
        let name_pos = sql.find("`name` VARCHAR(255)").unwrap();
        assert!(id_pos < name_pos);
        assert!(sql.contains("PRIMARY KEY (`id`)"));
    }

    #[test]
    fn create_table_defaults_unknown_column_to_text() {
        let attrs = attribute_set(["id", "notes"]);
        let pk = attribute_set(["id"]);
        let sql = generate_create_table_sql("t", &attrs, &pk, &attrs_info()).unwrap();
        assert!(sql.contains("`notes` TEXT"));
    }

    #[test]
    fn create_table_rejects_missing_primary_key() {
        let attrs = attribute_set(["id"]);
        let pk = AttributeSet::default();
        assert!(generate_create_table_sql("t", &attrs, &pk, &attrs_info()).is_err());
    }

    #[test]
    fn data_migration_selects_distinct_sorted_columns() {
        let attrs = attribute_set(["name", "id"]);
        let sql = generate_data_migration_sql("orders", "orders_1", &attrs).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `orders_1` (`id`, `name`)\nSELECT DISTINCT `id`, `name`\nFROM `orders`;"
        );
    }
}
