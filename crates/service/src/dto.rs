use serde::{Deserialize, Serialize};

use normform_sql::clause::SqlValue as CoreSqlValue;

/// A JSON value in a request/response body, mapped to/from
/// [`normform_sql::clause::SqlValue`] at the edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<JsonValue> for CoreSqlValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CoreSqlValue::Null,
            JsonValue::Bool(b) => CoreSqlValue::Bool(b),
            JsonValue::Int(i) => CoreSqlValue::Int(i),
            JsonValue::Float(f) => CoreSqlValue::Float(f),
            JsonValue::Text(s) => CoreSqlValue::Text(s),
        }
    }
}

impl From<CoreSqlValue> for JsonValue {
    fn from(value: CoreSqlValue) -> Self {
        match value {
            CoreSqlValue::Null => JsonValue::Null,
            CoreSqlValue::Bool(b) => JsonValue::Bool(b),
            CoreSqlValue::Int(i) => JsonValue::Int(i),
            CoreSqlValue::Float(f) => JsonValue::Float(f),
            CoreSqlValue::Text(s) => JsonValue::Text(s),
        }
    }
}

// ---- /schema -------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaAttributeReq {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, rename = "isPK")]
    pub is_pk: bool,
    #[serde(default, rename = "isNotNull")]
    pub is_not_null: bool,
    #[serde(default, rename = "isUnique")]
    pub is_unique: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaTableReq {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<SchemaAttributeReq>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRelationshipReq {
    #[serde(rename = "sourceTableId")]
    pub source_table_id: String,
    #[serde(rename = "targetTableId")]
    pub target_table_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplySchemaRequest {
    #[serde(default)]
    pub tables: Vec<SchemaTableReq>,
    #[serde(default)]
    pub relationships: Vec<SchemaRelationshipReq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplySchemaResponse {
    pub created_tables: Vec<String>,
    pub dropped_tables: Vec<String>,
    pub added_foreign_keys: Vec<String>,
    pub errors: Vec<String>,
}

// ---- /current_schema, /tables, /table_details -----------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AttributeDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "isPK")]
    pub is_pk: bool,
    #[serde(rename = "isNotNull")]
    pub is_not_null: bool,
    #[serde(rename = "isUnique")]
    pub is_unique: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub attributes: Vec<AttributeDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipDescription {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CurrentSchemaResponse {
    pub tables: std::collections::BTreeMap<String, TableDescription>,
    pub relationships: Vec<RelationshipDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDetailsResponse {
    pub table_name: String,
    pub attributes: Vec<AttributeDescription>,
}

// ---- /execute_select -------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SelectItemReq {
    Column {
        table: String,
        column: String,
    },
    Aggregate {
        table: String,
        column: String,
        func: String,
        #[serde(default)]
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinReq {
    #[serde(rename = "type", default = "default_join_type")]
    pub join_type: String,
    #[serde(rename = "leftTable")]
    pub left_table: String,
    #[serde(rename = "leftCol")]
    pub left_col: String,
    #[serde(rename = "rightTable")]
    pub right_table: String,
    #[serde(rename = "rightCol")]
    pub right_col: String,
}

fn default_join_type() -> String {
    "INNER".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionReq {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: Option<JsonValue>,
    #[serde(default)]
    pub connector: Option<String>,
    #[serde(default)]
    pub func: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderByReq {
    pub term: String,
    #[serde(default = "default_order_direction")]
    pub direction: String,
}

fn default_order_direction() -> String {
    "ASC".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteSelectRequest {
    #[serde(default)]
    pub select: Vec<SelectItemReq>,
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub joins: Vec<JoinReq>,
    #[serde(default, rename = "where")]
    pub where_: Vec<ConditionReq>,
    #[serde(default, rename = "groupBy")]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub having: Vec<ConditionReq>,
    #[serde(default, rename = "orderBy")]
    pub order_by: Vec<OrderByReq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteSelectResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

// ---- /execute_dml -----------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteDmlRequest {
    pub operation: String,
    pub table: String,
    #[serde(default)]
    pub values: Vec<std::collections::BTreeMap<String, JsonValue>>,
    #[serde(default)]
    pub set: std::collections::BTreeMap<String, JsonValue>,
    #[serde(default, rename = "where")]
    pub where_: Vec<ConditionReq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteDmlResponse {
    pub message: String,
    #[serde(rename = "affectedRows")]
    pub affected_rows: u64,
}

// ---- /analyze_normalization --------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FdReq {
    pub determinants: Vec<String>,
    pub dependents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeNormalizationRequest {
    pub table: String,
    #[serde(default)]
    pub fds: Vec<FdReq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NfReportDto {
    pub status: String,
    pub message: String,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NfAnalysisDto {
    #[serde(rename = "1NF")]
    pub first_nf: NfReportDto,
    #[serde(rename = "2NF")]
    pub second_nf: NfReportDto,
    #[serde(rename = "3NF")]
    pub third_nf: NfReportDto,
    #[serde(rename = "BCNF")]
    pub bcnf: NfReportDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeNormalizationResponse {
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "primaryKey")]
    pub primary_key: Vec<String>,
    #[serde(rename = "candidateKeys")]
    pub candidate_keys: Vec<Vec<String>>,
    pub attributes: Vec<String>,
    #[serde(rename = "processedFds")]
    pub processed_fds: std::collections::BTreeMap<String, Vec<String>>,
    pub analysis: NfAnalysisDto,
    pub notes: Vec<String>,
    pub error: Option<String>,
}

// ---- /decompose/3nf, /decompose/bcnf -----------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DecomposeRequest {
    #[serde(rename = "tableName")]
    pub table_name: String,
    pub attributes: Vec<String>,
    #[serde(default, rename = "candidateKeys")]
    pub candidate_keys: Vec<Vec<String>>,
    #[serde(rename = "processedFds")]
    pub processed_fds: std::collections::BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubSchemaDto {
    pub new_table_name: String,
    pub attributes: Vec<String>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecomposeResponse {
    pub decomposition_type: String,
    pub original_table: String,
    pub decomposed_tables: Vec<SubSchemaDto>,
    pub lost_fds: Vec<String>,
}

// ---- /save_decomposition ------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SaveDecompositionTableReq {
    pub new_table_name: String,
    pub attributes: Vec<String>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveDecompositionRequest {
    pub original_table: String,
    pub decomposed_tables: Vec<SaveDecompositionTableReq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveDecompositionResponse {
    pub message: String,
    pub created_tables: Vec<String>,
    pub data_migrated_to: Vec<String>,
    pub original_table_dropped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
