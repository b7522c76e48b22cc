use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use normform_analyze::analyzer::analyze;
use normform_analyze::decomposer::{decompose_bcnf as decompose_bcnf_core, synthesize_3nf, Decomposition, DecompositionKind};
use normform_analyze::report::{AnalysisReport, NfReport, NfStatus};
use normform_core::attribute::{attribute_set, sorted, Attribute, AttributeSet, LogicalType};
use normform_core::fd::FdSet;
use normform_helpers::IndexMap;
use normform_sql::orchestrator::{apply_decomposition, DecomposedTableSpec};
use normform_sql::sanitize::{sanitize, SanitizeContext};

use crate::dto::{
    AnalyzeNormalizationRequest, AnalyzeNormalizationResponse, DecomposeRequest, DecomposeResponse, NfAnalysisDto,
    NfReportDto, SaveDecompositionRequest, SaveDecompositionResponse, SubSchemaDto,
};
use crate::error::ApiError;
use crate::state::AppState;

fn nf_status_str(status: NfStatus) -> &'static str {
    match status {
        NfStatus::Compliant => "COMPLIANT",
        NfStatus::ViolationDetected => "VIOLATION_DETECTED",
        NfStatus::AssumedCompliant => "ASSUMED_COMPLIANT",
        NfStatus::NotChecked => "NOT_CHECKED",
    }
}

fn nf_report_dto(report: &NfReport) -> NfReportDto {
    NfReportDto {
        status: nf_status_str(report.status).to_string(),
        message: report.message.clone(),
        violations: report.violations.clone(),
    }
}

fn processed_fds_to_dto(fds: &FdSet) -> BTreeMap<String, Vec<String>> {
    fds.iter()
        .map(|(det, dep)| (sorted(det).join(","), sorted(dep).into_iter().map(String::from).collect()))
        .collect()
}

async fn table_attributes_info(state: &AppState, table: &str) -> Result<(AttributeSet, AttributeSet, IndexMap<String, Attribute>), ApiError> {
    let safe_name = sanitize(table, SanitizeContext::Table).ok_or_else(|| ApiError::bad_request("invalid table name"))?;
    let describe_sql = format!("DESCRIBE `{}`;", safe_name.as_str());
    let result = state.executor.query(&describe_sql, &[]).await.map_err(|e| match e {
        normform_sql::error::SqlError::Database {
            code: normform_sql::error::MysqlErrorCode::UnknownTable,
            ..
        } => ApiError::NotFound(format!("table '{}' not found", safe_name.as_str())),
        other => ApiError::Sql(other),
    })?;

    let idx = |name: &str| result.columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let field_idx = idx("Field");
    let type_idx = idx("Type");
    let null_idx = idx("Null");
    let key_idx = idx("Key");

    let mut universe = AttributeSet::default();
    let mut primary_key = AttributeSet::default();
    let mut attributes_info = IndexMap::default();

    for row in &result.rows {
        let text = |i: Option<usize>| -> Option<String> {
            i.and_then(|i| row.get(i)).and_then(|v| match v {
                normform_sql::clause::SqlValue::Text(s) => Some(s.clone()),
                _ => None,
            })
        };
        let Some(name) = text(field_idx) else { continue };
        let raw_type = text(type_idx).unwrap_or_default();
        let is_not_null = text(null_idx).map(|v| v.eq_ignore_ascii_case("NO")).unwrap_or(false);
        let key = text(key_idx).unwrap_or_default();
        let is_pk = key.eq_ignore_ascii_case("PRI");
        let is_unique = key.eq_ignore_ascii_case("UNI");

        universe.insert(name.clone());
        if is_pk {
            primary_key.insert(name.clone());
        }
        attributes_info.insert(
            name.clone(),
            Attribute {
                name,
                logical_type: LogicalType::from_raw(&raw_type),
                is_pk,
                is_not_null,
                is_unique,
            },
        );
    }

    Ok((universe, primary_key, attributes_info))
}

pub async fn analyze_normalization(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeNormalizationRequest>,
) -> Result<Json<AnalyzeNormalizationResponse>, ApiError> {
    let (universe, primary_key, _) = table_attributes_info(&state, &req.table).await?;

    if primary_key.is_empty() {
        return Err(ApiError::bad_request(
            "designated primary key is required for standard normalization analysis",
        ));
    }

    let mut user_fds = FdSet::new();
    for fd in req.fds {
        if fd.determinants.is_empty() || fd.dependents.is_empty() {
            return Err(ApiError::bad_request("every FD requires non-empty determinants and dependents"));
        }
        let determinants = attribute_set(fd.determinants);
        let dependents = attribute_set(fd.dependents);
        user_fds
            .insert(determinants, dependents, &universe)
            .map_err(ApiError::from)?;
    }

    let report: AnalysisReport = analyze(&req.table, universe, primary_key, user_fds)?;

    Ok(Json(AnalyzeNormalizationResponse {
        table_name: report.table_name,
        primary_key: sorted(&report.primary_key).into_iter().map(String::from).collect(),
        candidate_keys: report
            .candidate_keys
            .iter()
            .map(|ck| sorted(ck).into_iter().map(String::from).collect())
            .collect(),
        attributes: sorted(&report.attributes).into_iter().map(String::from).collect(),
        processed_fds: processed_fds_to_dto(&report.processed_fds),
        analysis: NfAnalysisDto {
            first_nf: nf_report_dto(&report.first_nf),
            second_nf: nf_report_dto(&report.second_nf),
            third_nf: nf_report_dto(&report.third_nf),
            bcnf: nf_report_dto(&report.bcnf),
        },
        notes: report.notes,
        error: None,
    }))
}

fn fds_from_processed(processed_fds: &BTreeMap<String, Vec<String>>) -> FdSet {
    let mut fds = FdSet::new();
    for (det, dep) in processed_fds {
        let determinant: AttributeSet = det.split(',').filter(|s| !s.is_empty()).map(String::from).collect();
        let dependent: AttributeSet = dep.iter().cloned().collect();
        fds.insert_unchecked(determinant, dependent);
    }
    fds
}

fn decomposition_to_response(decomposition: Decomposition) -> DecomposeResponse {
    let decomposition_type = match decomposition.kind {
        DecompositionKind::ThreeNf => "3NF",
        DecompositionKind::Bcnf => "BCNF",
    };
    DecomposeResponse {
        decomposition_type: decomposition_type.to_string(),
        original_table: decomposition.original_table,
        decomposed_tables: decomposition
            .sub_schemas
            .into_iter()
            .map(|s| SubSchemaDto {
                new_table_name: s.name,
                attributes: sorted(&s.attributes).into_iter().map(String::from).collect(),
                primary_key: sorted(&s.primary_key).into_iter().map(String::from).collect(),
            })
            .collect(),
        lost_fds: decomposition.lost_fds,
    }
}

pub async fn decompose_3nf(Json(req): Json<DecomposeRequest>) -> Result<Json<DecomposeResponse>, ApiError> {
    let universe = attribute_set(req.attributes);
    let fds = fds_from_processed(&req.processed_fds);
    let cks_hint: Vec<AttributeSet> = req.candidate_keys.into_iter().map(attribute_set).collect();

    let decomposition = synthesize_3nf(&req.table_name, &universe, &fds, &cks_hint)?;
    Ok(Json(decomposition_to_response(decomposition)))
}

pub async fn decompose_bcnf(Json(req): Json<DecomposeRequest>) -> Result<Json<DecomposeResponse>, ApiError> {
    let universe = attribute_set(req.attributes);
    let fds = fds_from_processed(&req.processed_fds);

    let decomposition = decompose_bcnf_core(&req.table_name, &universe, &fds)?;
    Ok(Json(decomposition_to_response(decomposition)))
}

pub async fn save_decomposition(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveDecompositionRequest>,
) -> Result<Json<SaveDecompositionResponse>, ApiError> {
    let (_, _, attributes_info) = table_attributes_info(&state, &req.original_table).await?;

    let specs: Vec<DecomposedTableSpec> = req
        .decomposed_tables
        .into_iter()
        .map(|t| DecomposedTableSpec {
            new_table_name: t.new_table_name,
            attributes: attribute_set(t.attributes),
            primary_key: attribute_set(t.primary_key),
        })
        .collect();

    let report = apply_decomposition(state.executor.as_ref(), &req.original_table, &specs, &attributes_info).await?;

    Ok(Json(SaveDecompositionResponse {
        message: "decomposition applied".to_string(),
        created_tables: report.created_tables,
        data_migrated_to: report.data_migrated_to,
        original_table_dropped: report.original_table_dropped,
    }))
}
