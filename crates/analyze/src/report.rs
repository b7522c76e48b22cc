use normform_core::attribute::AttributeSet;
use normform_core::fd::FdSet;

/// Per-normal-form classification. `AssumedCompliant` is reserved for 1NF,
/// which this analyzer never actually tests; `NotChecked` is used when an
/// earlier NF's failure (or a missing primary key) makes a later check
/// meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfStatus {
    Compliant,
    ViolationDetected,
    AssumedCompliant,
    NotChecked,
}

#[derive(Debug, Clone)]
pub struct NfReport {
    pub status: NfStatus,
    pub message: String,
    pub violations: Vec<String>,
}

impl NfReport {
    pub fn compliant(message: impl Into<String>) -> Self {
        NfReport {
            status: NfStatus::Compliant,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn assumed_compliant(message: impl Into<String>) -> Self {
        NfReport {
            status: NfStatus::AssumedCompliant,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn not_checked(message: impl Into<String>) -> Self {
        NfReport {
            status: NfStatus::NotChecked,
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn violated(message: impl Into<String>, violations: Vec<String>) -> Self {
        NfReport {
            status: NfStatus::ViolationDetected,
            message: message.into(),
            violations,
        }
    }
}

/// The full `/analyze_normalization` response: the per-NF verdicts plus the
/// derived state the decomposer needs to proceed without recomputing it.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub table_name: String,
    pub primary_key: AttributeSet,
    pub candidate_keys: Vec<AttributeSet>,
    pub attributes: AttributeSet,
    pub processed_fds: FdSet,
    pub first_nf: NfReport,
    pub second_nf: NfReport,
    pub third_nf: NfReport,
    pub bcnf: NfReport,
    pub notes: Vec<String>,
}
