use normform_core::attribute::AttributeSet;
use normform_core::closure::{closure, is_superkey};
use normform_core::error::FdError;
use normform_core::fd::FdSet;
use normform_core::keys::{candidate_keys, prime_attributes};

use crate::report::{AnalysisReport, NfReport};

/// Classifies a relation against 1NF/2NF/3NF/BCNF.
///
/// `user_fds` is the caller-supplied FD set; the derived working set is
/// `F = user_fds ∪ {primary_key → (universe \ primary_key)}` whenever a
/// primary key is designated. Without one, only 1NF can be assessed — the
/// 2NF/3NF/BCNF reports come back `NotChecked` rather than failing the whole
/// request, matching the "warn, don't reject" posture of the schema this
/// analyzer descends from.
pub fn analyze(
    table_name: &str,
    universe: AttributeSet,
    primary_key: AttributeSet,
    user_fds: FdSet,
) -> Result<AnalysisReport, FdError> {
    let first_nf = NfReport::assumed_compliant("atomicity enforced at the physical layer");

    if primary_key.is_empty() {
        let not_checked = NfReport::not_checked("no primary key designated; cannot evaluate beyond 1NF");
        return Ok(AnalysisReport {
            table_name: table_name.to_string(),
            primary_key,
            candidate_keys: Vec::new(),
            attributes: universe,
            processed_fds: user_fds,
            first_nf,
            second_nf: not_checked.clone(),
            third_nf: not_checked.clone(),
            bcnf: not_checked,
            notes: vec!["Warning: table has no designated primary key.".to_string()],
        });
    }

    let mut fds = user_fds.clone();
    let derived_dependent: AttributeSet = universe
        .iter()
        .filter(|a| !primary_key.contains(*a))
        .cloned()
        .collect();
    if !derived_dependent.is_empty() {
        fds.insert_unchecked(primary_key.clone(), derived_dependent);
    }

    let cks = candidate_keys(&universe, &fds);
    let prime = prime_attributes(&cks);
    let non_prime: AttributeSet = universe.iter().filter(|a| !prime.contains(*a)).cloned().collect();

    let second_nf = check_2nf(&cks, &fds, &universe, &non_prime);
    let third_nf = check_3nf(&fds, &universe, &prime);
    let bcnf = check_bcnf(&fds, &universe);

    Ok(AnalysisReport {
        table_name: table_name.to_string(),
        primary_key,
        candidate_keys: cks,
        attributes: universe,
        processed_fds: fds,
        first_nf,
        second_nf,
        third_nf,
        bcnf,
        notes: Vec::new(),
    })
}

fn check_2nf(candidate_keys: &[AttributeSet], fds: &FdSet, universe: &AttributeSet, non_prime: &AttributeSet) -> NfReport {
    let mut violations = Vec::new();
    for ck in candidate_keys {
        if ck.len() <= 1 {
            continue;
        }
        for k in 1..ck.len() {
            for combo in itertools::Itertools::combinations(ck.iter(), k) {
                let subset: AttributeSet = combo.into_iter().cloned().collect();
                let closed = closure(&subset, fds, universe);
                let partial: Vec<&str> = closed
                    .iter()
                    .filter(|a| non_prime.contains(*a))
                    .map(String::as_str)
                    .collect();
                if !partial.is_empty() {
                    let sorted_subset = normform_core::attribute::sorted(&subset);
                    let sorted_ck = normform_core::attribute::sorted(ck);
                    let mut sorted_partial = partial;
                    sorted_partial.sort_unstable();
                    violations.push(format!(
                        "partial dependency {{{}}} -> {{{}}} of candidate key {{{}}}",
                        sorted_subset.join(", "),
                        sorted_partial.join(", "),
                        sorted_ck.join(", ")
                    ));
                }
            }
        }
    }
    if violations.is_empty() {
        NfReport::compliant("no partial dependency on a candidate key was found")
    } else {
        NfReport::violated("one or more non-prime attributes depend on only part of a candidate key", violations)
    }
}

fn check_3nf(fds: &FdSet, universe: &AttributeSet, prime: &AttributeSet) -> NfReport {
    let mut violations = Vec::new();
    for (det, dep) in fds.iter() {
        if dep.iter().all(|a| det.contains(a)) {
            continue;
        }
        if is_superkey(det, fds, universe) {
            continue;
        }
        for a in dep {
            if det.contains(a) || prime.contains(a) {
                continue;
            }
            violations.push(format!(
                "transitive dependency {{{}}} -> {}",
                normform_core::attribute::sorted(det).join(", "),
                a
            ));
        }
    }
    if violations.is_empty() {
        NfReport::compliant("no transitive dependency on a non-prime attribute was found")
    } else {
        NfReport::violated("one or more non-prime attributes are transitively dependent on a key", violations)
    }
}

fn check_bcnf(fds: &FdSet, universe: &AttributeSet) -> NfReport {
    let mut violations = Vec::new();
    for (det, dep) in fds.iter() {
        if dep.iter().all(|a| det.contains(a)) {
            continue;
        }
        if is_superkey(det, fds, universe) {
            continue;
        }
        let rhs: AttributeSet = dep.iter().filter(|a| !det.contains(*a)).cloned().collect();
        violations.push(format!(
            "non-superkey determinant {{{}}} -> {{{}}}",
            normform_core::attribute::sorted(det).join(", "),
            normform_core::attribute::sorted(&rhs).join(", ")
        ));
    }
    if violations.is_empty() {
        NfReport::compliant("every determinant is a superkey")
    } else {
        NfReport::violated("one or more determinants are not superkeys", violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normform_core::attribute::attribute_set;

    #[test]
    fn bcnf_violation_scenario_from_spec() {
        let universe = attribute_set(["S", "I", "P"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["S", "I"]), attribute_set(["P"]), &universe).unwrap();
        fds.insert(attribute_set(["P"]), attribute_set(["I"]), &universe).unwrap();

        let report = analyze("r", universe, attribute_set(["S", "I"]), fds).unwrap();
        assert_eq!(report.bcnf.status, crate::report::NfStatus::ViolationDetected);
        assert_eq!(report.bcnf.violations.len(), 1);
    }

    #[test]
    fn fully_normalized_relation_reports_compliant() {
        let universe = attribute_set(["A", "B"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["A"]), attribute_set(["B"]), &universe).unwrap();
        let report = analyze("r", universe, attribute_set(["A"]), fds).unwrap();
        assert_eq!(report.second_nf.status, crate::report::NfStatus::Compliant);
        assert_eq!(report.third_nf.status, crate::report::NfStatus::Compliant);
        assert_eq!(report.bcnf.status, crate::report::NfStatus::Compliant);
    }

    #[test]
    fn missing_primary_key_only_reports_1nf() {
        let universe = attribute_set(["A", "B"]);
        let report = analyze("r", universe, AttributeSet::default(), FdSet::new()).unwrap();
        assert_eq!(report.second_nf.status, crate::report::NfStatus::NotChecked);
        assert!(!report.notes.is_empty());
    }
}
