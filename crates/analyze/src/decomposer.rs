use normform_core::attribute::AttributeSet;
use normform_core::closure::{closure, is_superkey};
use normform_core::cover::minimal_cover;
use normform_core::error::FdError;
use normform_core::fd::FdSet;
use normform_core::keys::candidate_keys;
use normform_core::preserve::lost_fds;
use normform_core::project::project_fds;

/// One sub-schema produced by a decomposition: a name, its attributes, and
/// the primary key chosen for it.
#[derive(Debug, Clone)]
pub struct SubSchema {
    pub name: String,
    pub attributes: AttributeSet,
    pub primary_key: AttributeSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompositionKind {
    ThreeNf,
    Bcnf,
}

#[derive(Debug, Clone)]
pub struct Decomposition {
    pub kind: DecompositionKind,
    pub original_table: String,
    pub sub_schemas: Vec<SubSchema>,
    pub lost_fds: Vec<String>,
}

/// Picks the deterministic tie-break candidate key the spec requires when a
/// single CK must be chosen: smallest cardinality, then lexicographic.
fn smallest_candidate_key(cks: &[AttributeSet]) -> Option<&AttributeSet> {
    cks.iter().min_by(|a, b| {
        a.len()
            .cmp(&b.len())
            .then_with(|| normform_core::attribute::sorted(a).cmp(&normform_core::attribute::sorted(b)))
    })
}

fn remove_subset_duplicates(mut schemas: Vec<AttributeSet>) -> Vec<AttributeSet> {
    schemas.sort_by_key(|s| std::cmp::Reverse(s.len()));
    let mut kept: Vec<AttributeSet> = Vec::new();
    for schema in schemas {
        let is_subset_of_existing = kept
            .iter()
            .any(|k| schema.iter().all(|a| k.contains(a)) && k.len() >= schema.len());
        if !is_subset_of_existing {
            kept.push(schema);
        }
    }
    kept
}

/// 3NF synthesis (§4.4.1): lossless-join and dependency-preserving by
/// construction.
pub fn synthesize_3nf(
    table_name: &str,
    universe: &AttributeSet,
    fds: &FdSet,
    candidate_keys_hint: &[AttributeSet],
) -> Result<Decomposition, FdError> {
    let mc = minimal_cover(fds, universe);

    let mut grouped: Vec<(AttributeSet, AttributeSet)> = Vec::new();
    for (det, dep) in mc.iter() {
        if let Some(existing) = grouped.iter_mut().find(|(d, _)| d == det) {
            existing.1.extend(dep.iter().cloned());
        } else {
            grouped.push((det.clone(), dep.clone()));
        }
    }

    let mut schema_sets: Vec<AttributeSet> = grouped
        .iter()
        .map(|(det, dep)| {
            let mut attrs = det.clone();
            attrs.extend(dep.iter().cloned());
            attrs
        })
        .collect();

    let cks = if candidate_keys_hint.is_empty() {
        candidate_keys(universe, fds)
    } else {
        candidate_keys_hint.to_vec()
    };

    let covers_a_ck = cks
        .iter()
        .any(|ck| schema_sets.iter().any(|s| ck.iter().all(|a| s.contains(a))));
    if !covers_a_ck {
        if let Some(ck) = smallest_candidate_key(&cks) {
            schema_sets.push(ck.clone());
        }
    }

    let schema_sets = remove_subset_duplicates(schema_sets);

    let mut sub_schemas = Vec::with_capacity(schema_sets.len());
    for (i, attrs) in schema_sets.into_iter().enumerate() {
        let pk = primary_key_for(&attrs, fds, universe, &cks)?;
        sub_schemas.push(SubSchema {
            name: format!("{table_name}_{}", i + 1),
            attributes: attrs,
            primary_key: pk,
        });
    }

    Ok(Decomposition {
        kind: DecompositionKind::ThreeNf,
        original_table: table_name.to_string(),
        sub_schemas,
        lost_fds: Vec::new(),
    })
}

/// Determines a reasonable primary key for a synthesized sub-schema: prefer
/// a determinant from the minimal cover that spans exactly this schema's
/// non-dependent attributes; fall back to a candidate key of the whole
/// relation contained in this schema; fall back to all attributes.
fn primary_key_for(
    attrs: &AttributeSet,
    fds: &FdSet,
    universe: &AttributeSet,
    relation_cks: &[AttributeSet],
) -> Result<AttributeSet, FdError> {
    for (det, _dep) in fds.iter() {
        if det.iter().all(|a| attrs.contains(a)) {
            let closed = closure(det, fds, universe);
            if attrs.iter().all(|a| closed.contains(a)) {
                return Ok(det.clone());
            }
        }
    }
    if let Some(ck) = relation_cks.iter().find(|ck| ck.iter().all(|a| attrs.contains(a))) {
        return Ok(ck.clone());
    }
    if attrs.is_empty() {
        return Err(FdError::DecompositionInvariant(
            "synthesized sub-schema has no attributes".into(),
        ));
    }
    Ok(attrs.clone())
}

/// BCNF analysis (§4.4.2): a worklist algorithm that splits on the first
/// BCNF-violating FD found in each sub-schema, using the closure-based split
/// variant the spec designates (§9): `S1 = X ∪ Closure(X, F_S, S) \ X`,
/// `S2 = (S \ (Closure(X, F_S, S) \ X)) ∪ X`.
pub fn decompose_bcnf(table_name: &str, universe: &AttributeSet, fds: &FdSet) -> Result<Decomposition, FdError> {
    let mut worklist: Vec<AttributeSet> = vec![universe.clone()];
    let mut result: Vec<AttributeSet> = Vec::new();

    while let Some(s) = worklist.pop() {
        let f_s = project_fds(fds, &s, universe);
        let violation = find_bcnf_violation(&f_s, &s);

        match violation {
            None => result.push(s),
            Some((det, _dep)) => {
                let y_full: AttributeSet = closure(&det, &f_s, &s)
                    .into_iter()
                    .filter(|a| !det.contains(a))
                    .collect();
                let mut s1 = det.clone();
                s1.extend(y_full.iter().cloned());
                let mut s2: AttributeSet = s.iter().filter(|a| !y_full.contains(*a)).cloned().collect();
                s2.extend(det.iter().cloned());
                worklist.push(s1);
                worklist.push(s2);
            }
        }
    }

    let result = remove_subset_duplicates(result);

    let mut sub_schemas = Vec::with_capacity(result.len());
    for (i, attrs) in result.iter().enumerate() {
        let f_s = project_fds(fds, attrs, universe);
        let cks = candidate_keys(attrs, &f_s);
        let pk = smallest_candidate_key(&cks).cloned().unwrap_or_else(|| attrs.clone());
        sub_schemas.push(SubSchema {
            name: format!("{table_name}_{}", i + 1),
            attributes: attrs.clone(),
            primary_key: pk,
        });
    }

    let sub_schema_sets: Vec<AttributeSet> = sub_schemas.iter().map(|s| s.attributes.clone()).collect();
    let lost = lost_fds(fds, &sub_schema_sets);

    Ok(Decomposition {
        kind: DecompositionKind::Bcnf,
        original_table: table_name.to_string(),
        sub_schemas,
        lost_fds: lost,
    })
}

fn find_bcnf_violation(fds: &FdSet, s: &AttributeSet) -> Option<(AttributeSet, AttributeSet)> {
    let mut candidates: Vec<(AttributeSet, AttributeSet)> = Vec::new();
    for (det, dep) in fds.iter() {
        if dep.iter().all(|a| det.contains(a)) {
            continue;
        }
        if !det.iter().all(|a| s.contains(a)) || det.len() >= s.len() {
            continue;
        }
        if !is_superkey(det, fds, s) {
            candidates.push((det.clone(), dep.clone()));
        }
    }
    candidates.sort_by(|(d1, y1), (d2, y2)| {
        d1.len()
            .cmp(&d2.len())
            .then_with(|| normform_core::attribute::sorted(d1).cmp(&normform_core::attribute::sorted(d2)))
            .then_with(|| normform_core::attribute::sorted(y1).cmp(&normform_core::attribute::sorted(y2)))
    });
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use normform_core::attribute::attribute_set;

    #[test]
    fn bcnf_scenario_from_spec_splits_on_p() {
        let universe = attribute_set(["S", "I", "P"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["S", "I"]), attribute_set(["P"]), &universe).unwrap();
        fds.insert(attribute_set(["P"]), attribute_set(["I"]), &universe).unwrap();

        let decomp = decompose_bcnf("r", &universe, &fds).unwrap();
        assert_eq!(decomp.sub_schemas.len(), 2);
        assert_eq!(decomp.lost_fds, vec!["{I, S} -> {P}"]);

        let mut attrs: Vec<Vec<&str>> = decomp
            .sub_schemas
            .iter()
            .map(|s| normform_core::attribute::sorted(&s.attributes))
            .collect();
        attrs.sort();
        assert_eq!(attrs, vec![vec!["I", "P"], vec!["P", "S"]]);
    }

    #[test]
    fn three_nf_synthesis_scenario_from_spec() {
        let universe = attribute_set(["A", "B", "C", "D", "E"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["A"]), attribute_set(["B"]), &universe).unwrap();
        fds.insert(attribute_set(["B", "C"]), attribute_set(["D"]), &universe).unwrap();
        fds.insert(attribute_set(["D"]), attribute_set(["E"]), &universe).unwrap();

        let cks = candidate_keys(&universe, &fds);
        let decomp = synthesize_3nf("r", &universe, &fds, &cks).unwrap();
        assert!(decomp.lost_fds.is_empty());

        let union: AttributeSet = decomp
            .sub_schemas
            .iter()
            .flat_map(|s| s.attributes.iter().cloned())
            .collect();
        for a in &universe {
            assert!(union.contains(a));
        }

        let covers_a_ck = cks
            .iter()
            .any(|ck| decomp.sub_schemas.iter().any(|s| ck.iter().all(|a| s.attributes.contains(a))));
        assert!(covers_a_ck);
    }
}
