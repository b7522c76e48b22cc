use normform_helpers::IndexMap;

use crate::attribute::AttributeSet;
use crate::closure::closure;
use crate::fd::FdSet;

/// Computes a minimal (canonical) cover of `fds` over `universe`.
///
/// Three phases, exactly as specified:
/// 1. Split every FD into singleton-RHS FDs.
/// 2. Minimize each determinant by removing attributes that are extraneous
///    under the CURRENT (post-split) FD set.
/// 3. Drop redundant FDs using the INCREMENTAL cover built so far — not the
///    untouched post-split set — which is the variant the original
///    implementation uses and the one this spec requires (§9).
pub fn minimal_cover(fds: &FdSet, universe: &AttributeSet) -> FdSet {
    // Phase 1: standard form.
    let standard_pairs = fds.singleton_pairs();
    let mut standard_dict: FdSet = FdSet::new();
    for (det, dep) in &standard_pairs {
        standard_dict.insert_unchecked(det.clone(), std::iter::once(dep.clone()).collect());
    }

    // Phase 2: minimize left-hand sides against the post-split dict.
    let mut minimized: Vec<(AttributeSet, String)> = Vec::with_capacity(standard_pairs.len());
    for (det, dep) in &standard_pairs {
        let mut minimized_det = det.clone();
        if minimized_det.len() > 1 {
            let mut ordered: Vec<String> = det.iter().cloned().collect();
            ordered.sort_unstable();
            for attr in ordered {
                if minimized_det.len() <= 1 {
                    break;
                }
                let mut reduced = minimized_det.clone();
                reduced.shift_remove(&attr);
                let reduced_closure = closure(&reduced, &standard_dict, universe);
                if reduced_closure.contains(dep) {
                    minimized_det = reduced;
                }
            }
        }
        minimized.push((minimized_det, dep.clone()));
    }

    // Phase 3: drop redundant FDs using the incremental cover built so far.
    let mut current: IndexMap<AttributeSet, AttributeSet> = IndexMap::default();
    for (det, dep) in &minimized {
        current
            .entry(det.clone())
            .or_default()
            .insert(dep.clone());
    }

    let mut final_cover = FdSet::new();
    for (det, dep) in &minimized {
        let mut without_this: FdSet = FdSet::new();
        for (d, deps) in &current {
            let mut deps = deps.clone();
            if d == det {
                deps.shift_remove(dep);
            }
            if !deps.is_empty() {
                without_this.insert_unchecked(d.clone(), deps);
            }
        }
        let reachable = closure(det, &without_this, universe);
        if !reachable.contains(dep) {
            final_cover.insert_unchecked(det.clone(), std::iter::once(dep.clone()).collect());
        }
    }

    final_cover
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::attribute_set;

    fn fds(pairs: &[(&[&str], &[&str])]) -> FdSet {
        pairs
            .iter()
            .map(|(det, dep)| (attribute_set(det.iter().copied()), attribute_set(dep.iter().copied())))
            .collect()
    }

    #[test]
    fn minimal_cover_scenario_from_spec() {
        let universe = attribute_set(["A", "B", "C"]);
        let f = fds(&[
            (&["A"], &["B", "C"]),
            (&["B"], &["C"]),
            (&["A"], &["B"]),
            (&["A", "B"], &["C"]),
        ]);
        let mc = minimal_cover(&f, &universe);

        let mut pairs: Vec<(Vec<&str>, Vec<&str>)> = mc
            .iter()
            .map(|(det, dep)| (crate::attribute::sorted(det), crate::attribute::sorted(dep)))
            .collect();
        pairs.sort();

        assert_eq!(pairs, vec![(vec!["A"], vec!["B"]), (vec!["B"], vec!["C"])]);
    }
}
