use crate::attribute::AttributeSet;
use crate::fd::FdSet;

/// Computes the attribute closure `X⁺` of `attrs` under `fds`, bounded by
/// `universe`.
///
/// Iteratively expands a working set until a fixpoint; each pass scans every
/// determinant once, so this is `O(|F| · |U|)` per pass and `O(|F| · |U|²)`
/// worst case, matching the complexity bound in the spec.
pub fn closure(attrs: &AttributeSet, fds: &FdSet, universe: &AttributeSet) -> AttributeSet {
    let mut working: AttributeSet = attrs.iter().filter(|a| universe.contains(*a)).cloned().collect();
    loop {
        let mut changed = false;
        for (determinant, dependent) in fds.iter() {
            if determinant.iter().all(|a| working.contains(a)) {
                for attr in dependent {
                    if !working.contains(attr) && universe.contains(attr) && working.insert(attr.clone()) {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return working;
        }
    }
}

/// `IsSuperkey(X, F, U) = (Closure(X, F, U) = U)`.
pub fn is_superkey(attrs: &AttributeSet, fds: &FdSet, universe: &AttributeSet) -> bool {
    let closed = closure(attrs, fds, universe);
    closed.len() == universe.len() && universe.iter().all(|a| closed.contains(a))
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
    fn closure_scenario_from_spec() {
        let universe = attribute_set(["A", "B", "C", "D", "E"]);
        let f = fds(&[(&["A"], &["B"]), (&["B"], &["C"]), (&["C", "D"], &["E"])]);
        let x = attribute_set(["A", "D"]);
        let result = closure(&x, &f, &universe);
        assert_eq!(result, universe);
        assert!(is_superkey(&x, &f, &universe));
    }

    #[test]
    fn closure_is_extensive_idempotent_monotone() {
        let universe = attribute_set(["A", "B", "C", "D"]);
        let f = fds(&[(&["A"], &["B"]), (&["B"], &["C"])]);
        let x = attribute_set(["A"]);
        let cx = closure(&x, &f, &universe);
        assert!(x.iter().all(|a| cx.contains(a)));
        let cxx = closure(&cx, &f, &universe);
        assert_eq!(cx, cxx);

        let y = attribute_set(["A", "D"]);
        let cy = closure(&y, &f, &universe);
        assert!(cx.iter().all(|a| cy.contains(a)));
    }

    #[test]
    fn closure_of_empty_is_empty() {
        let universe = attribute_set(["A", "B"]);
        let f = fds(&[(&["A"], &["B"])]);
        let empty = AttributeSet::default();
        assert!(closure(&empty, &f, &universe).is_empty());
    }
}
