use crate::attribute::AttributeSet;
use crate::closure::closure;
use crate::fd::FdSet;

/// Projects `fds` onto the sub-schema `subset`, closure-based.
///
/// For every `X → Y ∈ fds` with `X ⊆ subset`, emits `X → (Closure(X, fds,
/// universe) ∩ subset) \ X`, dropping the FD if the dependent side ends up
/// empty (trivial). This is the variant the spec requires for candidate-key
/// discovery on a decomposed sub-schema — the cheaper `Y ∩ subset` shortcut
/// can miss dependencies induced by attributes projected away.
pub fn project_fds(fds: &FdSet, subset: &AttributeSet, universe: &AttributeSet) -> FdSet {
    let mut projected = FdSet::new();
    for (det, _dep) in fds.iter() {
        if !det.iter().all(|a| subset.contains(a)) {
            continue;
        }
        let closed = closure(det, fds, universe);
        let dependent: AttributeSet = closed
            .into_iter()
            .filter(|a| subset.contains(a) && !det.contains(a))
            .collect();
        if !dependent.is_empty() {
            projected.insert_unchecked(det.clone(), dependent);
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::attribute_set;

    #[test]
    fn project_onto_sub_schema() {
        let universe = attribute_set(["S", "I", "P"]);
        let mut f = FdSet::new();
        f.insert_unchecked(attribute_set(["S", "I"]), attribute_set(["P"]));
        f.insert_unchecked(attribute_set(["P"]), attribute_set(["I"]));

        let s1 = attribute_set(["P", "I"]);
        let projected = project_fds(&f, &s1, &universe);
        let pairs: Vec<_> = projected
            .iter()
            .map(|(d, dep)| (crate::attribute::sorted(d), crate::attribute::sorted(dep)))
            .collect();
        assert_eq!(pairs, vec![(vec!["P"], vec!["I"])]);
    }
}
