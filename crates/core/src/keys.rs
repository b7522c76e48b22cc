use itertools::Itertools;

use crate::attribute::AttributeSet;
use crate::closure::is_superkey;
use crate::fd::FdSet;

/// Partitions the attribute universe ahead of candidate-key enumeration, per
/// the §9 complexity note: attributes that never appear on any FD's
/// right-hand side must belong to every candidate key (`essential`);
/// attributes that never appear on any left-hand side and are not essential
/// can never help form a *minimal* key (`never_key`); everything else is
/// `uncertain` and is the only part of the universe the subset scan needs to
/// range over.
struct Partition {
    essential: AttributeSet,
    uncertain: Vec<String>,
}

fn partition(universe: &AttributeSet, fds: &FdSet) -> Partition {
    let mut on_lhs: AttributeSet = AttributeSet::default();
    let mut on_rhs: AttributeSet = AttributeSet::default();
    for (det, dep) in fds.iter() {
        on_lhs.extend(det.iter().cloned());
        on_rhs.extend(dep.iter().cloned());
    }

    let mut essential = AttributeSet::default();
    let mut never_key = AttributeSet::default();
    let mut uncertain = Vec::new();
    for attr in universe {
        let is_essential = !on_rhs.contains(attr);
        let is_never_key = !is_essential && !on_lhs.contains(attr);
        if is_essential {
            essential.insert(attr.clone());
        } else if is_never_key {
            never_key.insert(attr.clone());
        } else {
            uncertain.push(attr.clone());
        }
    }
    uncertain.sort_unstable();
    let _ = never_key;
    Partition { essential, uncertain }
}

/// Enumerates the candidate keys of `universe` under `fds`.
///
/// Returns an antichain: no returned set is a subset of another, every
/// returned set is a superkey, and for any superkey `X` there exists a
/// returned candidate key that is a subset of `X`. The result is ordered by
/// increasing cardinality, then lexicographically, giving callers a
/// deterministic "smallest, then lexicographic" choice when one is needed
/// (e.g. picking a primary key).
pub fn candidate_keys(universe: &AttributeSet, fds: &FdSet) -> Vec<AttributeSet> {
    if universe.is_empty() {
        return Vec::new();
    }

    let Partition { essential, uncertain } = partition(universe, fds);

    let mut found: Vec<AttributeSet> = Vec::new();

    for k in 0..=uncertain.len() {
        for combo in uncertain.iter().combinations(k) {
            let mut candidate: AttributeSet = essential.clone();
            candidate.extend(combo.into_iter().cloned());
            if candidate.is_empty() {
                continue;
            }

            if !is_superkey(&candidate, fds, universe) {
                continue;
            }

            if found.iter().any(|ck| ck.iter().all(|a| candidate.contains(a))) {
                // a previously found (necessarily smaller-or-equal) candidate
                // key is already a subset of this one: not minimal.
                continue;
            }

            found.retain(|ck| !candidate.iter().all(|a| ck.contains(a)) || ck.len() <= candidate.len());
            found.push(candidate);
        }
    }

    found.sort_by(|a, b| {
        a.len()
            .cmp(&b.len())
            .then_with(|| crate::attribute::sorted(a).cmp(&crate::attribute::sorted(b)))
    });
    found
}

/// The union of every attribute appearing in at least one candidate key.
pub fn prime_attributes(candidate_keys: &[AttributeSet]) -> AttributeSet {
    let mut prime = AttributeSet::default();
    for ck in candidate_keys {
        prime.extend(ck.iter().cloned());
    }
    prime
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::attribute_set;
    use crate::fd::FdSet;

    fn fds(pairs: &[(&[&str], &[&str])]) -> FdSet {
        pairs
            .iter()
            .map(|(det, dep)| (attribute_set(det.iter().copied()), attribute_set(dep.iter().copied())))
            .collect()
    }

    #[test]
    fn candidate_keys_scenario_from_spec() {
        let universe = attribute_set(["A", "B", "C"]);
        let f = fds(&[(&["A", "B"], &["C"]), (&["C"], &["B"])]);
        let cks = candidate_keys(&universe, &f);
        let as_sorted: Vec<Vec<&str>> = cks.iter().map(crate::attribute::sorted).collect();
        assert_eq!(as_sorted, vec![vec!["A", "B"], vec!["A", "C"]]);
    }

    #[test]
    fn candidate_keys_is_antichain_and_every_member_is_superkey() {
        let universe = attribute_set(["A", "B", "C", "D", "E"]);
        let f = fds(&[(&["A"], &["B"]), (&["B"], &["C"]), (&["C", "D"], &["E"])]);
        let cks = candidate_keys(&universe, &f);
        for ck in &cks {
            assert!(crate::closure::is_superkey(ck, &f, &universe));
        }
        for (i, a) in cks.iter().enumerate() {
            for (j, b) in cks.iter().enumerate() {
                if i != j {
                    assert!(!a.iter().all(|x| b.contains(x)), "{a:?} subset of {b:?}");
                }
            }
        }
    }
}
