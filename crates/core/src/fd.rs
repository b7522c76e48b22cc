use normform_helpers::IndexMap;

use crate::attribute::AttributeSet;
use crate::error::FdError;

/// A set of functional dependencies, keyed by determinant.
///
/// Multiple FDs sharing a determinant are merged by unioning their
/// right-hand sides, matching the spec's `FunctionalDependency` merge rule.
/// `IndexMap` keeps insertion order so iteration (and therefore every
/// lexicographic tie-break built on top of it) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct FdSet {
    determinants: IndexMap<AttributeSet, AttributeSet>,
}

impl FdSet {
    pub fn new() -> Self {
        FdSet {
            determinants: IndexMap::default(),
        }
    }

    /// Adds `determinant -> dependent`, validating against `universe` and
    /// merging into any existing entry for the same determinant.
    ///
    /// Rejects a determinant/dependent that isn't a subset of `universe`,
    /// and a dependent set that overlaps the determinant (trivial FD).
    pub fn insert(
        &mut self,
        determinant: AttributeSet,
        dependent: AttributeSet,
        universe: &AttributeSet,
    ) -> Result<(), FdError> {
        if determinant.is_empty() {
            return Err(FdError::UnknownAttribute(
                "determinant must be non-empty".into(),
            ));
        }
        for attr in determinant.iter().chain(dependent.iter()) {
            if !universe.contains(attr) {
                return Err(FdError::UnknownAttribute(attr.clone()));
            }
        }
        let dependent: AttributeSet = dependent.into_iter().filter(|a| !determinant.contains(a)).collect();
        if dependent.is_empty() {
            return Err(FdError::TrivialDependency(format!("{determinant:?}")));
        }
        self.determinants
            .entry(determinant)
            .and_modify(|existing| existing.extend(dependent.iter().cloned()))
            .or_insert(dependent);
        Ok(())
    }

    /// Inserts without validation; used internally when the caller has
    /// already established `determinant`/`dependent` are within universe
    /// (e.g. FD projection, minimal cover).
    pub fn insert_unchecked(&mut self, determinant: AttributeSet, dependent: AttributeSet) {
        if dependent.is_empty() {
            return;
        }
        self.determinants
            .entry(determinant)
            .and_modify(|existing| existing.extend(dependent.iter().cloned()))
            .or_insert(dependent);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeSet, &AttributeSet)> {
        self.determinants.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.determinants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.determinants.len()
    }

    /// Every FD flattened to singleton-RHS pairs, in a fixed order
    /// (determinant insertion order, then lexicographic on the dependent).
    pub fn singleton_pairs(&self) -> Vec<(AttributeSet, String)> {
        let mut pairs = Vec::new();
        for (det, deps) in &self.determinants {
            let mut deps: Vec<&String> = deps.iter().collect();
            deps.sort_unstable();
            for dep in deps {
                pairs.push((det.clone(), dep.clone()));
            }
        }
        pairs
    }
}

impl FromIterator<(AttributeSet, AttributeSet)> for FdSet {
    fn from_iter<T: IntoIterator<Item = (AttributeSet, AttributeSet)>>(iter: T) -> Self {
        let mut set = FdSet::new();
        for (det, dep) in iter {
            set.insert_unchecked(det, dep);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::attribute_set;

    #[test]
    fn insert_rejects_attribute_outside_universe() {
        let universe = attribute_set(["id", "name"]);
        let mut fds = FdSet::new();
        let err = fds.insert(attribute_set(["id"]), attribute_set(["email"]), &universe).unwrap_err();
        assert!(matches!(err, FdError::UnknownAttribute(_)));
    }

    #[test]
    fn insert_rejects_empty_determinant() {
        let universe = attribute_set(["id", "name"]);
        let mut fds = FdSet::new();
        assert!(fds.insert(AttributeSet::default(), attribute_set(["name"]), &universe).is_err());
    }

    #[test]
    fn insert_rejects_fully_trivial_dependency() {
        let universe = attribute_set(["id", "name"]);
        let mut fds = FdSet::new();
        let err = fds.insert(attribute_set(["id"]), attribute_set(["id"]), &universe).unwrap_err();
        assert!(matches!(err, FdError::TrivialDependency(_)));
    }

    #[test]
    fn insert_merges_dependents_sharing_a_determinant() {
        let universe = attribute_set(["id", "name", "email"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["id"]), attribute_set(["name"]), &universe).unwrap();
        fds.insert(attribute_set(["id"]), attribute_set(["email"]), &universe).unwrap();

        assert_eq!(fds.len(), 1);
        let (_, dependent) = fds.iter().next().unwrap();
        assert!(dependent.contains("name") && dependent.contains("email"));
    }

    #[test]
    fn insert_drops_determinant_overlap_but_keeps_remaining_dependents() {
        let universe = attribute_set(["id", "name"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["id"]), attribute_set(["id", "name"]), &universe).unwrap();

        let (_, dependent) = fds.iter().next().unwrap();
        assert_eq!(dependent.len(), 1);
        assert!(dependent.contains("name"));
    }

    #[test]
    fn singleton_pairs_flattens_and_sorts_dependents() {
        let universe = attribute_set(["id", "name", "email"]);
        let mut fds = FdSet::new();
        fds.insert(attribute_set(["id"]), attribute_set(["email", "name"]), &universe).unwrap();

        let pairs = fds.singleton_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1, "email");
        assert_eq!(pairs[1].1, "name");
    }
}
