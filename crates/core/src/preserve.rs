use crate::attribute::AttributeSet;
use crate::fd::FdSet;

/// `IsPreserved(X → Y, decomposition)`: true iff `X ∪ Y` is wholly contained
/// in at least one sub-schema's attribute set.
///
/// This is the simple attribute-containment test the spec mandates, not a
/// closure-over-`F⁺` check.
pub fn is_preserved(determinant: &AttributeSet, dependent: &AttributeSet, sub_schemas: &[AttributeSet]) -> bool {
    sub_schemas.iter().any(|schema| {
        determinant.iter().all(|a| schema.contains(a)) && dependent.iter().all(|a| schema.contains(a))
    })
}

/// Returns the original FDs not preserved by `sub_schemas`, formatted as
/// `{det} -> {dep}` strings (lexicographically sorted members), matching the
/// original implementation's `check_fd_preservation` output shape.
pub fn lost_fds(fds: &FdSet, sub_schemas: &[AttributeSet]) -> Vec<String> {
    let mut lost = Vec::new();
    for (det, dep) in fds.iter() {
        if !is_preserved(det, dep, sub_schemas) {
            lost.push(format!(
                "{{{}}} -> {{{}}}",
                crate::attribute::sorted(det).join(", "),
                crate::attribute::sorted(dep).join(", ")
            ));
        }
    }
    lost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::attribute_set;

    #[test]
    fn bcnf_scenario_loses_si_to_p() {
        let mut f = FdSet::new();
        f.insert_unchecked(attribute_set(["S", "I"]), attribute_set(["P"]));
        f.insert_unchecked(attribute_set(["P"]), attribute_set(["I"]));

        let r1 = attribute_set(["P", "I"]);
        let r2 = attribute_set(["S", "P"]);
        let lost = lost_fds(&f, &[r1, r2]);
        assert_eq!(lost, vec!["{I, S} -> {P}"]);
    }
}
