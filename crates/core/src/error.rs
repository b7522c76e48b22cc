use thiserror::Error;

/// Errors raised by the FD algebra kernel and the normal-form analyzer.
///
/// These are the two kinds of the taxonomy that never touch a database:
/// malformed input to the algebra itself, and invariants the decomposer
/// expects to hold but failed to establish.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FdError {
    #[error("determinant or dependent attribute not in the relation's attribute universe: {0}")]
    UnknownAttribute(String),

    #[error("dependent set overlaps the determinant set: {0:?}")]
    TrivialDependency(String),

    #[error("relation has no designated primary key; only 1NF can be assessed")]
    MissingPrimaryKey,

    #[error("decomposition invariant violated: {0}")]
    DecompositionInvariant(String),
}
