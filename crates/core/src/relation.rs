use crate::attribute::{Attribute, AttributeSet};

/// A named, ordered collection of attributes with a designated primary key.
///
/// Attribute order is preserved from introspection/request order; the
/// primary key is a possibly-composite, possibly-empty set of names that
/// must each name an attribute of this relation.
#[derive(Debug, Clone)]
pub struct Relation {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub primary_key: AttributeSet,
}

impl Relation {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>, primary_key: AttributeSet) -> Self {
        Relation {
            name: name.into(),
            attributes,
            primary_key,
        }
    }

    /// The full attribute universe `U` of this relation.
    pub fn universe(&self) -> AttributeSet {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}
