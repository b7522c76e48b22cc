pub mod attribute;
pub mod closure;
pub mod cover;
pub mod error;
pub mod fd;
pub mod keys;
pub mod preserve;
pub mod project;
pub mod relation;

pub use normform_helpers::{Config, IndexMap, IndexSet};
