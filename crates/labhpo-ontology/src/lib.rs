//! Phenotype ontology hierarchy: loading and transitive ancestor queries.

pub mod error;
pub mod graph;
pub mod obo;

pub use error::OntologyError;
pub use graph::{AncestorQuery, OntologyGraph};
pub use obo::{load_obo, parse_obo};
