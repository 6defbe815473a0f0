//! Reference data loaders.
//!
//! Everything here is loaded once before classification starts. Failures are
//! fatal and surface as [`ReferenceError`].

pub mod annotation;
pub mod csv_utils;
pub mod dictionary;
pub mod error;
pub mod scale;

pub use annotation::{AnnotationRecord, INTERPRETATION_SYSTEM, load_annotations};
pub use csv_utils::{
    ANNOTATIONS_FILE, LAB_DICTIONARY_FILE, ONTOLOGY_FILE, REFERENCE_ENV_VAR, SCALE_TABLE_FILE,
    default_reference_root,
};
pub use dictionary::{DictionaryEntry, LabDictionary, load_lab_dictionary};
pub use error::ReferenceError;
pub use scale::{ScaleTable, load_scale_table};
