//! Run configuration: an optional TOML file overlaid by command-line flags.
//!
//! ```toml
//! batchSize = 500
//! labEvents = "data/labevents.csv"
//! outputDir = "out"
//! ```
//!
//! Reference file paths left unset resolve against the reference directory
//! (see [`default_reference_root`]).

use std::path::{Path, PathBuf};

use labhpo_core::DEFAULT_BATCH_SIZE;
use labhpo_reference::{
    ANNOTATIONS_FILE, LAB_DICTIONARY_FILE, ONTOLOGY_FILE, SCALE_TABLE_FILE, default_reference_root,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("batchSize must be at least 1")]
    InvalidBatchSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunConfig {
    pub batch_size: Option<u64>,
    pub lab_events: Option<PathBuf>,
    pub lab_dictionary: Option<PathBuf>,
    pub scale_table: Option<PathBuf>,
    pub annotations: Option<PathBuf>,
    pub ontology: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub diagnostics: Option<PathBuf>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.batch_size()?;
        info!(path = %path.display(), "Loaded run configuration");
        Ok(config)
    }

    /// Overlay `overrides` on top of `self`; set fields in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            batch_size: overrides.batch_size.or(self.batch_size),
            lab_events: overrides.lab_events.or(self.lab_events),
            lab_dictionary: overrides.lab_dictionary.or(self.lab_dictionary),
            scale_table: overrides.scale_table.or(self.scale_table),
            annotations: overrides.annotations.or(self.annotations),
            ontology: overrides.ontology.or(self.ontology),
            output_dir: overrides.output_dir.or(self.output_dir),
            diagnostics: overrides.diagnostics.or(self.diagnostics),
        }
    }

    pub fn batch_size(&self) -> Result<u64, ConfigError> {
        match self.batch_size {
            Some(0) => Err(ConfigError::InvalidBatchSize),
            Some(size) => Ok(size),
            None => Ok(DEFAULT_BATCH_SIZE),
        }
    }

    pub fn reference_paths(&self) -> ReferencePaths {
        ReferencePaths::resolve(self, &default_reference_root())
    }
}

/// Fully resolved reference file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePaths {
    pub lab_dictionary: PathBuf,
    pub scale_table: PathBuf,
    pub annotations: PathBuf,
    pub ontology: PathBuf,
}

impl ReferencePaths {
    pub fn resolve(config: &RunConfig, root: &Path) -> Self {
        let pick = |explicit: &Option<PathBuf>, file: &str| {
            explicit.clone().unwrap_or_else(|| root.join(file))
        };
        Self {
            lab_dictionary: pick(&config.lab_dictionary, LAB_DICTIONARY_FILE),
            scale_table: pick(&config.scale_table, SCALE_TABLE_FILE),
            annotations: pick(&config.annotations, ANNOTATIONS_FILE),
            ontology: pick(&config.ontology, ONTOLOGY_FILE),
        }
    }
}
