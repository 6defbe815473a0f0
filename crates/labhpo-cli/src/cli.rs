//! CLI argument definitions for the `labhpo` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use labhpo_cli::config::RunConfig;

#[derive(Parser)]
#[command(
    name = "labhpo",
    version,
    about = "Translate laboratory results into phenotype ontology terms",
    long_about = "Translate laboratory results into phenotype ontology terms.\n\n\
                  Aggregates per-test statistics, classifies every result as low, high,\n\
                  normal, negative or positive, maps the interpretation to a phenotype\n\
                  term and expands each finding to all of its ontology ancestors."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow lab values in trace-level log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// TOML run configuration; flags given on the command line take precedence.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Aggregate per-test statistics and write them as TSV.
    Summarize(SummarizeArgs),

    /// Classify lab events into direct phenotype mappings.
    Classify(ClassifyArgs),

    /// Expand a direct-mapping table to all ontology ancestors.
    Infer(InferArgs),

    /// Summarize, classify and infer in one go.
    Run(RunArgs),
}

#[derive(Args)]
pub struct ReferenceArgs {
    /// Local test dictionary (CSV with ITEMID and LOINC_CODE).
    #[arg(long = "lab-dictionary", value_name = "FILE")]
    pub lab_dictionary: Option<PathBuf>,

    /// Scale table (CSV with LOINC_NUM and SCALE_TYP).
    #[arg(long = "scale-table", value_name = "FILE")]
    pub scale_table: Option<PathBuf>,

    /// Interpretation annotations (TSV).
    #[arg(long = "annotations", value_name = "FILE")]
    pub annotations: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SummarizeArgs {
    /// Raw lab-event CSV.
    #[arg(long = "lab-events", value_name = "FILE")]
    pub lab_events: Option<PathBuf>,

    /// Summary TSV to write.
    #[arg(long = "output", value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Raw lab-event CSV.
    #[arg(long = "lab-events", value_name = "FILE")]
    pub lab_events: Option<PathBuf>,

    /// Load summaries from a previous `summarize` run instead of recomputing.
    #[arg(long = "summary", value_name = "FILE")]
    pub summary: Option<PathBuf>,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Direct-mapping CSV to write.
    #[arg(long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Write quantitative tests whose textual fallback failed as TSV.
    #[arg(long = "diagnostics", value_name = "FILE")]
    pub diagnostics: Option<PathBuf>,

    /// Rows per batch written to the mapping table.
    #[arg(long = "batch-size", value_name = "N")]
    pub batch_size: Option<u64>,
}

#[derive(Parser)]
pub struct InferArgs {
    /// Direct-mapping CSV (ROW_ID,NEGATED,MAP_TO).
    #[arg(long = "mappings", value_name = "FILE")]
    pub mappings: PathBuf,

    /// Ontology in OBO format.
    #[arg(long = "ontology", value_name = "FILE")]
    pub ontology: Option<PathBuf>,

    /// Inferred-mapping CSV to write.
    #[arg(long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Row-id range covered by each closure batch.
    #[arg(long = "batch-size", value_name = "N")]
    pub batch_size: Option<u64>,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Raw lab-event CSV.
    #[arg(long = "lab-events", value_name = "FILE")]
    pub lab_events: Option<PathBuf>,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Ontology in OBO format.
    #[arg(long = "ontology", value_name = "FILE")]
    pub ontology: Option<PathBuf>,

    /// Directory for lab_summary.tsv, lab_hpo.csv and inferred_lab_hpo.csv.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write quantitative tests whose textual fallback failed as TSV.
    #[arg(long = "diagnostics", value_name = "FILE")]
    pub diagnostics: Option<PathBuf>,

    /// Rows per batch for both mapping tables.
    #[arg(long = "batch-size", value_name = "N")]
    pub batch_size: Option<u64>,
}

impl SummarizeArgs {
    pub fn overrides(&self) -> RunConfig {
        RunConfig {
            lab_events: self.lab_events.clone(),
            ..RunConfig::default()
        }
    }
}

impl ClassifyArgs {
    pub fn overrides(&self) -> RunConfig {
        RunConfig {
            lab_events: self.lab_events.clone(),
            diagnostics: self.diagnostics.clone(),
            batch_size: self.batch_size,
            ..self.reference.overrides()
        }
    }
}

impl InferArgs {
    pub fn overrides(&self) -> RunConfig {
        RunConfig {
            ontology: self.ontology.clone(),
            batch_size: self.batch_size,
            ..RunConfig::default()
        }
    }
}

impl RunArgs {
    pub fn overrides(&self) -> RunConfig {
        RunConfig {
            lab_events: self.lab_events.clone(),
            ontology: self.ontology.clone(),
            output_dir: self.output_dir.clone(),
            diagnostics: self.diagnostics.clone(),
            batch_size: self.batch_size,
            ..self.reference.overrides()
        }
    }
}

impl ReferenceArgs {
    fn overrides(&self) -> RunConfig {
        RunConfig {
            lab_dictionary: self.lab_dictionary.clone(),
            scale_table: self.scale_table.clone(),
            annotations: self.annotations.clone(),
            ..RunConfig::default()
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
