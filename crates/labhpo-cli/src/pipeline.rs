//! Pipeline stages shared by the subcommands.
//!
//! Each stage runs inside its own `info_span!` and reports totals at `info`.
//! Classification reads the lab-event file a second time rather than
//! holding every record in memory between passes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span, trace};

use labhpo_core::{
    AggregationStats, AnnotationIndex, BatchSink, BatchStats, ClassificationDiagnostics,
    ClosureConfig, ClosureReport, LabResultClassifier, MappingBatcher, OntologyClosureEngine,
    StatisticsAggregator,
};
use labhpo_ingest::{LabEventReader, ReadStats, load_summaries, save_summaries};
use labhpo_model::{DirectMapping, LabSummary};
use labhpo_ontology::{AncestorQuery, OntologyGraph, load_obo};
use labhpo_output::{
    CsvMappingSource, DirectMappingSink, InferredMappingSink, save_fallback_report,
};
use labhpo_reference::{LabDictionary, load_annotations, load_lab_dictionary, load_scale_table};

use crate::config::ReferencePaths;
use crate::logging::redact_value;

pub const SUMMARY_FILE: &str = "lab_summary.tsv";
pub const DIRECT_MAPPINGS_FILE: &str = "lab_hpo.csv";
pub const INFERRED_MAPPINGS_FILE: &str = "inferred_lab_hpo.csv";

/// Output of the aggregation pass.
#[derive(Debug)]
pub struct Aggregation {
    pub summaries: BTreeMap<u32, LabSummary>,
    pub read: ReadStats,
    pub stats: AggregationStats,
}

/// Reference tables needed by the classifier.
#[derive(Debug)]
pub struct ReferenceData {
    pub dictionary: LabDictionary,
    pub index: AnnotationIndex,
}

impl ReferenceData {
    pub fn load(paths: &ReferencePaths) -> Result<Self> {
        let dictionary = load_lab_dictionary(&paths.lab_dictionary)
            .with_context(|| format!("load lab dictionary {}", paths.lab_dictionary.display()))?;
        let scales = load_scale_table(&paths.scale_table)
            .with_context(|| format!("load scale table {}", paths.scale_table.display()))?;
        let records = load_annotations(&paths.annotations)
            .with_context(|| format!("load annotations {}", paths.annotations.display()))?;
        let index = AnnotationIndex::build(records, &scales).context("build annotation index")?;
        info!(
            tests = dictionary.len(),
            mapped = dictionary.mapped_count(),
            annotated = index.len(),
            "Reference data ready"
        );
        Ok(Self { dictionary, index })
    }
}

#[derive(Debug)]
pub struct ClassifyReport {
    pub read: ReadStats,
    pub written: BatchStats,
    pub diagnostics: ClassificationDiagnostics,
}

/// First pass: fold every lab event into per-test summaries.
pub fn aggregate(lab_events: &Path) -> Result<Aggregation> {
    let _span = info_span!("summarize", path = %lab_events.display()).entered();
    let mut reader = LabEventReader::open(lab_events)
        .with_context(|| format!("open lab events {}", lab_events.display()))?;
    let mut aggregator = StatisticsAggregator::new();
    for result in reader.by_ref() {
        let result = result.with_context(|| format!("read lab events {}", lab_events.display()))?;
        aggregator.observe(&result);
    }
    let read = reader.stats();
    let stats = aggregator.stats();
    info!(
        read = read.read,
        skipped = read.skipped,
        tests = aggregator.len(),
        observed = stats.observed,
        non_numeric = stats.non_numeric,
        "Aggregation complete"
    );
    Ok(Aggregation {
        summaries: aggregator.finish(),
        read,
        stats,
    })
}

pub fn write_summaries(path: &Path, summaries: &BTreeMap<u32, LabSummary>) -> Result<()> {
    save_summaries(path, summaries)
        .with_context(|| format!("write summaries {}", path.display()))
}

pub fn read_summaries(path: &Path) -> Result<BTreeMap<u32, LabSummary>> {
    load_summaries(path).with_context(|| format!("load summaries {}", path.display()))
}

/// Second pass: classify every lab event and append the direct mappings to `sink`.
pub fn classify<S>(
    lab_events: &Path,
    reference: &ReferenceData,
    summaries: &BTreeMap<u32, LabSummary>,
    sink: S,
    batch_size: u64,
) -> Result<ClassifyReport>
where
    S: BatchSink<DirectMapping>,
{
    let _span = info_span!("classify", path = %lab_events.display(), batch_size).entered();
    let batch_size = usize::try_from(batch_size).context("batch size does not fit in memory")?;
    let classifier = LabResultClassifier::new(&reference.dictionary, &reference.index, summaries);
    let mut diagnostics = ClassificationDiagnostics::new();
    let mut batcher =
        MappingBatcher::start(sink, batch_size).context("start direct mapping table")?;

    let mut reader = LabEventReader::open(lab_events)
        .with_context(|| format!("open lab events {}", lab_events.display()))?;
    for result in reader.by_ref() {
        let result = result.with_context(|| format!("read lab events {}", lab_events.display()))?;
        let outcome = classifier.classify(&result, &mut diagnostics);
        trace!(
            row_id = result.row_id,
            test_id = result.test_id,
            value = redact_value(&result.value),
            accepted = outcome.is_accepted(),
            "Classified lab event"
        );
        batcher
            .push(DirectMapping::from(&outcome))
            .context("write direct mappings")?;
    }
    let (_, written) = batcher.finish().context("write direct mappings")?;

    let read = reader.stats();
    info!(
        read = read.read,
        skipped = read.skipped,
        accepted = diagnostics.accepted(),
        rejected = diagnostics.total() - diagnostics.accepted(),
        fallback_failures = diagnostics.fallback_failures().len(),
        batches = written.batches,
        "Classification complete"
    );
    Ok(ClassifyReport {
        read,
        written,
        diagnostics,
    })
}

pub fn write_diagnostics(path: &Path, diagnostics: &ClassificationDiagnostics) -> Result<()> {
    save_fallback_report(path, diagnostics)
        .with_context(|| format!("write diagnostics {}", path.display()))
}

pub fn load_ontology(path: &Path) -> Result<OntologyGraph> {
    load_obo(path).with_context(|| format!("load ontology {}", path.display()))
}

/// Closure stage: expand a direct-mapping table into `output`.
pub fn infer<O>(mappings: &Path, ontology: &O, output: &Path, batch_size: u64) -> Result<ClosureReport>
where
    O: AncestorQuery + ?Sized,
{
    let source = CsvMappingSource::open(mappings)
        .with_context(|| format!("open direct mappings {}", mappings.display()))?;
    let config = ClosureConfig::new(batch_size)?;
    let mut sink = InferredMappingSink::new(output);
    OntologyClosureEngine::new(ontology, config)
        .run(&source, &mut sink)
        .with_context(|| format!("write inferred mappings {}", output.display()))
}

/// Files and totals from an end-to-end run.
#[derive(Debug)]
pub struct RunOutputs {
    pub summary: PathBuf,
    pub direct: PathBuf,
    pub inferred: PathBuf,
    pub diagnostics: Option<PathBuf>,
    pub aggregation: AggregationStats,
    pub classification: ClassifyReport,
    pub closure: ClosureReport,
}

/// Summarize, classify and infer, writing every table into `output_dir`.
///
/// All reference data, the ontology included, is loaded before the first
/// lab event is read.
pub fn run_all(
    lab_events: &Path,
    reference: &ReferencePaths,
    output_dir: &Path,
    diagnostics: Option<&Path>,
    batch_size: u64,
) -> Result<RunOutputs> {
    let _span = info_span!("run", output_dir = %output_dir.display()).entered();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;
    let tables = ReferenceData::load(reference)?;
    let ontology = load_ontology(&reference.ontology)?;

    let aggregation = aggregate(lab_events)?;
    let summary = output_dir.join(SUMMARY_FILE);
    write_summaries(&summary, &aggregation.summaries)?;

    let direct = output_dir.join(DIRECT_MAPPINGS_FILE);
    let classification = classify(
        lab_events,
        &tables,
        &aggregation.summaries,
        DirectMappingSink::new(&direct),
        batch_size,
    )?;
    if let Some(path) = diagnostics {
        write_diagnostics(path, &classification.diagnostics)?;
    }

    let inferred = output_dir.join(INFERRED_MAPPINGS_FILE);
    let closure = infer(&direct, &ontology, &inferred, batch_size)?;

    Ok(RunOutputs {
        summary,
        direct,
        inferred,
        diagnostics: diagnostics.map(Path::to_path_buf),
        aggregation: aggregation.stats,
        classification,
        closure,
    })
}
