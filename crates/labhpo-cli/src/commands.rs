use std::path::Path;

use anyhow::{Result, anyhow};

use labhpo_cli::config::RunConfig;
use labhpo_cli::pipeline::{
    ReferenceData, aggregate, classify, infer, load_ontology, read_summaries, run_all,
    write_diagnostics, write_summaries,
};
use labhpo_output::DirectMappingSink;

use crate::cli::{ClassifyArgs, InferArgs, RunArgs, SummarizeArgs};
use crate::types::CommandResult;

fn require<'a>(value: Option<&'a Path>, flag: &str) -> Result<&'a Path> {
    value.ok_or_else(|| anyhow!("missing {flag} (pass it on the command line or in --config)"))
}

pub fn run_summarize(args: &SummarizeArgs, config: RunConfig) -> Result<CommandResult> {
    let config = config.merge(args.overrides());
    let lab_events = require(config.lab_events.as_deref(), "--lab-events")?;
    let aggregation = aggregate(lab_events)?;
    write_summaries(&args.output, &aggregation.summaries)?;
    Ok(CommandResult {
        outputs: vec![("Summary", args.output.clone())],
        read: Some(aggregation.read),
        aggregation: Some(aggregation.stats),
        ..CommandResult::default()
    })
}

pub fn run_classify(args: &ClassifyArgs, config: RunConfig) -> Result<CommandResult> {
    let config = config.merge(args.overrides());
    let batch_size = config.batch_size()?;
    let lab_events = require(config.lab_events.as_deref(), "--lab-events")?;
    let reference = ReferenceData::load(&config.reference_paths())?;

    let (summaries, aggregation) = match &args.summary {
        Some(path) => (read_summaries(path)?, None),
        None => {
            let aggregation = aggregate(lab_events)?;
            (aggregation.summaries, Some(aggregation.stats))
        }
    };

    let report = classify(
        lab_events,
        &reference,
        &summaries,
        DirectMappingSink::new(&args.output),
        batch_size,
    )?;
    let mut outputs = vec![("Direct mappings", args.output.clone())];
    if let Some(path) = &config.diagnostics {
        write_diagnostics(path, &report.diagnostics)?;
        outputs.push(("Diagnostics", path.clone()));
    }
    Ok(CommandResult {
        outputs,
        read: Some(report.read),
        aggregation,
        classification: Some(report),
        closure: None,
    })
}

pub fn run_infer(args: &InferArgs, config: RunConfig) -> Result<CommandResult> {
    let config = config.merge(args.overrides());
    let batch_size = config.batch_size()?;
    let ontology = load_ontology(&config.reference_paths().ontology)?;
    let report = infer(&args.mappings, &ontology, &args.output, batch_size)?;
    Ok(CommandResult {
        outputs: vec![("Inferred mappings", args.output.clone())],
        closure: Some(report),
        ..CommandResult::default()
    })
}

pub fn run_pipeline(args: &RunArgs, config: RunConfig) -> Result<CommandResult> {
    let config = config.merge(args.overrides());
    let batch_size = config.batch_size()?;
    let lab_events = require(config.lab_events.as_deref(), "--lab-events")?;
    let output_dir = require(config.output_dir.as_deref(), "--output-dir")?;
    let run = run_all(
        lab_events,
        &config.reference_paths(),
        output_dir,
        config.diagnostics.as_deref(),
        batch_size,
    )?;

    let mut outputs = vec![
        ("Summary", run.summary),
        ("Direct mappings", run.direct),
        ("Inferred mappings", run.inferred),
    ];
    if let Some(path) = run.diagnostics {
        outputs.push(("Diagnostics", path));
    }
    Ok(CommandResult {
        outputs,
        read: Some(run.classification.read),
        aggregation: Some(run.aggregation),
        classification: Some(run.classification),
        closure: Some(run.closure),
    })
}
