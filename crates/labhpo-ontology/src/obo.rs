//! Loader for the subset of the OBO flat-file format the hierarchy needs.
//!
//! Only `[Term]` stanzas are read, and of those only `id`, `name`, `alt_id`,
//! `is_a`, `is_obsolete` and `replaced_by`. Everything else is ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use labhpo_model::TermId;
use tracing::{debug, info};

use crate::error::OntologyError;
use crate::graph::OntologyGraph;

#[derive(Default)]
struct Stanza {
    is_term: bool,
    start_line: usize,
    id: Option<String>,
    name: Option<String>,
    alt_ids: Vec<String>,
    is_a: Vec<String>,
    obsolete: bool,
    replaced_by: Option<String>,
}

/// Load and validate an OBO file from disk.
pub fn load_obo(path: &Path) -> Result<OntologyGraph, OntologyError> {
    let file = File::open(path).map_err(|source| OntologyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_obo(BufReader::new(file)).map_err(|err| match err {
        OntologyError::Io { source, .. } => OntologyError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    info!(
        path = %path.display(),
        terms = graph.term_count(),
        edges = graph.edge_count(),
        "Loaded ontology"
    );
    Ok(graph)
}

/// Parse OBO text into a graph and reject cyclic hierarchies.
pub fn parse_obo<R: BufRead>(reader: R) -> Result<OntologyGraph, OntologyError> {
    let mut graph = OntologyGraph::new();
    let mut current: Option<Stanza> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| OntologyError::Io {
            path: Default::default(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            if let Some(stanza) = current.take() {
                flush_stanza(&mut graph, stanza)?;
            }
            current = Some(Stanza {
                is_term: line == "[Term]",
                start_line: line_no,
                ..Stanza::default()
            });
            continue;
        }
        // Header tags before the first stanza.
        let Some(stanza) = current.as_mut() else {
            continue;
        };
        if !stanza.is_term {
            continue;
        }
        let Some((tag, value)) = line.split_once(':') else {
            return Err(OntologyError::Parse {
                line: line_no,
                message: format!("expected `tag: value`, found `{line}`"),
            });
        };
        let value = value.trim();
        match tag.trim() {
            "id" => stanza.id = Some(first_token(value)),
            "name" => stanza.name = Some(value.to_string()),
            "alt_id" => stanza.alt_ids.push(first_token(value)),
            "is_a" => stanza.is_a.push(first_token(value)),
            "is_obsolete" => stanza.obsolete = value.eq_ignore_ascii_case("true"),
            "replaced_by" => stanza.replaced_by = Some(first_token(value)),
            _ => {}
        }
    }
    if let Some(stanza) = current.take() {
        flush_stanza(&mut graph, stanza)?;
    }

    graph.check_acyclic()?;
    Ok(graph)
}

/// Drop trailing `! comment` text and qualifier blocks.
fn first_token(value: &str) -> String {
    value
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn parse_term(raw: &str, line: usize) -> Result<TermId, OntologyError> {
    TermId::parse(raw).map_err(|err| OntologyError::Parse {
        line,
        message: err.to_string(),
    })
}

fn flush_stanza(graph: &mut OntologyGraph, stanza: Stanza) -> Result<(), OntologyError> {
    if !stanza.is_term {
        return Ok(());
    }
    let line = stanza.start_line;
    let Some(raw_id) = stanza.id.as_deref() else {
        return Err(OntologyError::Parse {
            line,
            message: "term stanza without id".to_string(),
        });
    };
    let id = parse_term(raw_id, line)?;

    if stanza.obsolete {
        if let Some(replacement) = stanza.replaced_by.as_deref() {
            graph.add_alt_id(id, parse_term(replacement, line)?);
        } else {
            debug!(term = %id, "Skipping obsolete term without replacement");
        }
        return Ok(());
    }

    graph.add_term(id.clone(), stanza.name);
    for alt in &stanza.alt_ids {
        graph.add_alt_id(parse_term(alt, line)?, id.clone());
    }
    for parent in &stanza.is_a {
        graph.add_is_a(id.clone(), parse_term(parent, line)?);
    }
    Ok(())
}
