//! Property tests for aggregation, classification and closure invariants.

mod common;

use common::{POTASSIUM, dictionary, index, lab};
use labhpo_core::{
    ClassificationDiagnostics, ClosureConfig, ClosureReport, LabResultClassifier,
    OntologyClosureEngine, StatisticsAggregator, read_quantitative,
};
use labhpo_model::{
    DirectMapping, ErrorKind, InterpretationCode, LabSummary, NegationFlag, NormalRange, TermId,
};
use labhpo_ontology::{AncestorQuery, OntologyGraph};
use proptest::prelude::*;

const UNITS: [&str; 3] = ["meq/l", "mmol/l", "mg/dl"];

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

fn term(n: usize) -> TermId {
    TermId::parse(&format!("HP:{n:07}")).expect("valid term id")
}

fn dag(parents: &[Vec<usize>]) -> OntologyGraph {
    let mut graph = OntologyGraph::new();
    for (child, ps) in parents.iter().enumerate() {
        graph.add_term(term(child), None);
        for parent in ps {
            graph.add_is_a(term(child), term(*parent));
        }
    }
    graph
}

fn dag_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..25).prop_flat_map(|size| {
        (0..size)
            .map(|node| {
                if node == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..node, 1..3).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn running_mean_equals_arithmetic_mean(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
        let mut summary = LabSummary::new(1);
        for value in &values {
            summary.add("u", *value);
        }
        let unit = summary.unit("u").expect("unit present");
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert_eq!(unit.count, values.len() as u64);
        prop_assert!(approx_eq(unit.mean, expected), "{} vs {}", unit.mean, expected);
    }

    #[test]
    fn primary_unit_is_first_unit_with_highest_count(
        observations in prop::collection::vec((0usize..UNITS.len(), 0.0f64..10.0), 1..60)
    ) {
        let run = || {
            let mut aggregator = StatisticsAggregator::new();
            for (unit, value) in &observations {
                aggregator.add(1, UNITS[*unit], *value);
            }
            aggregator.primary_unit(1).map(str::to_string)
        };
        let primary = run();
        prop_assert_eq!(&primary, &run());

        let mut order: Vec<&str> = Vec::new();
        let mut counts = [0u64; UNITS.len()];
        for (unit, _) in &observations {
            counts[*unit] += 1;
            if !order.contains(&UNITS[*unit]) {
                order.push(UNITS[*unit]);
            }
        }
        let max = counts.iter().copied().max().unwrap_or_default();
        let expected = order
            .into_iter()
            .find(|name| UNITS.iter().position(|u| u == name).is_some_and(|i| counts[i] == max));
        prop_assert_eq!(primary.as_deref(), expected);
    }

    #[test]
    fn correction_fires_only_for_flagged_normal(
        min in -100.0f64..100.0,
        width in 0.0f64..50.0,
        value in -200.0f64..200.0,
        mean in -200.0f64..200.0,
        flagged in any::<bool>(),
    ) {
        let range = NormalRange { count: 2, min, mean: min + width / 2.0, max: min + width };
        let reading = read_quantitative(value, &range, mean, flagged);
        let in_range = value >= range.min && value <= range.max;
        prop_assert_eq!(reading.corrected, in_range && flagged);
        let expected = if !in_range {
            if value < range.min { InterpretationCode::Low } else { InterpretationCode::High }
        } else if flagged {
            if value < mean { InterpretationCode::Low } else { InterpretationCode::High }
        } else {
            InterpretationCode::Normal
        };
        prop_assert_eq!(reading.interpretation, expected);
    }

    #[test]
    fn unit_mismatch_always_rejects(
        history in prop::collection::vec(3.0f64..6.0, 1..20),
        value in 0.0f64..10.0,
        flag in prop_oneof![Just(""), Just("abnormal")],
    ) {
        let mut aggregator = StatisticsAggregator::new();
        for (idx, v) in history.iter().enumerate() {
            aggregator.observe(&lab(idx as u64, POTASSIUM, &v.to_string(), "mEq/L", ""));
        }
        let summaries = aggregator.finish();
        let dictionary = dictionary();
        let index = index();
        let classifier = LabResultClassifier::new(&dictionary, &index, &summaries);
        let outcome = classifier.classify(
            &lab(1000, POTASSIUM, &value.to_string(), "mmol/L", flag),
            &mut ClassificationDiagnostics::new(),
        );
        prop_assert_eq!(outcome.error_kind(), Some(ErrorKind::UnableToInterpret));
    }

    #[test]
    fn closure_rows_match_ancestor_sets(
        parents in dag_strategy(),
        picks in prop::collection::vec((0usize..25, any::<bool>()), 0..30),
        batch_size in 1u64..8,
    ) {
        let graph = dag(&parents);
        let rows: Vec<DirectMapping> = picks
            .iter()
            .enumerate()
            .map(|(idx, (node, negated))| DirectMapping {
                row_id: idx as u64 * 3,
                negated: if *negated { NegationFlag::Negated } else { NegationFlag::Present },
                map_to: term(node % parents.len()).to_string(),
            })
            .collect();
        let store: labhpo_core::MemoryMappingStore = rows.iter().cloned().collect();
        let mut sink = labhpo_core::MemorySink::new();
        let config = ClosureConfig::new(batch_size).expect("config");
        let report: ClosureReport = OntologyClosureEngine::new(&graph, config)
            .run(&store, &mut sink)
            .expect("closure");

        for row in &rows {
            let emitted = sink.rows().iter().filter(|m| m.source_row_id == row.row_id).count();
            if row.negated == NegationFlag::Negated {
                prop_assert_eq!(emitted, 0);
            } else {
                let term = TermId::parse(&row.map_to).expect("generated term");
                let ancestors = graph.ancestors(&term, false).expect("known term");
                prop_assert_eq!(emitted, ancestors.len());
            }
        }
        prop_assert_eq!(report.rows_written as usize, sink.rows().len());
        prop_assert_eq!(report.rows_read as usize, rows.len());
    }
}
