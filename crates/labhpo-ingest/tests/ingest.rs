//! Tests for reading lab events and persisting summaries on disk.

use std::collections::BTreeMap;
use std::fs;

use labhpo_ingest::{IngestError, load_summaries, read_lab_events, save_summaries};
use labhpo_model::LabSummary;
use tempfile::TempDir;

#[test]
fn reads_lab_event_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("labevents.csv");
    fs::write(
        &path,
        "ROW_ID,SUBJECT_ID,HADM_ID,ITEMID,CHARTTIME,VALUE,VALUENUM,VALUEUOM,FLAG\n\
         1,10,100,50878,2101-10-12 16:07:00,31,31,IU/L,\n\
         2,10,100,50878,2101-10-13 16:07:00,95,95,IU/L,abnormal\n\
         3,10,bad,50878,2101-10-13 16:07:00,95,95,IU/L,abnormal\n",
    )
    .expect("write events");

    let (results, stats) = read_lab_events(&path).expect("read events");
    assert_eq!(results.len(), 2);
    assert_eq!(stats.read, 2);
    assert_eq!(stats.skipped, 1);
    assert!(results[1].is_flagged_abnormal());
}

#[test]
fn missing_lab_event_file_reports_path() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.csv");
    match read_lab_events(&path) {
        Err(IngestError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {:?}", other.map(|(r, _)| r.len())),
    }
}

#[test]
fn summaries_survive_save_and_load() {
    let mut potassium = LabSummary::new(50971);
    potassium.add("meq/l", 4.1);
    potassium.add_normal("meq/l", 4.1);
    potassium.add("meq/l", 6.2);
    potassium.add("mmol/l", 3.9);
    potassium.add_normal("mmol/l", 3.9);
    let mut unitless = LabSummary::new(51266);
    unitless.add("?", 12.0);

    let summaries: BTreeMap<u32, LabSummary> =
        [(50971, potassium.clone()), (51266, unitless.clone())].into();

    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("lab_summary.tsv");
    save_summaries(&path, &summaries).expect("save");

    let text = fs::read_to_string(&path).expect("read back");
    assert!(text.starts_with("ITEMID\tUNIT\tCOUNT\tMEAN\tNORMAL_COUNT\t"));
    assert!(text.contains("51266\t?\t1\t12.0\t\t\t\t\n"));

    let loaded = load_summaries(&path).expect("load");
    assert_eq!(loaded, summaries);
    assert_eq!(
        loaded[&50971].primary_unit().map(|u| u.unit.as_str()),
        Some("meq/l")
    );
}
