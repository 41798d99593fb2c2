use super::dataset_store::{DatasetStore, UsageSummary};
use super::row_file;
use super::usage_ledger::UsageLedger;
use crate::domain::{DataRow, ScenarioFilter, ScenarioType};
use crate::error::DatasetError;
use chrono::Utc;
use std::fs;
use tempfile::TempDir;

fn row(scenario: ScenarioType, name: &str) -> DataRow {
    let mut row = DataRow::new(scenario);
    row.push("Name", name);
    row
}

fn seeded_store(dir: &TempDir) -> DatasetStore {
    let mut store = DatasetStore::new(dir.path().join("rows.csv"), dir.path().join("ledger.json"));
    store
        .replace_rows(
            vec!["Name".to_string()],
            vec![
                row(ScenarioType::Positive, "p0"),
                row(ScenarioType::Negative, "n1"),
                row(ScenarioType::Positive, "p2"),
            ],
        )
        .unwrap();
    store
}

#[test]
fn test_missing_file_reports_no_data() {
    let dir = TempDir::new().unwrap();
    let mut store = DatasetStore::new(dir.path().join("rows.csv"), dir.path().join("ledger.json"));
    assert!(!store.data_exists());
    assert!(!store.load().unwrap());
    assert!(store.is_empty());
    assert_eq!(store.get_next_available_row(ScenarioFilter::Any).unwrap(), None);
}

#[test]
fn test_selection_follows_file_order() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);

    let first = store.get_next_available_row(ScenarioFilter::Any).unwrap().unwrap();
    assert_eq!(first.index, 0);
    store.mark_row_used(first.index).unwrap();

    let second = store.get_next_available_row(ScenarioFilter::Any).unwrap().unwrap();
    assert_eq!(second.index, 1);
    assert_eq!(second.row.get("Name"), Some("n1"));
}

#[test]
fn test_filtered_selection() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);

    let negative = store
        .get_next_available_row(ScenarioFilter::Negative)
        .unwrap()
        .unwrap();
    assert_eq!(negative.index, 1);
    store.mark_row_used(1).unwrap();

    assert_eq!(
        store.get_next_available_row(ScenarioFilter::Negative).unwrap(),
        None
    );
    // Filtered exhaustion must not reset.
    assert_eq!(store.usage_summary().used, 1);

    let positive = store
        .get_next_available_row(ScenarioFilter::Positive)
        .unwrap()
        .unwrap();
    assert_eq!(positive.index, 0);
}

#[test]
fn test_unfiltered_exhaustion_resets_once() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    for index in 0..3 {
        store.mark_row_used(index).unwrap();
    }
    assert_eq!(store.usage_summary().available, 0);

    let selection = store.get_next_available_row(ScenarioFilter::Any).unwrap().unwrap();
    assert_eq!(selection.index, 0);
    assert_eq!(
        store.usage_summary(),
        UsageSummary {
            total: 3,
            used: 0,
            available: 3
        }
    );
}

#[test]
fn test_mark_row_used_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    store.mark_row_used(2).unwrap();
    let stamp = store.ledger().entries[&2].used_at;
    store.mark_row_used(2).unwrap();
    assert_eq!(store.ledger().entries[&2].used_at, stamp);
    assert_eq!(store.usage_summary().used, 1);
}

#[test]
fn test_mark_row_used_out_of_range() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    assert!(matches!(
        store.mark_row_used(3),
        Err(DatasetError::IndexOutOfRange { index: 3, len: 3 })
    ));
}

#[test]
fn test_used_row_never_returned_until_reset() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    store.mark_row_used(1).unwrap();

    for _ in 0..2 {
        let selection = store.get_next_available_row(ScenarioFilter::Any).unwrap().unwrap();
        assert_ne!(selection.index, 1);
        store.mark_row_used(selection.index).unwrap();
    }

    store.reset_usage().unwrap();
    let selection = store
        .get_next_available_row(ScenarioFilter::Negative)
        .unwrap()
        .unwrap();
    assert_eq!(selection.index, 1);
}

#[test]
fn test_usage_survives_reload() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    store.mark_row_used(0).unwrap();

    let mut reopened = DatasetStore::new(dir.path().join("rows.csv"), dir.path().join("ledger.json"));
    assert!(reopened.load().unwrap());
    assert!(reopened.row(0).unwrap().used);
    assert_eq!(reopened.ledger().last_used_index, Some(0));
    let selection = reopened.get_next_available_row(ScenarioFilter::Any).unwrap().unwrap();
    assert_eq!(selection.index, 1);
}

#[test]
fn test_load_heals_row_flag_without_ledger() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);
    let mut rows = store.rows().to_vec();
    rows[2].used = true;
    row_file::write_rows(store.row_file(), store.labels(), &rows).unwrap();

    let mut reopened = DatasetStore::new(store.row_file(), store.ledger_file());
    reopened.load().unwrap();
    assert!(reopened.ledger().is_used(2));

    let ledger = UsageLedger::load(store.ledger_file()).unwrap();
    assert!(ledger.is_used(2));
}

#[test]
fn test_load_heals_ledger_without_row_flag() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir);
    let mut ledger = UsageLedger::default();
    ledger.mark_used(1, Utc::now());
    ledger.mark_used(9, Utc::now());
    ledger.save(store.ledger_file()).unwrap();

    let mut reopened = DatasetStore::new(store.row_file(), store.ledger_file());
    reopened.load().unwrap();
    assert!(reopened.row(1).unwrap().used);
    assert!(!reopened.ledger().is_used(9));

    let table = row_file::read_rows(store.row_file()).unwrap();
    assert!(table.rows[1].used);
}

#[test]
fn test_append_columns_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);

    let duplicate = store.append_columns(&["Name".to_string()], &vec![vec!["x".to_string()]; 3]);
    assert!(matches!(duplicate, Err(DatasetError::DuplicateColumn(_))));

    let reserved = store.append_columns(&["Used".to_string()], &vec![vec!["x".to_string()]; 3]);
    assert!(matches!(reserved, Err(DatasetError::DuplicateColumn(_))));

    let short = store.append_columns(&["City".to_string()], &vec![vec!["x".to_string()]; 2]);
    assert!(matches!(short, Err(DatasetError::ShapeMismatch(_))));

    let ragged = store.append_columns(
        &["City".to_string()],
        &[vec!["a".to_string()], vec![], vec!["c".to_string()]],
    );
    assert!(matches!(ragged, Err(DatasetError::ShapeMismatch(_))));
    assert_eq!(store.labels(), &["Name".to_string()]);
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    store.mark_row_used(0).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{:?}", names);
}

#[test]
fn test_failed_write_keeps_previous_state() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);
    store.mark_row_used(2).unwrap();

    // A directory in place of the ledger file makes the rename fail.
    fs::remove_file(store.ledger_file()).unwrap();
    fs::create_dir(store.ledger_file()).unwrap();

    assert!(matches!(store.mark_row_used(0), Err(DatasetError::Io { .. })));
    assert!(!store.row(0).unwrap().used);
    assert!(!store.ledger().is_used(0));

    assert!(store.reset_usage().is_err());
    assert!(store.row(2).unwrap().used);
    assert!(store.ledger().is_used(2));
    assert_eq!(
        store.usage_summary(),
        UsageSummary {
            total: 3,
            used: 1,
            available: 2
        }
    );
}

#[test]
fn test_failed_append_keeps_columns() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&dir);

    fs::remove_file(store.row_file()).unwrap();
    fs::create_dir(store.row_file()).unwrap();

    let result = store.append_columns(&["City".to_string()], &vec![vec!["x".to_string()]; 3]);
    assert!(result.is_err());
    assert_eq!(store.labels(), &["Name".to_string()]);
    assert!(store.rows().iter().all(|r| r.get("City").is_none()));
}
