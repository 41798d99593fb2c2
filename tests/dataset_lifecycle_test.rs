use formseed::adapters::dataset_builder::{column_labels, DatasetBuilder};
use formseed::adapters::dataset_store::DatasetStore;
use formseed::adapters::placeholder_resolver::PlaceholderResolver;
use formseed::adapters::value_generator::ValueGenerator;
use formseed::domain::{FieldSchema, FieldType, ScenarioFilter, ScenarioType};
use tempfile::TempDir;

fn organization_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new("org", "Organization Name", FieldType::Text)
            .required(true)
            .with_lengths(Some(3), Some(40)),
        FieldSchema::new("counties", "Number of Counties Served", FieldType::Number)
            .required(true),
        FieldSchema::new("zip", "Zip Code", FieldType::Text).with_pattern(r"\d{5}"),
        FieldSchema::new("region", "Region", FieldType::Select)
            .required(true)
            .with_options(["North", "South", "-- Clear --"]),
    ]
}

fn store_in(dir: &TempDir) -> DatasetStore {
    DatasetStore::new(
        dir.path().join("data/dataset.csv"),
        dir.path().join("data/usage_ledger.json"),
    )
}

#[test]
fn test_generate_select_and_substitute() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fields = organization_fields();

    let mut generator = ValueGenerator::with_seed(1234);
    let dataset = DatasetBuilder::new(&mut generator).build_rows(&fields, 3, 2);

    let mut store = store_in(&temp_dir);
    assert!(!store.data_exists());
    store.replace_rows(dataset.labels.clone(), dataset.rows.clone())?;
    assert!(store.data_exists());

    let selection = store
        .get_next_available_row(ScenarioFilter::Positive)?
        .expect("a positive row");
    assert_eq!(selection.index, 0);
    store.mark_row_used(selection.index)?;

    let resolver = PlaceholderResolver::new();
    let instructions = "Type %organization name% and pick %Region%";
    let text = resolver.substitute(instructions, &selection.row);
    let org = selection.row.get("Organization Name").unwrap();
    assert!(text.starts_with(&format!("Type {}", org)));
    assert!(!text.contains("%organization name%"));

    let negative = store
        .get_next_available_row(ScenarioFilter::Negative)?
        .expect("a negative row");
    assert_eq!(negative.index, 3);
    assert_eq!(negative.row.scenario, ScenarioType::Negative);

    let summary = store.usage_summary();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.used, 1);
    assert_eq!(summary.available, 4);

    Ok(())
}

#[test]
fn test_usage_survives_reopen() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fields = organization_fields();
    let mut generator = ValueGenerator::with_seed(99);
    let dataset = DatasetBuilder::new(&mut generator).build_rows(&fields, 4, 0);

    {
        let mut store = store_in(&temp_dir);
        store.replace_rows(dataset.labels, dataset.rows)?;
        store.mark_row_used(0)?;
        store.mark_row_used(2)?;
    }

    let mut reopened = store_in(&temp_dir);
    assert!(reopened.load()?);
    assert!(reopened.rows()[0].used);
    assert!(!reopened.rows()[1].used);
    assert!(reopened.rows()[2].used);
    assert!(reopened.ledger().is_used(2));

    let next = reopened
        .get_next_available_row(ScenarioFilter::Any)?
        .expect("row 1 is free");
    assert_eq!(next.index, 1);

    Ok(())
}

#[test]
fn test_append_columns_keeps_order_and_usage() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fields = organization_fields();
    let mut generator = ValueGenerator::with_seed(7);
    let dataset = DatasetBuilder::new(&mut generator).build_rows(&fields, 2, 2);
    let original_orgs: Vec<String> = dataset
        .rows
        .iter()
        .map(|r| r.get("Organization Name").unwrap_or_default().to_string())
        .collect();

    let mut store = store_in(&temp_dir);
    store.replace_rows(dataset.labels, dataset.rows)?;
    store.mark_row_used(1)?;
    store.mark_row_used(3)?;

    let extra = vec![
        FieldSchema::new("fax", "Fax Number", FieldType::Text).with_pattern(r"\d{3}-\d{4}"),
    ];
    let scenarios: Vec<ScenarioType> = store.rows().iter().map(|r| r.scenario).collect();
    let values = DatasetBuilder::new(&mut generator).column_values(&extra, &scenarios);
    store.append_columns(&column_labels(&extra), &values)?;

    let mut reopened = store_in(&temp_dir);
    reopened.load()?;
    assert_eq!(reopened.labels().last().map(String::as_str), Some("Fax Number"));

    let reopened_orgs: Vec<String> = reopened
        .rows()
        .iter()
        .map(|r| r.get("Organization Name").unwrap_or_default().to_string())
        .collect();
    assert_eq!(reopened_orgs, original_orgs);

    let used: Vec<bool> = reopened.rows().iter().map(|r| r.used).collect();
    assert_eq!(used, vec![false, true, false, true]);
    assert_eq!(reopened.usage_summary().used, 2);

    Ok(())
}

#[test]
fn test_exhausted_dataset_resets_once() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let fields = organization_fields();
    let mut generator = ValueGenerator::with_seed(5);
    let dataset = DatasetBuilder::new(&mut generator).build_rows(&fields, 2, 0);

    let mut store = store_in(&temp_dir);
    store.replace_rows(dataset.labels, dataset.rows)?;
    store.mark_row_used(0)?;
    store.mark_row_used(1)?;

    assert!(store
        .get_next_available_row(ScenarioFilter::Negative)?
        .is_none());
    assert_eq!(store.usage_summary().available, 0);

    let selection = store
        .get_next_available_row(ScenarioFilter::Any)?
        .expect("usage reset");
    assert_eq!(selection.index, 0);
    assert_eq!(store.usage_summary().used, 0);

    Ok(())
}
