//! Durable dataset of generated rows with at-most-once consumption per run.
//!
//! Two records are persisted: the row file (values plus a `Used` column) and
//! the usage ledger. In memory the ledger is the source of truth and each
//! row's `used` flag is rewritten from it on every mutation. On load the two
//! records are unioned, so a row marked used in either one stays used, and
//! any disagreement is written back.
//!
//! The store assumes a single writer process.

use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::adapters::row_file::{self, is_reserved_column};
use crate::adapters::usage_ledger::UsageLedger;
use crate::config::DatasetSettings;
use crate::domain::{DataRow, ScenarioFilter};
use crate::error::{DatasetError, DatasetResult};

/// A row handed out by [`DatasetStore::get_next_available_row`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowSelection {
    pub index: usize,
    pub row: DataRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageSummary {
    pub total: usize,
    pub used: usize,
    pub available: usize,
}

/// State captured before a mutation.
struct Snapshot {
    labels: Vec<String>,
    rows: Vec<DataRow>,
    ledger: UsageLedger,
}

pub struct DatasetStore {
    row_file: PathBuf,
    ledger_file: PathBuf,
    labels: Vec<String>,
    rows: Vec<DataRow>,
    ledger: UsageLedger,
}

impl DatasetStore {
    /// Create a store without touching the filesystem.
    pub fn new(row_file: impl Into<PathBuf>, ledger_file: impl Into<PathBuf>) -> Self {
        Self {
            row_file: row_file.into(),
            ledger_file: ledger_file.into(),
            labels: Vec::new(),
            rows: Vec::new(),
            ledger: UsageLedger::default(),
        }
    }

    pub fn from_settings(settings: &DatasetSettings) -> Self {
        Self::new(&settings.row_file, &settings.ledger_file)
    }

    /// Create a store and load it when the row file exists.
    pub fn open(settings: &DatasetSettings) -> DatasetResult<Self> {
        let mut store = Self::from_settings(settings);
        store.load()?;
        Ok(store)
    }

    pub fn row_file(&self) -> &Path {
        &self.row_file
    }

    pub fn ledger_file(&self) -> &Path {
        &self.ledger_file
    }

    pub fn data_exists(&self) -> bool {
        self.row_file.is_file()
    }

    /// Load both records. Returns `Ok(false)` when there is no row file, in
    /// which case the store is left empty.
    pub fn load(&mut self) -> DatasetResult<bool> {
        if !self.data_exists() {
            debug!(path = ?self.row_file, "No dataset file");
            self.labels.clear();
            self.rows.clear();
            self.ledger = UsageLedger::default();
            return Ok(false);
        }

        let table = row_file::read_rows(&self.row_file)?;
        let mut ledger = UsageLedger::load(&self.ledger_file)?;
        let stale = ledger.truncate(table.rows.len());

        self.labels = table.labels;
        self.rows = table.rows;

        let now = Utc::now();
        let mut drift = stale;
        for (index, row) in self.rows.iter_mut().enumerate() {
            let in_ledger = ledger.is_used(index);
            if row.used && !in_ledger {
                ledger.mark_used(index, now);
                drift += 1;
            } else if in_ledger && !row.used {
                row.used = true;
                drift += 1;
            }
        }
        self.ledger = ledger;

        if drift > 0 {
            warn!(
                rows = drift,
                "Row file and usage ledger disagreed; rewriting both"
            );
            self.persist()?;
        }

        info!(
            path = ?self.row_file,
            rows = self.rows.len(),
            used = self.ledger.used_count(),
            "Loaded dataset"
        );
        Ok(true)
    }

    /// First unused row, in file order, whose scenario passes `filter`.
    ///
    /// When every row is used and `filter` is [`ScenarioFilter::Any`], usage
    /// is reset once and the scan restarts. A filtered scan that finds
    /// nothing returns `None` without resetting.
    pub fn get_next_available_row(
        &mut self,
        filter: ScenarioFilter,
    ) -> DatasetResult<Option<RowSelection>> {
        if let Some(selection) = self.scan(filter) {
            return Ok(Some(selection));
        }

        if filter == ScenarioFilter::Any {
            if self.rows.is_empty() {
                return Ok(None);
            }
            info!("All rows used, resetting usage");
            self.reset_usage()?;
            return Ok(self.scan(filter));
        }

        warn!(filter = ?filter, "No available rows for filter");
        Ok(None)
    }

    fn scan(&self, filter: ScenarioFilter) -> Option<RowSelection> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.is_row_used(*index))
            .find(|(_, row)| filter.accepts(row.scenario))
            .map(|(index, row)| RowSelection {
                index,
                row: row.clone(),
            })
    }

    fn is_row_used(&self, index: usize) -> bool {
        self.ledger.is_used(index) || self.rows.get(index).map_or(false, |r| r.used)
    }

    /// Mark a row as consumed. Marking an already used row is a no-op.
    pub fn mark_row_used(&mut self, index: usize) -> DatasetResult<()> {
        if index >= self.rows.len() {
            return Err(DatasetError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }

        if self.ledger.is_used(index) && self.rows[index].used {
            debug!(index, "Row already marked used");
            return Ok(());
        }

        let snapshot = self.snapshot();
        self.ledger.mark_used(index, Utc::now());
        self.sync_flags();
        self.commit(snapshot)?;
        debug!(index, "Marked row used");
        Ok(())
    }

    /// Clear the ledger and every row flag.
    pub fn reset_usage(&mut self) -> DatasetResult<()> {
        let snapshot = self.snapshot();
        self.ledger.clear();
        self.sync_flags();
        self.commit(snapshot)?;
        info!(rows = self.rows.len(), "Reset dataset usage");
        Ok(())
    }

    /// Extend every row with new columns. `values_per_row[i]` holds the
    /// values of row `i` in `new_labels` order. Row order and usage are kept.
    pub fn append_columns(
        &mut self,
        new_labels: &[String],
        values_per_row: &[Vec<String>],
    ) -> DatasetResult<()> {
        let mut seen: HashSet<&str> = self.labels.iter().map(String::as_str).collect();
        for label in new_labels {
            if is_reserved_column(label) || !seen.insert(label.as_str()) {
                return Err(DatasetError::DuplicateColumn(label.clone()));
            }
        }

        if values_per_row.len() != self.rows.len() {
            return Err(DatasetError::ShapeMismatch(format!(
                "{} value rows for {} dataset rows",
                values_per_row.len(),
                self.rows.len()
            )));
        }
        if let Some((index, values)) = values_per_row
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != new_labels.len())
        {
            return Err(DatasetError::ShapeMismatch(format!(
                "row {} has {} values for {} new columns",
                index,
                values.len(),
                new_labels.len()
            )));
        }

        let snapshot = self.snapshot();
        for (row, values) in self.rows.iter_mut().zip(values_per_row) {
            for (label, value) in new_labels.iter().zip(values) {
                row.push(label.clone(), value.clone());
            }
        }
        self.labels.extend(new_labels.iter().cloned());

        if let Err(e) = row_file::write_rows(&self.row_file, &self.labels, &self.rows) {
            self.restore(snapshot);
            return Err(e);
        }
        info!(columns = new_labels.len(), "Appended dataset columns");
        Ok(())
    }

    /// Replace the whole dataset with freshly generated rows. Usage starts over.
    pub fn replace_rows(&mut self, labels: Vec<String>, rows: Vec<DataRow>) -> DatasetResult<()> {
        if let Some(label) = labels.iter().find(|l| is_reserved_column(l)) {
            return Err(DatasetError::DuplicateColumn(label.clone()));
        }
        let distinct: HashSet<&str> = labels.iter().map(String::as_str).collect();
        if distinct.len() != labels.len() {
            return Err(DatasetError::ShapeMismatch(
                "column labels must be unique".to_string(),
            ));
        }

        let snapshot = self.snapshot();
        self.labels = labels;
        self.rows = rows;
        self.ledger = UsageLedger::default();
        self.sync_flags();
        self.commit(snapshot)?;
        info!(rows = self.rows.len(), "Replaced dataset");
        Ok(())
    }

    pub fn usage_summary(&self) -> UsageSummary {
        let total = self.rows.len();
        let used = (0..total).filter(|i| self.is_row_used(*i)).count();
        UsageSummary {
            total,
            used,
            available: total - used,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn sync_flags(&mut self) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.used = self.ledger.is_used(index);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            labels: self.labels.clone(),
            rows: self.rows.clone(),
            ledger: self.ledger.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.labels = snapshot.labels;
        self.rows = snapshot.rows;
        self.ledger = snapshot.ledger;
    }

    /// Persist, or roll the in-memory state back to `snapshot` if writing fails.
    fn commit(&mut self, snapshot: Snapshot) -> DatasetResult<()> {
        if let Err(e) = self.persist() {
            warn!(error = %e, "Persisting dataset failed, keeping previous state");
            self.restore(snapshot);
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> DatasetResult<()> {
        self.ledger.save(&self.ledger_file)?;
        row_file::write_rows(&self.row_file, &self.labels, &self.rows)
    }
}
