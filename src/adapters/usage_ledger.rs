use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::adapters::row_file::write_atomic;
use crate::error::{DatasetError, DatasetResult};

const LEDGER_VERSION: u32 = 1;

fn ledger_version() -> u32 {
    LEDGER_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

/// Which rows have been consumed in the current run, keyed by row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLedger {
    #[serde(default = "ledger_version")]
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<usize, LedgerEntry>,
    #[serde(default)]
    pub last_used_index: Option<usize>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            entries: BTreeMap::new(),
            last_used_index: None,
            updated_at: None,
        }
    }
}

impl UsageLedger {
    /// Read the ledger; a missing file is an empty ledger.
    pub fn load(path: &Path) -> DatasetResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> DatasetResult<()> {
        let content = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &content)
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.entries.get(&index).map_or(false, |e| e.used)
    }

    pub fn mark_used(&mut self, index: usize, at: DateTime<Utc>) {
        self.entries.insert(
            index,
            LedgerEntry {
                used: true,
                used_at: Some(at),
            },
        );
        self.last_used_index = Some(index);
        self.updated_at = Some(at);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_used_index = None;
        self.updated_at = Some(Utc::now());
    }

    /// Drop entries that point past the end of a dataset of `len` rows.
    pub fn truncate(&mut self, len: usize) -> usize {
        let stale = self.entries.split_off(&len);
        if self.last_used_index.map_or(false, |i| i >= len) {
            self.last_used_index = None;
        }
        stale.len()
    }

    pub fn used_count(&self) -> usize {
        self.entries.values().filter(|e| e.used).count()
    }
}
