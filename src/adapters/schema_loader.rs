//! Reads upstream [`SchemaDocument`]s from JSON or YAML files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::domain::SchemaDocument;
use crate::error::{SchemaError, SchemaResult};

pub struct SchemaLoader;

impl SchemaLoader {
    /// Parse one document. The format follows the file extension.
    pub fn load_file(path: impl AsRef<Path>) -> SchemaResult<SchemaDocument> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let document: SchemaDocument = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content).map_err(|source| SchemaError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|source| SchemaError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => return Err(SchemaError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(path = ?path, pages = document.pages.len(), "Loaded schema document");
        Self::normalize(document)
    }

    /// Load every `.json`, `.yaml` and `.yml` file in `dir`, in file name
    /// order, and concatenate their pages.
    pub fn load_dir(dir: impl AsRef<Path>) -> SchemaResult<SchemaDocument> {
        let pattern = format!("{}/*", dir.as_ref().display());
        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => {
                    let supported = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(|e| matches!(e.to_lowercase().as_str(), "json" | "yaml" | "yml"))
                        .unwrap_or(false);
                    if supported && path.is_file() {
                        paths.push(path);
                    }
                }
                Err(e) => warn!("Skipping unreadable schema path: {}", e),
            }
        }
        paths.sort();

        let mut merged = SchemaDocument::default();
        for path in paths {
            merged.pages.extend(Self::load_file(&path)?.pages);
        }
        Self::normalize(merged)
    }

    fn normalize(mut document: SchemaDocument) -> SchemaResult<SchemaDocument> {
        let mut keys = HashSet::new();
        for page in &mut document.pages {
            for field in &mut page.fields {
                if !keys.insert(field.key.clone()) {
                    return Err(SchemaError::DuplicateKey(field.key.clone()));
                }
                *field = field.normalized();
            }
        }
        Ok(document)
    }
}
