//! Registry of table mappings.
//!
//! A registry is built once from a mappings file (or in code) and passed by
//! reference; there is no global instance.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{MigrateError, Result};

use super::TableMapping;

/// On-disk layout of a mappings file.
#[derive(Debug, Deserialize)]
struct MappingsFile {
    tables: Vec<TableMapping>,
}

/// Ordered, immutable collection of table mappings.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    /// Mappings in registration order.
    mappings: Vec<TableMapping>,

    /// Source table name -> index into `mappings`.
    index: HashMap<String, usize>,
}

impl MappingRegistry {
    /// Build a registry, checking the mapping invariants:
    /// non-empty table names, unique source tables, and unique, non-empty
    /// destination columns within each table.
    pub fn new(mappings: Vec<TableMapping>) -> Result<Self> {
        let mut index = HashMap::with_capacity(mappings.len());

        for (i, mapping) in mappings.iter().enumerate() {
            if mapping.source_table.trim().is_empty() {
                return Err(MigrateError::Mapping(format!(
                    "mapping #{} has an empty source_table",
                    i + 1
                )));
            }
            if mapping.destination_table.trim().is_empty() {
                return Err(MigrateError::Mapping(format!(
                    "mapping for {} has an empty destination_table",
                    mapping.source_table
                )));
            }
            if index.insert(mapping.source_table.clone(), i).is_some() {
                return Err(MigrateError::Mapping(format!(
                    "duplicate mapping for source table {}",
                    mapping.source_table
                )));
            }

            let mut seen = HashSet::with_capacity(mapping.columns.len());
            for column in &mapping.columns {
                if column.destination.trim().is_empty() {
                    return Err(MigrateError::Mapping(format!(
                        "mapping for {} has a column with an empty destination",
                        mapping.source_table
                    )));
                }
                if !seen.insert(column.destination.as_str()) {
                    return Err(MigrateError::Mapping(format!(
                        "duplicate destination column {} in mapping for {}",
                        column.destination, mapping.source_table
                    )));
                }
            }
        }

        debug!("Registered {} table mappings", mappings.len());
        Ok(Self { mappings, index })
    }

    /// Load mappings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse mappings from a YAML string with a top-level `tables:` list.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: MappingsFile = serde_yaml::from_str(yaml)?;
        Self::new(file.tables)
    }

    /// Find the mapping for a source table.
    pub fn lookup(&self, source_table: &str) -> Option<&TableMapping> {
        self.index.get(source_table).map(|&i| &self.mappings[i])
    }

    /// All mappings in registration order.
    pub fn mappings(&self) -> &[TableMapping] {
        &self.mappings
    }

    /// Source table names in registration order.
    pub fn table_names(&self) -> Vec<String> {
        self.mappings
            .iter()
            .map(|m| m.source_table.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
