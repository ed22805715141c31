//! Declarative table and column mappings.
//!
//! A [`TableMapping`] says how rows of one source table become rows of one
//! destination table. Mappings are plain data: they are authored by hand in a
//! YAML file (or built in code), loaded once into a [`MappingRegistry`], and
//! never mutated afterwards.
//!
//! ```yaml
//! tables:
//!   - source_table: users
//!     destination_table: users
//!     dependencies: [user_type]
//!     columns:
//!       - { source: id, destination: id, required: true }
//!       - { source: email, destination: email, transform: trim }
//!       - { destination: status, default_value: active }
//! ```

mod registry;
mod transform;

pub use registry::MappingRegistry;
pub use transform::{Transform, TransformFn};

use serde::{Deserialize, Serialize};

use crate::core::SqlValue;

/// How one destination column is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Originating source column. `None` means the value always comes from
    /// `default_value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Destination column name.
    pub destination: String,

    /// Transform applied to the raw source value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,

    /// Value used when there is no source column or it is missing from the row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlValue>,

    /// The destination column must not end up NULL. Advisory unless
    /// `migration.enforce_required` is set.
    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnMapping {
    /// Copy `source` into a destination column of the same name.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::rename(name.clone(), name)
    }

    /// Copy `source` into a differently named destination column.
    pub fn rename(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            destination: destination.into(),
            transform: None,
            default_value: None,
            required: false,
            comment: None,
        }
    }

    /// A destination-only column filled from a constant.
    pub fn constant(destination: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            source: None,
            destination: destination.into(),
            transform: None,
            default_value: Some(value.into()),
            required: false,
            comment: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_default(mut self, value: impl Into<SqlValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Full migration rule for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    /// Source table; also the node key in the dependency graph.
    pub source_table: String,

    /// Destination table.
    pub destination_table: String,

    /// Column rules, in insert order.
    pub columns: Vec<ColumnMapping>,

    /// Source tables that must be migrated before this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Diagnostic query run against the destination after the copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_migration_validation: Option<String>,
}

impl TableMapping {
    pub fn new(
        source_table: impl Into<String>,
        destination_table: impl Into<String>,
        columns: Vec<ColumnMapping>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            destination_table: destination_table.into(),
            columns,
            dependencies: Vec::new(),
            post_migration_validation: None,
        }
    }

    pub fn depends_on<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validation(mut self, sql: impl Into<String>) -> Self {
        self.post_migration_validation = Some(sql.into());
        self
    }

    /// Destination column names, in the same order as the transformed values.
    pub fn destination_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.destination.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_mapping() {
        let yaml = r#"
source_table: assets
destination_table: assets
dependencies: [assets_category]
columns:
  - source: id
    destination: id
    required: true
    comment: Primary key
  - source: spesification
    destination: specification
    transform: falsy_to_null
  - destination: is_deleted
    default_value: 0
post_migration_validation: SELECT COUNT(*) AS total FROM assets
"#;
        let mapping: TableMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(mapping.source_table, "assets");
        assert_eq!(mapping.dependencies, vec!["assets_category"]);
        assert_eq!(
            mapping.destination_columns(),
            vec!["id", "specification", "is_deleted"]
        );
        assert!(mapping.columns[0].required);
        assert_eq!(
            mapping.columns[1].transform.map(|t| t.name()),
            Some("falsy_to_null")
        );
        assert_eq!(mapping.columns[2].source, None);
        assert_eq!(mapping.columns[2].default_value, Some(SqlValue::Int(0)));
        assert!(mapping.post_migration_validation.is_some());
    }

    #[test]
    fn test_dependencies_default_to_empty() {
        let yaml = "source_table: roles\ndestination_table: roles\ncolumns: []\n";
        let mapping: TableMapping = serde_yaml::from_str(yaml).unwrap();
        assert!(mapping.dependencies.is_empty());
        assert!(mapping.post_migration_validation.is_none());
    }

    #[test]
    fn test_builders() {
        let mapping = TableMapping::new(
            "user_role",
            "user_role",
            vec![
                ColumnMapping::same("user_id").required(),
                ColumnMapping::rename("role", "role_id"),
                ColumnMapping::constant("source_system", "legacy"),
            ],
        )
        .depends_on(["users", "roles"]);

        assert_eq!(mapping.dependencies, vec!["users", "roles"]);
        assert_eq!(
            mapping.destination_columns(),
            vec!["user_id", "role_id", "source_system"]
        );
        assert_eq!(
            mapping.columns[2].default_value,
            Some(SqlValue::from("legacy"))
        );
    }
}
