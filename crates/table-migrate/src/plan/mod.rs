//! Dependency-ordered execution planning.
//!
//! Tables are nodes keyed by source table name; `dependencies` are edges to
//! tables that must be migrated first. Both traversals use an explicit stack,
//! so a long dependency chain costs heap, not call-stack depth.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::{MigrateError, Result};
use crate::mapping::{MappingRegistry, TableMapping};

/// A problem found in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanIssue {
    /// A declared dependency has no mapping.
    MissingDependency { dependency: String, required_by: String },

    /// A dependency edge leads back to a table still being visited.
    CircularDependency { table: String },
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanIssue::MissingDependency {
                dependency,
                required_by,
            } => write!(
                f,
                "Missing dependency mapping for table: {} (required by {})",
                dependency, required_by
            ),
            PlanIssue::CircularDependency { table } => {
                write!(f, "Circular dependency detected involving table: {}", table)
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<PlanIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages, one per issue.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Convert into a `Result`, failing with every message on an invalid graph.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MigrateError::InvalidPlan(self.messages()))
        }
    }
}

/// The registry together with its computed execution order.
#[derive(Debug, Clone)]
pub struct MigrationPlan<'a> {
    registry: &'a MappingRegistry,
    execution_order: Vec<String>,
}

impl<'a> MigrationPlan<'a> {
    /// Validate the registry and compute the execution order.
    pub fn build(registry: &'a MappingRegistry) -> Result<Self> {
        validate(registry).into_result()?;
        Ok(Self {
            registry,
            execution_order: build_execution_order(registry),
        })
    }

    /// Source table names in the order they must be migrated.
    pub fn execution_order(&self) -> &[String] {
        &self.execution_order
    }

    /// Mappings in execution order.
    pub fn ordered_mappings(&self) -> Vec<&'a TableMapping> {
        self.execution_order
            .iter()
            .filter_map(|name| self.registry.lookup(name))
            .collect()
    }

    /// Mappings in execution order, optionally narrowed to a single table.
    pub fn select(&self, table: Option<&str>) -> Result<Vec<&'a TableMapping>> {
        match table {
            None => Ok(self.ordered_mappings()),
            Some(name) => self
                .registry
                .lookup(name)
                .map(|m| vec![m])
                .ok_or_else(|| MigrateError::UnknownTable {
                    table: name.to_string(),
                    available: self.registry.table_names(),
                }),
        }
    }
}

/// Linearize the registry so every table follows its dependencies.
///
/// Top-level traversal follows registration order, which makes the result
/// deterministic. A table is marked visited on entry, so each name appears
/// exactly once even if a cycle slipped past validation. Unknown dependency
/// names are skipped.
pub fn build_execution_order(registry: &MappingRegistry) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::with_capacity(registry.len());
    let mut order = Vec::with_capacity(registry.len());

    for root in registry.mappings() {
        if !visited.insert(root.source_table.as_str()) {
            continue;
        }

        // (mapping, index of the next dependency to look at)
        let mut stack: Vec<(&TableMapping, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let mapping = top.0;
            if let Some(dep) = mapping.dependencies.get(top.1) {
                top.1 += 1;
                if let Some(dep_mapping) = registry.lookup(dep) {
                    if visited.insert(dep_mapping.source_table.as_str()) {
                        stack.push((dep_mapping, 0));
                    }
                }
            } else {
                order.push(mapping.source_table.clone());
                stack.pop();
            }
        }
    }

    order
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current traversal path.
    Gray,
    /// Fully explored.
    Black,
}

struct Frame<'a> {
    mapping: &'a TableMapping,
    next: usize,
    found_cycle: bool,
}

/// Check the dependency graph for missing and circular dependencies.
///
/// Never fails; all issues are collected into the report. Every table is
/// explored once, so each missing edge and each cycle is reported once. When a
/// cycle is found the flag unwinds to the ancestors, but remaining sibling
/// dependencies are still explored so independent cycles are all reported.
pub fn validate(registry: &MappingRegistry) -> ValidationReport {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(registry.len());
    let mut errors = Vec::new();

    for root in registry.mappings() {
        if marks.contains_key(root.source_table.as_str()) {
            continue;
        }

        marks.insert(root.source_table.as_str(), Mark::Gray);
        let mut stack = vec![Frame {
            mapping: root,
            next: 0,
            found_cycle: false,
        }];

        while let Some(frame) = stack.last_mut() {
            let mapping = frame.mapping;
            let table = mapping.source_table.as_str();

            let Some(dep) = mapping.dependencies.get(frame.next) else {
                let found_cycle = frame.found_cycle;
                marks.insert(table, Mark::Black);
                stack.pop();
                if let Some(parent) = stack.last_mut() {
                    parent.found_cycle |= found_cycle;
                }
                continue;
            };
            frame.next += 1;

            let Some(dep_mapping) = registry.lookup(dep) else {
                errors.push(PlanIssue::MissingDependency {
                    dependency: dep.clone(),
                    required_by: table.to_string(),
                });
                continue;
            };

            match marks.get(dep_mapping.source_table.as_str()).copied() {
                Some(Mark::Gray) => {
                    errors.push(PlanIssue::CircularDependency { table: dep.clone() });
                    frame.found_cycle = true;
                }
                Some(Mark::Black) => {}
                None => {
                    marks.insert(dep_mapping.source_table.as_str(), Mark::Gray);
                    stack.push(Frame {
                        mapping: dep_mapping,
                        next: 0,
                        found_cycle: false,
                    });
                }
            }
        }
    }

    ValidationReport { errors }
}
