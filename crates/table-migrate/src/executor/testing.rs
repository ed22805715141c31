//! In-memory database used by executor and orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::{Connector, Row, SqlConnection, SqlValue};
use crate::error::{MigrateError, Result};

/// Shared state behind a [`FakeConnector`].
#[derive(Default)]
pub struct FakeDb {
    pub tables: HashMap<String, Vec<Row>>,
    /// Canned results for arbitrary queries, keyed by exact SQL.
    pub canned: HashMap<String, Vec<Row>>,
    /// Every statement seen, in order.
    pub log: Vec<String>,
    pub connects: usize,
    pub ends: usize,
    pub prepares: usize,
    /// Insert attempts per successfully prepared batch.
    pub batch_sizes: Vec<usize>,
    /// 1-based prepare calls that fail.
    pub failing_prepares: HashSet<usize>,
    /// Inserts whose first parameter equals one of these fail.
    pub failing_keys: HashSet<String>,
    /// Queries containing this text fail.
    pub failing_query: Option<String>,
    pub refuse_connect: bool,
}

impl FakeDb {
    pub fn with_table(mut self, name: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(name.to_string(), rows);
        self
    }

    pub fn inserts(&self) -> usize {
        self.log.iter().filter(|s| s.starts_with("INSERT")).count()
    }
}

#[derive(Clone)]
pub struct FakeConnector {
    pub db: Arc<Mutex<FakeDb>>,
}

impl FakeConnector {
    pub fn new(db: FakeDb) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn SqlConnection>> {
        let mut db = self.db.lock().unwrap();
        if db.refuse_connect {
            return Err(MigrateError::connection("connection refused", "fake"));
        }
        db.connects += 1;
        Ok(Box::new(FakeConnection {
            db: self.db.clone(),
        }))
    }

    fn describe(&self) -> String {
        "fake".to_string()
    }
}

pub struct FakeConnection {
    db: Arc<Mutex<FakeDb>>,
}

fn table_after<'a>(sql: &'a str, prefix: &str) -> Option<&'a str> {
    sql.strip_prefix(prefix).map(|rest| rest.split_whitespace().next().unwrap_or(""))
}

#[async_trait]
impl SqlConnection for FakeConnection {
    async fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>> {
        let mut db = self.db.lock().unwrap();
        db.log.push(sql.to_string());
        if db.failing_query.as_deref().is_some_and(|f| sql.contains(f)) {
            return Err(MigrateError::query(sql, "simulated query failure"));
        }
        if let Some(rows) = db.canned.get(sql) {
            return Ok(rows.clone());
        }
        if let Some(table) = table_after(sql, "SELECT COUNT(*) as count FROM ") {
            let count = db.tables.get(table).map_or(0, Vec::len) as i64;
            let row: Row = [("count".to_string(), SqlValue::Int(count))].into_iter().collect();
            return Ok(vec![row]);
        }
        if let Some(table) = table_after(sql, "SELECT * FROM ") {
            return db
                .tables
                .get(table)
                .cloned()
                .ok_or_else(|| MigrateError::query(sql, format!("Table '{}' doesn't exist", table)));
        }
        Err(MigrateError::query(sql, "unexpected query"))
    }

    async fn prepare(&mut self, _sql: &str) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        db.prepares += 1;
        if db.failing_prepares.contains(&db.prepares) {
            return Err(MigrateError::query("PREPARE", "simulated prepare failure"));
        }
        db.batch_sizes.push(0);
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let mut db = self.db.lock().unwrap();
        db.log.push(sql.to_string());
        if sql.starts_with("INSERT") {
            if let Some(size) = db.batch_sizes.last_mut() {
                *size += 1;
            }
        }
        let key = params.first().map(|v| v.to_string()).unwrap_or_default();
        if db.failing_keys.contains(&key) {
            return Err(MigrateError::query(
                sql,
                format!("Duplicate entry {} for key 'PRIMARY'", key),
            ));
        }
        if let Some(table) = table_after(sql, "INSERT INTO ") {
            let table = table.to_string();
            let row: Row = params
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("c{}", i), v.clone()))
                .collect();
            db.tables.entry(table).or_default().push(row);
        }
        Ok(1)
    }

    async fn end(&mut self) -> Result<()> {
        self.db.lock().unwrap().ends += 1;
        Ok(())
    }
}

/// `count` rows shaped `{id, name}` with ids `1..=count`.
pub fn numbered_rows(count: usize) -> Vec<Row> {
    (1..=count)
        .map(|i| {
            [
                ("id".to_string(), SqlValue::Int(i as i64)),
                ("name".to_string(), SqlValue::Text(format!("row {}", i))),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}
