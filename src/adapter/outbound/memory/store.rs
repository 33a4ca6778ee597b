//! In-memory record store.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{BackendError, Result};
use crate::port::outbound::backend::{Filter, OrderBy, Record, RecordStore};

/// Tables of JSON rows kept in memory.
///
/// Inserted rows get an `id` (UUID v4) and a `created_at` timestamp unless
/// the caller supplied them. Updates stamp `updated_at`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table.
    #[must_use]
    pub fn count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }
}

fn check_table(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        return Err(BackendError::Storage("table name cannot be empty".into()).into());
    }
    Ok(())
}

fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Record>> {
        check_table(table)?;
        let tables = self.tables.read();
        let mut rows: Vec<Record> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut record: Record) -> Result<Record> {
        check_table(table)?;
        record
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        record
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Record) -> Result<usize> {
        check_table(table)?;
        let now = Value::String(Utc::now().to_rfc3339());
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };

        let mut touched = 0;
        for row in rows.iter_mut().filter(|row| matches_all(row, filters)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            row.insert("updated_at".into(), now.clone());
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize> {
        check_table(table)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches_all(row, filters));
        Ok(before - rows.len())
    }
}
