//! In-memory entry store for tests and local runs without MySQL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::entries::EntryStore;
use crate::db::pool::DbError;
use crate::models::{EntryBody, FoodWasteEntry};

/// In-memory [`EntryStore`] that can be switched into a failing state
#[derive(Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: Vec<FoodWasteEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current rows, in insertion order.
    pub fn snapshot(&self) -> Vec<FoodWasteEntry> {
        self.table().rows.clone()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
            return Err(DbError::StoreUnavailable(sqlx::Error::Io(refused)));
        }
        Ok(())
    }
}

fn rejected(reason: String) -> DbError {
    DbError::StoreUnavailable(sqlx::Error::Protocol(reason))
}

/// Text column coercion: scalars become their text, objects/arrays their JSON.
fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric column coercion in strict mode: numeric strings convert, anything else is refused.
fn to_number(value: &Value) -> Result<Option<f64>, DbError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| rejected(format!("Incorrect decimal value: '{}' for column 'weight'", s))),
        other => Err(rejected(format!(
            "Incorrect decimal value: '{}' for column 'weight'",
            other
        ))),
    }
}

/// Convert a body into a row the way the store would, before touching the table.
fn to_row(id: i64, entry: &EntryBody) -> Result<FoodWasteEntry, DbError> {
    let [category, weight, waste_reason] = entry.values()?;
    Ok(FoodWasteEntry {
        id,
        category: to_text(category),
        weight: to_number(weight)?,
        waste_reason: to_text(waste_reason),
    })
}

/// Ids that do not parse match nothing, like a failed numeric comparison.
fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn list(&self) -> Result<Vec<FoodWasteEntry>, DbError> {
        self.check_available()?;
        Ok(self.snapshot())
    }

    async fn create(&self, entry: &EntryBody) -> Result<u64, DbError> {
        self.check_available()?;
        let mut table = self.table();
        let row = to_row(table.last_id + 1, entry)?;
        table.last_id = row.id;
        table.rows.push(row);
        Ok(table.last_id as u64)
    }

    async fn delete(&self, id: &str) -> Result<u64, DbError> {
        self.check_available()?;
        let Some(id) = parse_id(id) else {
            return Ok(0);
        };
        let mut table = self.table();
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);
        Ok((before - table.rows.len()) as u64)
    }

    async fn update(&self, id: &str, entry: &EntryBody) -> Result<u64, DbError> {
        self.check_available()?;
        // Binding fails before the WHERE clause is ever evaluated
        let replacement = to_row(0, entry)?;
        let Some(id) = parse_id(id) else {
            return Ok(0);
        };
        let mut table = self.table();
        let mut matched = 0;
        for row in table.rows.iter_mut().filter(|row| row.id == id) {
            *row = FoodWasteEntry {
                id,
                ..replacement.clone()
            };
            matched += 1;
        }
        Ok(matched)
    }
}
