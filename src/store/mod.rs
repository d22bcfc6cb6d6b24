//! Storage boundary.
//!
//! Persistent state is a set of named tables of strings, the shape a
//! spreadsheet or CSV backend offers. [`TableStore`] is the seam to such
//! a backend; [`MemoryStore`] keeps tables in process. The [`codec`]
//! module converts between tables and domain types.

pub mod codec;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Table names used by the engine.
pub mod tables {
    pub const STAFF: &str = "staff";
    pub const PUBLIC_HOLIDAYS: &str = "public_holidays";
    pub const LEAVE_REQUESTS: &str = "leave_requests";
    pub const CHANGE_REQUESTS: &str = "change_requests";
    pub const DRAFT_SCHEDULE: &str = "draft_schedule";
    pub const DRAFT_REQUIREMENTS: &str = "draft_requirements";
    pub const HISTORY: &str = "history";
    pub const SYSTEM_CONFIG: &str = "system_config";
}

/// Headers plus string rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row (builder form).
    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(row);
        self
    }

    /// Appends a row. Short rows read as empty cells.
    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell by row index and header. Missing cells read as `None`.
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.column(header)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Drops all rows, keeping headers.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// Keeps only rows matching the predicate.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[String]) -> bool) {
        self.rows.retain(|r| keep(r));
    }
}

/// A backend holding named tables.
pub trait TableStore {
    /// Loads a table. A table that was never saved loads as empty.
    fn load(&self, name: &str) -> Result<Table>;

    /// Replaces a table.
    fn save(&mut self, name: &str, table: Table) -> Result<()>;

    /// Drops a table's rows, keeping its headers.
    fn clear(&mut self, name: &str) -> Result<()> {
        let mut table = self.load(name)?;
        table.clear_rows();
        self.save(name, table)
    }
}

/// In-process table store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Table>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a table (builder form).
    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Names of all saved tables, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl TableStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Table> {
        Ok(self.tables.get(name).cloned().unwrap_or_default())
    }

    fn save(&mut self, name: &str, table: Table) -> Result<()> {
        self.tables.insert(name.to_string(), table);
        Ok(())
    }
}
