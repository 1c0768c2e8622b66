//! Row accumulation for streaming readers.
//!
//! Readers decode one observation at a time and push it here as a set of
//! `(column, value)` pairs. Columns are created on first sight and
//! back-filled with nulls, so the final frame is rectangular without an
//! intermediate document tree.

use std::collections::HashMap;

use polars::prelude::*;

/// Column-oriented buffer of optional string cells.
#[derive(Debug, Default)]
pub struct RowBuffer {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<Vec<Option<String>>>,
    rows: usize,
}

impl RowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure a column exists, returning its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.cells.push(vec![None; self.rows]);
        idx
    }

    /// Appends one row. Columns missing from `row` get a null cell; a
    /// repeated column keeps its last value.
    pub fn push_row<K, V>(&mut self, row: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in row {
            let idx = self.ensure_column(key.as_ref());
            let column = &mut self.cells[idx];
            if column.len() > self.rows {
                column.truncate(self.rows);
            }
            column.push(Some(value.into()));
        }
        self.rows += 1;
        for column in &mut self.cells {
            if column.len() < self.rows {
                column.push(None);
            }
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = *self.index.get(column)?;
        self.cells[idx].get(row)?.as_deref()
    }

    /// Overwrites a single cell, creating the column if needed.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        if row >= self.rows {
            return;
        }
        let idx = self.ensure_column(column);
        self.cells[idx][row] = Some(value.into());
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Builds an all-string frame in first-seen column order.
    pub fn finish(self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .into_iter()
            .zip(self.cells)
            .map(|(name, cells)| Column::new(name.into(), cells))
            .collect();
        DataFrame::new(columns)
    }
}
