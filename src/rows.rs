//! Decoded result sets and rows.
//!
//! A [`ResultSet`] materializes one statement's wire result: column metadata
//! in wire order, typed rows, and the write counters. Every [`Row`] shares
//! one column layout through an `Arc`, so name lookup is built once at decode
//! time and values are stored exactly once.
//!
//! Duplicate column names are legal (e.g. `SELECT a.id, b.id FROM ...`);
//! name-based lookup resolves to the first occurrence in wire order.

use crate::error::Result;
use crate::proto::StmtResult;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column names and the name→position index shared by all rows of one result.
#[derive(Debug)]
pub(crate) struct ColumnLayout {
    names: Vec<String>,
    /// First occurrence wins for duplicate names.
    by_name: HashMap<String, usize>,
}

impl ColumnLayout {
    fn new(names: Vec<String>) -> Self {
        let mut by_name = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(i);
        }
        Self { names, by_name }
    }
}

/// One result row: a fixed-length ordered sequence of typed values,
/// addressable by zero-based position and by column name.
#[derive(Debug, Clone)]
pub struct Row {
    layout: Arc<ColumnLayout>,
    values: Vec<Value>,
}

impl Row {
    /// Value at the given zero-based position.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value for the named column; duplicate names resolve to the first
    /// occurrence in wire order.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.layout.by_name.get(name).and_then(|&i| self.values.get(i))
    }

    /// Column names in wire order.
    pub fn column_names(&self) -> &[String] {
        &self.layout.names
    }

    /// Number of values in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values in positional order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Fully materialized result of one statement (or a batch summary).
#[derive(Debug)]
pub struct ResultSet {
    /// Column names in wire order; not necessarily unique.
    pub columns: Vec<String>,

    /// Declared type label per column; empty when the server cannot declare
    /// one (e.g. a computed expression).
    pub column_types: Vec<String>,

    /// Result rows in wire order.
    pub rows: Vec<Row>,

    /// Rows affected; populated for write statements, aggregated for batches.
    pub rows_affected: u64,

    /// Rowid assigned by the last insert, when the statement was an insert.
    pub last_insert_rowid: Option<i64>,
}

impl ResultSet {
    /// Decode one statement result from the wire.
    pub(crate) fn decode(result: StmtResult) -> Result<Self> {
        let columns: Vec<String> = result.cols.iter().map(|c| c.name.clone()).collect();
        let column_types: Vec<String> =
            result.cols.iter().map(|c| c.decltype.clone().unwrap_or_default()).collect();

        let layout = Arc::new(ColumnLayout::new(columns.clone()));
        let mut rows = Vec::with_capacity(result.rows.len());
        for wire_row in result.rows {
            let mut values = Vec::with_capacity(wire_row.len());
            for wire_value in wire_row {
                values.push(Value::decode(wire_value)?);
            }
            rows.push(Row { layout: Arc::clone(&layout), values });
        }

        Ok(Self {
            columns,
            column_types,
            rows,
            rows_affected: result.affected_row_count,
            last_insert_rowid: decode_rowid(result.last_insert_rowid.as_deref())?,
        })
    }

    /// Build a batch summary: no rows, aggregated write counters.
    pub(crate) fn write_summary(rows_affected: u64, last_insert_rowid: Option<i64>) -> Self {
        Self {
            columns: Vec::new(),
            column_types: Vec::new(),
            rows: Vec::new(),
            rows_affected,
            last_insert_rowid,
        }
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}

pub(crate) fn decode_rowid(raw: Option<&str>) -> Result<Option<i64>> {
    match raw {
        None => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(|_| {
            crate::error::DatabaseError::Transport(format!(
                "malformed response: last_insert_rowid {s:?} does not fit in i64"
            ))
        }),
    }
}
