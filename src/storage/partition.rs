// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;

use super::column::{ColumnBuilder, ColumnDrain};
use super::interner::ValueIndex;
use crate::error::{WriterError, WriterResult};

/// Buffers the rows of one partition, one run-length encoded column per column name.
///
/// Every column always holds exactly `row_cnt` rows: a column missing from a row is
/// padded with the null value, and a column first seen mid-stream is backfilled.
pub struct PartitionStore {
    /// Columns every row must carry, in output order
    key_columns: Arc<[String]>,

    /// Column data builders
    columns: HashMap<String, ColumnBuilder>,

    /// Count of rows in this partition
    row_cnt: usize,
}

impl PartitionStore {
    pub fn new(key_columns: Arc<[String]>) -> Self {
        Self {
            key_columns,
            columns: HashMap::new(),
            row_cnt: 0,
        }
    }

    /// Append one row. Fails without touching any column if a key column is absent.
    pub fn add_row(&mut self, row: &HashMap<&str, ValueIndex>) -> WriterResult<()> {
        if let Some(missing) = self
            .key_columns
            .iter()
            .find(|key| !row.contains_key(key.as_str()))
        {
            return Err(WriterError::MissingKeyColumn(missing.clone()));
        }

        for (name, column) in &mut self.columns {
            match row.get(name.as_str()) {
                Some(value) => column.append(*value),
                None => column.append_null(),
            }
        }
        for (name, value) in row {
            if !self.columns.contains_key(*name) {
                let mut column = ColumnBuilder::new_backfilled(self.row_cnt);
                column.append(*value);
                self.columns.insert(name.to_string(), column);
            }
        }
        self.row_cnt += 1;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.row_cnt
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Total number of run-length segments held by all columns.
    pub fn segment_count(&self) -> usize {
        self.columns.values().map(ColumnBuilder::segment_count).sum()
    }

    /// Key columns in declaration order, then every other column sorted by name.
    pub fn column_order(&self) -> Vec<String> {
        let rest = self
            .columns
            .keys()
            .filter(|name| !self.key_columns.contains(name))
            .sorted();
        self.key_columns.iter().chain(rest).cloned().collect()
    }

    /// Consume the partition, returning the column order and its rows in arrival order.
    pub fn into_rows(mut self) -> (Vec<String>, PartitionRows) {
        let order = self.column_order();
        let columns = order
            .iter()
            .map(|name| {
                self.columns
                    .remove(name)
                    .unwrap_or_else(|| ColumnBuilder::new_backfilled(self.row_cnt))
                    .into_drain()
            })
            .collect_vec();
        let rows = PartitionRows {
            columns,
            remaining: self.row_cnt,
            finished: false,
        };
        (order, rows)
    }
}

/// Rows decoded from a consumed [`PartitionStore`], each a value index per column.
///
/// Yields an internal error if the columns do not all hold exactly the declared
/// number of rows.
pub struct PartitionRows {
    columns: Vec<ColumnDrain>,
    remaining: usize,
    finished: bool,
}

impl PartitionRows {
    fn check_drained(&self) -> WriterResult<()> {
        let leftover: usize = self.columns.iter().map(ColumnDrain::remaining).sum();
        if leftover != 0 {
            return Err(WriterError::internal(format!(
                "{leftover} encoded values left after decoding all rows"
            )));
        }
        Ok(())
    }
}

impl Iterator for PartitionRows {
    type Item = WriterResult<Vec<ValueIndex>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.remaining == 0 {
            self.finished = true;
            return self.check_drained().err().map(Err);
        }
        self.remaining -= 1;
        let mut row = Vec::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter_mut().enumerate() {
            match column.next_value() {
                Some(value) => row.push(value),
                None => {
                    self.finished = true;
                    return Some(Err(WriterError::internal(format!(
                        "column #{idx} ended {} rows early",
                        self.remaining + 1
                    ))));
                }
            }
        }
        Some(Ok(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (self.remaining, Some(self.remaining + 1))
        }
    }
}
