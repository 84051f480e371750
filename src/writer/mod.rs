// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Routes rows into partitions and flushes them as Hive-style partitioned CSV files.
//!
//! A table named `t` partitioned on `[a, b]` is laid out as
//! ```plain
//! <root>/t.table/a=<value>/b=<value>/<schema fingerprint>.csv
//! ```
//! with one file per distinct header observed in a partition directory.

mod file;

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use tracing::{info, warn};

pub use self::file::*;
use crate::error::{WriterError, WriterResult};
use crate::options::{WriterOptions, TABLE_DIR_SUFFIX};
use crate::sanitize::sanitize_path_token;
use crate::storage::{PartitionStore, ValueIndex, ValueInterner};

/// Directory name of a table: the sanitized name, suffixed with `.table` once.
pub fn table_dir_name(table_name: &str) -> String {
    let name = sanitize_path_token(table_name);
    if name.ends_with(TABLE_DIR_SUFFIX) {
        name.into_owned()
    } else {
        format!("{}{}", name, TABLE_DIR_SUFFIX)
    }
}

/// Relative directory of the partition `row` belongs to, one `name=value` level per
/// partition column.
pub fn partition_path<K, V>(
    partition_columns: &[String],
    row: &HashMap<K, V>,
) -> WriterResult<PathBuf>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
{
    let mut path = PathBuf::new();
    for column in partition_columns {
        let value = row
            .get(column.as_str())
            .ok_or_else(|| WriterError::MissingPartitionColumn(column.clone()))?;
        path.push(format!(
            "{}={}",
            sanitize_path_token(column),
            sanitize_path_token(value.as_ref())
        ));
    }
    Ok(path)
}

/// What a call to [`PartitionedCsvWriter::flush`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub partitions: usize,
    pub rows: usize,
    pub files_created: usize,
    pub files_appended: usize,
    pub paths: Vec<PathBuf>,
}

/// Buffers rows in memory and appends them to partitioned CSV files on [`flush`].
///
/// Memory grows with the number of distinct values and value changes seen since the
/// last flush, so callers are expected to flush periodically.
///
/// [`flush`]: PartitionedCsvWriter::flush
pub struct PartitionedCsvWriter {
    /// `<root>/<table>.table`
    table_path: PathBuf,

    partition_columns: Vec<String>,

    key_columns: Arc<[String]>,

    partitions: HashMap<PathBuf, PartitionStore>,

    interner: ValueInterner,

    options: WriterOptions,
}

impl PartitionedCsvWriter {
    pub fn new<P, K>(
        root: impl AsRef<Path>,
        table_name: &str,
        partition_columns: P,
        key_columns: K,
    ) -> WriterResult<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self::with_options(
            root,
            table_name,
            partition_columns,
            key_columns,
            WriterOptions::default(),
        )
    }

    pub fn with_options<P, K>(
        root: impl AsRef<Path>,
        table_name: &str,
        partition_columns: P,
        key_columns: K,
        options: WriterOptions,
    ) -> WriterResult<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        options.validate()?;
        let partition_columns = partition_columns.into_iter().map(Into::into).collect_vec();
        let key_columns = key_columns.into_iter().map(Into::into).collect_vec();

        let mut seen = HashSet::new();
        for column in partition_columns.iter().chain(&key_columns) {
            if !seen.insert(column.as_str()) {
                let overlapping =
                    partition_columns.contains(column) && key_columns.contains(column);
                return Err(if overlapping {
                    WriterError::OverlappingColumns(column.clone())
                } else {
                    WriterError::DuplicateColumn(column.clone())
                });
            }
        }

        let table_path = root.as_ref().join(table_dir_name(table_name));
        info!(
            table = %table_path.display(),
            ?partition_columns,
            ?key_columns,
            "created partitioned csv writer"
        );
        Ok(Self {
            table_path,
            partition_columns,
            key_columns: key_columns.into(),
            partitions: HashMap::new(),
            interner: ValueInterner::new(),
            options,
        })
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Buffer one row. Every key column and every partition column must be present;
    /// otherwise the row is rejected and nothing is buffered.
    pub fn add_row<K, V>(&mut self, row: &HashMap<K, V>) -> WriterResult<()>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<str>,
    {
        let partition = partition_path(&self.partition_columns, row)?;
        if let Some(missing) = self
            .key_columns
            .iter()
            .find(|key| !row.contains_key(key.as_str()))
        {
            return Err(WriterError::MissingKeyColumn(missing.clone()));
        }

        let mut values: HashMap<&str, ValueIndex> = HashMap::with_capacity(row.len());
        for (name, value) in row {
            let name: &str = name.borrow();
            if self.partition_columns.iter().any(|column| column == name) {
                continue;
            }
            values.insert(name, self.interner.intern(value.as_ref())?);
        }

        let key_columns = &self.key_columns;
        self.partitions
            .entry(partition)
            .or_insert_with(|| PartitionStore::new(key_columns.clone()))
            .add_row(&values)
    }

    /// Rows buffered since the last flush.
    pub fn buffered_rows(&self) -> usize {
        self.partitions.values().map(PartitionStore::row_count).sum()
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Distinct values interned since the last flush, including the empty value.
    pub fn distinct_values(&self) -> usize {
        self.interner.len()
    }

    /// Run-length segments held across all partitions and columns.
    pub fn buffered_segments(&self) -> usize {
        self.partitions
            .values()
            .map(PartitionStore::segment_count)
            .sum()
    }

    /// Append every buffered partition to its file and clear the buffer.
    ///
    /// Partitions are written one by one in partition path order. If one fails, the
    /// partitions already written stay on disk, the failing partition is dropped, and
    /// the remaining ones stay buffered for the next flush.
    pub fn flush(&mut self) -> WriterResult<FlushSummary> {
        let mut summary = FlushSummary::default();
        if self.partitions.is_empty() {
            warn!(table = %self.table_path.display(), "flush called with no buffered rows");
            return Ok(summary);
        }

        let values = self.interner.snapshot(self.options.delimiter);
        let keys = self.partitions.keys().cloned().sorted().collect_vec();
        for key in keys {
            let store = match self.partitions.remove(&key) {
                Some(store) => store,
                None => continue,
            };
            let (columns, rows) = store.into_rows();
            let outcome = PartitionFileWriter::new(self.table_path.join(&key), &self.options)
                .write(&columns, rows, &values)?;

            summary.partitions += 1;
            summary.rows += outcome.rows;
            if outcome.created {
                summary.files_created += 1;
            } else {
                summary.files_appended += 1;
            }
            summary.paths.push(outcome.path);
        }
        self.interner.reset();

        info!(
            table = %self.table_path.display(),
            partitions = summary.partitions,
            rows = summary.rows,
            files_created = summary.files_created,
            "flushed"
        );
        Ok(summary)
    }
}
