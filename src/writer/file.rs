// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bytes::BufMut;
use itertools::Itertools;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{WriterError, WriterResult};
use crate::options::WriterOptions;
use crate::sanitize::sanitize_field;
use crate::storage::{PartitionRows, ValueTable};

/// Hex SHA-256 of the header line as written to the file, used to name the file
/// holding that schema. Names must already be sanitized for `delimiter`, so distinct
/// headers never join to the same line.
pub fn schema_fingerprint(header: &[String], delimiter: char) -> String {
    let mut hasher = Sha256::new();
    hasher.update(header_line(header, delimiter).as_bytes());
    format!("{:x}", hasher.finalize())
}

fn header_line(header: &[String], delimiter: char) -> String {
    header.join(delimiter.to_string().as_str())
}

pub fn path_of_data_file(base: impl AsRef<Path>, fingerprint: &str, extension: &str) -> PathBuf {
    base.as_ref().join(format!("{}.{}", fingerprint, extension))
}

/// Result of appending one partition to its data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWriteOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub created: bool,
}

/// Appends the rows of one partition to the data file matching their schema.
pub struct PartitionFileWriter<'a> {
    /// Directory of the partition.
    directory: PathBuf,

    options: &'a WriterOptions,
}

impl<'a> PartitionFileWriter<'a> {
    pub fn new(directory: impl AsRef<Path>, options: &'a WriterOptions) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn create_dir(&self) -> WriterResult<()> {
        std::fs::create_dir_all(&self.directory)
            .map_err(|err| WriterError::io(&self.directory, err))
    }

    /// Open `path` for appending, creating it if absent. Returns whether it was created.
    fn open_append(path: &Path) -> WriterResult<(File, bool)> {
        match OpenOptions::new().append(true).create_new(true).open(path) {
            Ok(file) => Ok((file, true)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => OpenOptions::new()
                .append(true)
                .open(path)
                .map(|file| (file, false))
                .map_err(|err| WriterError::io(path, err)),
            Err(err) => Err(WriterError::io(path, err)),
        }
    }

    /// Write `rows` under `columns`. The header line is only written when the file is new.
    pub fn write(
        self,
        columns: &[String],
        rows: PartitionRows,
        values: &ValueTable,
    ) -> WriterResult<FileWriteOutcome> {
        let delimiter = self.options.delimiter;
        let header = columns
            .iter()
            .map(|name| sanitize_field(name, delimiter).into_owned())
            .collect_vec();
        let fingerprint = schema_fingerprint(&header, delimiter);
        let path = path_of_data_file(&self.directory, &fingerprint, &self.options.file_extension);

        self.create_dir()?;
        let (file, created) = Self::open_append(&path)?;
        let mut writer = BufWriter::new(file);
        let io_err = |err| WriterError::io(&path, err);

        let delim = delimiter.to_string();
        let mut line: Vec<u8> = Vec::new();

        if created {
            line.put_slice(header_line(&header, delimiter).as_bytes());
            line.put_u8(b'\n');
            writer.write_all(&line).map_err(io_err)?;
        }

        let mut row_cnt = 0;
        for row in rows {
            let row = row?;
            line.clear();
            for (idx, value) in row.into_iter().enumerate() {
                if idx > 0 {
                    line.put_slice(delim.as_bytes());
                }
                let value = values.get(value).ok_or_else(|| {
                    WriterError::internal(format!("value index {value} is not interned"))
                })?;
                line.put_slice(value.as_bytes());
            }
            line.put_u8(b'\n');
            writer.write_all(&line).map_err(io_err)?;
            row_cnt += 1;
        }

        writer.flush().map_err(io_err)?;
        let file = writer
            .into_inner()
            .map_err(|err| WriterError::io(&path, err.into_error()))?;
        if self.options.sync_data {
            file.sync_data().map_err(io_err)?;
        }

        debug!(path = %path.display(), rows = row_cnt, created, "appended partition");
        Ok(FileWriteOutcome {
            path,
            rows: row_cnt,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::storage::{PartitionStore, ValueInterner};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_fingerprint_is_fixed_width_hex() {
        let a = schema_fingerprint(&names(&["TIMESTAMP", "MODEL"]), ',');
        let b = schema_fingerprint(&names(&["TIMESTAMP", "MODEL", "VALUE"]), ',');
        assert_eq!(a.len(), 64);
        assert_eq!(b.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(a, schema_fingerprint(&names(&["TIMESTAMP", "MODEL"]), ','));
    }

    #[test]
    fn test_fingerprint_follows_delimiter() {
        let joined = names(&["K", "x,y"]);
        let split = names(&["K", "x", "y"]);
        assert_ne!(
            schema_fingerprint(&joined, '|'),
            schema_fingerprint(&split, '|')
        );
        assert_ne!(
            schema_fingerprint(&split, '|'),
            schema_fingerprint(&split, ',')
        );
    }

    #[test]
    fn test_write_then_append() {
        let tempdir = tempfile::tempdir().unwrap();
        let options = WriterOptions::default_for_test();
        let key_columns: Arc<[String]> = vec!["k".to_string()].into();

        let mut outcomes = vec![];
        for round in 0..2 {
            let mut interner = ValueInterner::new();
            let mut store = PartitionStore::new(key_columns.clone());
            let k = interner.intern(&format!("r{round}")).unwrap();
            let v = interner.intern("x,y").unwrap();
            store.add_row(&HashMap::from([("k", k), ("v", v)])).unwrap();

            let values = interner.snapshot(options.delimiter);
            let (columns, rows) = store.into_rows();
            let writer = PartitionFileWriter::new(tempdir.path().join("p=1"), &options);
            outcomes.push(writer.write(&columns, rows, &values).unwrap());
        }

        assert!(outcomes[0].created);
        assert!(!outcomes[1].created);
        assert_eq!(outcomes[0].path, outcomes[1].path);
        let content = std::fs::read_to_string(&outcomes[0].path).unwrap();
        assert_eq!(content, "k,v\nr0,x_y\nr1,x_y\n");
    }

    #[test]
    fn test_colliding_names_keep_rows_aligned() {
        let tempdir = tempfile::tempdir().unwrap();
        let options = WriterOptions::default_for_test();
        let mut interner = ValueInterner::new();
        let mut store = PartitionStore::new(vec!["k".to_string()].into());
        let k = interner.intern("k0").unwrap();
        let joined = interner.intern("1").unwrap();
        let plain = interner.intern("2").unwrap();
        store
            .add_row(&HashMap::from([("k", k), ("a,b", joined), ("a_b", plain)]))
            .unwrap();

        let values = interner.snapshot(options.delimiter);
        let (columns, rows) = store.into_rows();
        let outcome = PartitionFileWriter::new(tempdir.path(), &options)
            .write(&columns, rows, &values)
            .unwrap();
        let content = std::fs::read_to_string(&outcome.path).unwrap();
        assert_eq!(content, "k,a_b,a_b\nk0,1,2\n");
    }
}
