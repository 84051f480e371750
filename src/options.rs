// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use serde::{Deserialize, Serialize};

use crate::error::{WriterError, WriterResult};

/// Suffix appended to the table name to form the table directory.
pub const TABLE_DIR_SUFFIX: &str = ".table";

/// Options for `PartitionedCsvWriter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Field delimiter used for headers and rows
    pub delimiter: char,

    /// Extension of the fingerprinted data files, without the leading dot
    pub file_extension: String,

    /// Whether to `fsync` each data file once its partition is written
    pub sync_data: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            file_extension: "csv".to_string(),
            sync_data: true,
        }
    }
}

impl WriterOptions {
    pub fn default_for_test() -> Self {
        Self {
            sync_data: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> WriterResult<()> {
        if matches!(self.delimiter, '\n' | '\r') || self.delimiter.is_alphanumeric() {
            return Err(WriterError::invalid_option(format!(
                "delimiter {:?} is not allowed",
                self.delimiter
            )));
        }
        if self.file_extension.is_empty()
            || self
                .file_extension
                .chars()
                .any(|c| std::path::is_separator(c) || c == '.')
        {
            return Err(WriterError::invalid_option(format!(
                "file extension {:?} must be a single non-empty path token",
                self.file_extension
            )));
        }
        Ok(())
    }
}
