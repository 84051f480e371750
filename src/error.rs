// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("column {0:?} is declared both as a partition column and a key column")]
    OverlappingColumns(String),
    #[error("column {0:?} is declared more than once")]
    DuplicateColumn(String),
    #[error("row is missing key column {0:?}")]
    MissingKeyColumn(String),
    #[error("row is missing partition column {0:?}")]
    MissingPartitionColumn(String),
    #[error("invalid writer option: {0}")]
    InvalidOption(String),
    #[error("internal invariant violated: {0}")]
    Internal(String),
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriterError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        WriterError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn internal(message: impl ToString) -> Self {
        WriterError::Internal(message.to_string())
    }

    pub fn invalid_option(message: impl ToString) -> Self {
        WriterError::InvalidOption(message.to_string())
    }

    /// Whether the error reflects a bug in the encoder rather than bad input or IO.
    pub fn is_internal(&self) -> bool {
        matches!(self, WriterError::Internal(_))
    }
}

pub type WriterResult<T> = std::result::Result<T, WriterError>;
