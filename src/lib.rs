// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Buffers rows with varying columns in memory and flushes them as Hive-style
//! partitioned CSV files, one file per distinct header in each partition directory.

#![deny(unused_must_use)]

mod error;
mod options;
pub mod sanitize;
pub mod storage;
pub mod writer;

pub use self::error::{WriterError, WriterResult};
pub use self::options::{WriterOptions, TABLE_DIR_SUFFIX};
pub use self::writer::{FlushSummary, PartitionedCsvWriter};
