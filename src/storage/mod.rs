// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! In-memory buffering of partitions.
//!
//! Cell values are interned into dense [`ValueIndex`]es, and every column of a
//! [`PartitionStore`] keeps a run-length encoded sequence of those indices, so memory
//! grows with the number of value changes rather than the number of rows.

mod column;
mod interner;
mod partition;

pub use self::column::*;
pub use self::interner::*;
pub use self::partition::*;
