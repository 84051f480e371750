// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use super::interner::{ValueIndex, NULL_VALUE_INDEX};

/// One run of identical values in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSegment {
    pub value: ValueIndex,
    pub count: u32,
}

/// Run-length encodes the value indices of one column in row-arrival order.
///
/// Adjacent segments never share a value, except when a run reaches `u32::MAX`
/// and has to continue in a fresh segment.
#[derive(Debug, Default)]
pub struct ColumnBuilder {
    segments: Vec<ColumnSegment>,
    row_cnt: usize,
}

impl ColumnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a column that first appears after `rows` rows, backfilled with nulls.
    pub fn new_backfilled(rows: usize) -> Self {
        let mut builder = Self::new();
        builder.append_run(NULL_VALUE_INDEX, rows);
        builder
    }

    pub fn append(&mut self, value: ValueIndex) {
        self.append_run(value, 1);
    }

    pub fn append_null(&mut self) {
        self.append_run(NULL_VALUE_INDEX, 1);
    }

    fn append_run(&mut self, value: ValueIndex, mut count: usize) {
        self.row_cnt += count;
        if let Some(last) = self.segments.last_mut() {
            if last.value == value {
                let room = (u32::MAX - last.count) as usize;
                let merged = room.min(count);
                last.count += merged as u32;
                count -= merged;
            }
        }
        while count > 0 {
            let run = count.min(u32::MAX as usize);
            self.segments.push(ColumnSegment {
                value,
                count: run as u32,
            });
            count -= run;
        }
    }

    /// Number of rows encoded so far.
    pub fn len(&self) -> usize {
        self.row_cnt
    }

    pub fn is_empty(&self) -> bool {
        self.row_cnt == 0
    }

    pub fn segments(&self) -> &[ColumnSegment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn into_drain(self) -> ColumnDrain {
        ColumnDrain {
            segments: self.segments.into_iter(),
            head: None,
        }
    }
}

/// Decodes a column front to back, releasing each segment once it is used up.
pub struct ColumnDrain {
    segments: std::vec::IntoIter<ColumnSegment>,
    head: Option<ColumnSegment>,
}

impl ColumnDrain {
    pub fn next_value(&mut self) -> Option<ValueIndex> {
        loop {
            if let Some(head) = self.head.as_mut() {
                if head.count > 0 {
                    head.count -= 1;
                    return Some(head.value);
                }
            }
            self.head = Some(self.segments.next()?);
        }
    }

    /// Rows still encoded in this column.
    pub fn remaining(&self) -> usize {
        let head = self.head.map_or(0, |head| head.count as usize);
        head + self
            .segments
            .as_slice()
            .iter()
            .map(|segment| segment.count as usize)
            .sum::<usize>()
    }
}
