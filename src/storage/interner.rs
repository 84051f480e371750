// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{WriterError, WriterResult};
use crate::sanitize::sanitize_field;

/// Dense index of a distinct cell value.
pub type ValueIndex = u32;

/// Index reserved for the empty value, stable for the writer's lifetime.
pub const NULL_VALUE_INDEX: ValueIndex = 0;

/// Assigns dense indices to distinct cell values. Indices are only valid until the next
/// [`ValueInterner::reset`].
pub struct ValueInterner {
    dict_map: HashMap<String, ValueIndex>,
    cur_index: ValueIndex,
}

impl Default for ValueInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueInterner {
    pub fn new() -> Self {
        let mut dict_map = HashMap::new();
        dict_map.insert(String::new(), NULL_VALUE_INDEX);
        Self {
            dict_map,
            cur_index: NULL_VALUE_INDEX,
        }
    }

    /// Fails once the index space is exhausted; flush before that happens.
    pub fn intern(&mut self, value: &str) -> WriterResult<ValueIndex> {
        if let Some(index) = self.dict_map.get(value) {
            return Ok(*index);
        }
        self.cur_index = self.cur_index.checked_add(1).ok_or_else(|| {
            WriterError::internal("distinct value index space exhausted before flush")
        })?;
        trace!(index = self.cur_index, value, "interned new value");
        self.dict_map.insert(value.to_owned(), self.cur_index);
        Ok(self.cur_index)
    }

    /// Number of distinct values, including the empty value.
    pub fn len(&self) -> usize {
        self.dict_map.len()
    }

    /// Always false: the empty value is never removed.
    pub fn is_empty(&self) -> bool {
        self.dict_map.is_empty()
    }

    /// Build the reverse mapping used to render rows, sanitizing every value for `delimiter`.
    pub fn snapshot(&self, delimiter: char) -> ValueTable {
        let mut values = vec![String::new(); self.cur_index as usize + 1];
        for (value, index) in &self.dict_map {
            values[*index as usize] = sanitize_field(value, delimiter).into_owned();
        }
        ValueTable { values }
    }

    /// Forget every value except the empty one; indices restart at 1.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Index-to-value lookup produced by [`ValueInterner::snapshot`].
#[derive(Debug, Clone)]
pub struct ValueTable {
    values: Vec<String>,
}

impl ValueTable {
    pub fn get(&self, index: ValueIndex) -> Option<&str> {
        self.values.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
