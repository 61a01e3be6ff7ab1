//! Surrogate key source
//!
//! A single generator is owned by the exporter and shared by every table,
//! so keys are unique across the whole archive and not only within a table.

/// Monotonic surrogate key generator; the first key is 1
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> i64 {
        self.last += 1;
        self.last
    }

    /// Most recently issued key, 0 before the first call
    pub fn last(&self) -> i64 {
        self.last
    }
}
