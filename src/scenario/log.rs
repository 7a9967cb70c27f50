//! Capped scenario log
//!
//! Append-only window over the most recent `capacity` lines. Older lines are
//! evicted first; the order of survivors is never changed.

use std::collections::VecDeque;

/// Sliding-window log buffer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    total: u64,
}

impl LogBuffer {
    /// Creates an empty buffer holding at most `capacity` lines.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Appends a line, evicting the oldest if the buffer is full.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
        self.total += 1;
    }

    /// Lines currently held, oldest first.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &str> + DoubleEndedIterator {
        self.lines.iter().map(String::as_str)
    }

    /// Most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Number of lines currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of lines held.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines appended over the buffer's lifetime, evicted ones included.
    #[must_use]
    pub const fn total_appended(&self) -> u64 {
        self.total
    }
}
