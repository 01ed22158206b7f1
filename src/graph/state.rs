use serde::{Deserialize, Serialize};

/// Whether an edge is still unknown, known empty, or known to hold something.
///
/// `has_received_data` only ever goes from false to true: the first remote write to an edge
/// sets it, even when that write says the edge is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeState {
    has_received_data: bool,
    is_empty: bool,
    is_stale: bool,
}

impl Default for EdgeState {
    fn default() -> Self {
        EdgeState {
            has_received_data: false,
            is_empty: true,
            is_stale: false,
        }
    }
}

impl EdgeState {
    pub fn has_received_data(&self) -> bool {
        self.has_received_data
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// A newer `links.related` arrived without data; what we hold may be out of date.
    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub(crate) fn receive(&mut self) {
        self.has_received_data = true;
        self.is_stale = false;
    }

    pub(crate) fn set_empty(&mut self, is_empty: bool) {
        self.is_empty = is_empty;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.is_stale = true;
    }
}
