//! ID-cursor paging state for `chunk_by_id`.

use crate::value::Value;

/// What a chunk callback asks the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkControl {
    Continue,
    Stop,
}

impl From<bool> for ChunkControl {
    /// `false` stops the iteration.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            ChunkControl::Continue
        } else {
            ChunkControl::Stop
        }
    }
}

impl From<()> for ChunkControl {
    fn from(_: ()) -> Self {
        ChunkControl::Continue
    }
}

/// How a chunked iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The data ran out.
    Completed,
    /// The callback asked to stop.
    Stopped,
}

impl ChunkOutcome {
    pub fn is_completed(self) -> bool {
        self == ChunkOutcome::Completed
    }
}

/// Position of an ID-ordered scan.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    column: String,
    page_size: u64,
    last_id: Option<Value>,
}

impl PageCursor {
    /// Start before the first row; `column` is upper-cased.
    pub fn new(column: &str, page_size: u64) -> Self {
        Self {
            column: column.to_uppercase(),
            page_size,
            last_id: None,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Last ID seen; `None` until the first page is consumed.
    pub fn last_id(&self) -> Option<&Value> {
        self.last_id.as_ref()
    }

    pub fn advance(&mut self, last_id: Value) {
        self.last_id = Some(last_id);
    }

    /// Whether a page of `rows` rows means more data may follow.
    pub fn page_was_full(&self, rows: usize) -> bool {
        rows as u64 == self.page_size
    }
}
