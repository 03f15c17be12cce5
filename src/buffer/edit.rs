use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Position;

/// Replace the lines in `range` with `lines`.
///
/// Insertion is an empty range, deletion an empty `lines`. A multi-line
/// paste is a single `LineEdit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    pub range: Range<usize>,
    pub lines: Vec<String>,
}

impl LineEdit {
    pub fn replace<I, S>(range: Range<usize>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            range,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert<I, S>(at: usize, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::replace(at..at, lines)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self {
            range,
            lines: Vec::new(),
        }
    }

    /// An edit that replaces nothing with nothing.
    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.lines.is_empty()
    }
}

/// What an applied edit did to a buffer, in the buffer's new coordinates.
///
/// Lines `..start` are untouched, old lines `start..old_end` became new
/// lines `start..new_end`, and the `line_count - new_end` lines after them
/// are the same lines that followed `old_end` before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    /// Buffer revision after the edit.
    pub revision: u64,
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
    /// Buffer line count after the edit.
    pub line_count: usize,
}

impl LineChange {
    /// Number of trailing lines the edit left in place.
    pub fn untouched_tail(&self) -> usize {
        self.line_count - self.new_end
    }

    pub fn lines_removed(&self) -> usize {
        self.old_end - self.start
    }

    pub fn lines_added(&self) -> usize {
        self.new_end - self.start
    }
}

/// Result of a cursor-level edit: the change (if any) and where the cursor
/// ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub change: Option<LineChange>,
    pub cursor: Position,
}

impl EditOutcome {
    pub fn unchanged(cursor: Position) -> Self {
        Self {
            change: None,
            cursor,
        }
    }
}
