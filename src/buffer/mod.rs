//! Text buffers
//!
//! A [`TextBuffer`] is one editable side of a session: an ordered list of
//! lines, a revision counter bumped once per logical edit, a saved revision
//! for dirty tracking, and an undo/redo history of inverse edits.

pub mod edit;
pub mod history;
pub mod text_buffer;

use serde::{Deserialize, Serialize};

pub use edit::{EditOutcome, LineChange, LineEdit};
pub use history::History;
pub use text_buffer::TextBuffer;

/// A cursor location; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Splits loaded text into buffer lines.
///
/// Lines are separated by `\n` (a preceding `\r` is dropped too) and one
/// trailing empty segment is discarded, so `""` is zero lines and `"a\n"`
/// is one.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
