use std::ops::Range;

use crate::error::{DiffSyncError, Result};
use crate::matcher::Side;

use super::{split_lines, EditOutcome, History, LineChange, LineEdit, Position};

/// One editable side of a session.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    side: Side,
    lines: Vec<String>,
    revision: u64,
    saved_revision: u64,
    history: History,
}

impl TextBuffer {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            lines: Vec::new(),
            revision: 0,
            saved_revision: 0,
            history: History::default(),
        }
    }

    pub fn from_lines<I, S>(side: Side, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::new(side)
        }
    }

    pub fn from_text(side: Side, text: &str) -> Self {
        Self::from_lines(side, split_lines(text))
    }

    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.history = History::new(limit);
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the buffer changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn mark_saved(&mut self) {
        self.saved_revision = self.revision;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn line(&self, index: usize) -> Result<&str> {
        self.lines
            .get(index)
            .map(String::as_str)
            .ok_or(DiffSyncError::OutOfRange {
                side: self.side,
                index,
                len: self.lines.len(),
            })
    }

    pub fn lines(&self, range: Range<usize>) -> Result<&[String]> {
        self.check_range(&range)?;
        Ok(&self.lines[range])
    }

    pub fn all_lines(&self) -> &[String] {
        &self.lines
    }

    /// Full content for saving, every line terminated by `\n`.
    ///
    /// Loading the result with [`split_lines`] gives back the same lines.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.lines.len() {
            return Err(DiffSyncError::InvalidRange {
                start: range.start,
                end: range.end,
                len: self.lines.len(),
            });
        }
        Ok(())
    }

    /// Applies one logical edit, bumping the revision once.
    ///
    /// Returns `None` for an edit that replaces nothing with nothing.
    pub fn apply(&mut self, edit: LineEdit) -> Result<Option<LineChange>> {
        self.check_range(&edit.range)?;
        if edit.is_noop() {
            return Ok(None);
        }
        let (change, inverse) = self.splice(edit);
        self.history.record(inverse);
        Ok(Some(change))
    }

    fn splice(&mut self, edit: LineEdit) -> (LineChange, LineEdit) {
        let start = edit.range.start;
        let old_end = edit.range.end;
        let new_end = start + edit.lines.len();
        let removed: Vec<String> = self.lines.splice(edit.range, edit.lines).collect();
        self.revision += 1;

        let change = LineChange {
            revision: self.revision,
            start,
            old_end,
            new_end,
            line_count: self.lines.len(),
        };
        tracing::trace!(
            side = %self.side,
            revision = self.revision,
            start,
            removed = change.lines_removed(),
            added = change.lines_added(),
            "buffer edited"
        );
        let inverse = LineEdit {
            range: start..new_end,
            lines: removed,
        };
        (change, inverse)
    }

    pub fn replace_lines<I, S>(
        &mut self,
        range: Range<usize>,
        lines: I,
    ) -> Result<Option<LineChange>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(LineEdit::replace(range, lines))
    }

    pub fn insert_lines<I, S>(&mut self, at: usize, lines: I) -> Result<Option<LineChange>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(LineEdit::insert(at, lines))
    }

    pub fn set_line(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<Option<LineChange>> {
        self.line(index)?;
        self.apply(LineEdit::replace(index..index + 1, [text.into()]))
    }

    /// Replaces the characters `columns` of one line. A replacement holding
    /// newlines splits the line.
    pub fn edit_line(
        &mut self,
        line: usize,
        columns: Range<usize>,
        replacement: &str,
    ) -> Result<Option<LineChange>> {
        let current = self.line(line)?;
        if columns.start > columns.end {
            return Err(DiffSyncError::InvalidRange {
                start: columns.start,
                end: columns.end,
                len: current.chars().count(),
            });
        }
        let invalid = DiffSyncError::InvalidPosition {
            line,
            column: columns.end,
        };
        let start = byte_offset(current, columns.start).ok_or(invalid.clone())?;
        let end = byte_offset(current, columns.end).ok_or(invalid)?;
        if start == end && replacement.is_empty() {
            return Ok(None);
        }
        let joined = format!("{}{}{}", &current[..start], replacement, &current[end..]);
        let lines: Vec<String> = joined.split('\n').map(String::from).collect();
        self.apply(LineEdit::replace(line..line + 1, lines))
    }

    /// Deletes whole lines; the cursor lands at the start of the line that
    /// took their place.
    pub fn delete_lines(&mut self, range: Range<usize>) -> Result<EditOutcome> {
        let start = range.start;
        let change = self.apply(LineEdit::delete(range))?;
        let line = start.min(self.lines.len().saturating_sub(1));
        Ok(EditOutcome {
            change,
            cursor: Position::new(line, 0),
        })
    }

    /// The line a cursor edits and the range it occupies. A cursor may sit
    /// at column 0 of the line just past the end, which reads as empty.
    fn cursor_line(&self, pos: Position) -> Result<(Range<usize>, &str)> {
        if pos.line < self.lines.len() {
            Ok((pos.line..pos.line + 1, self.lines[pos.line].as_str()))
        } else if pos.line == self.lines.len() && pos.column == 0 {
            Ok((pos.line..pos.line, ""))
        } else {
            Err(DiffSyncError::InvalidPosition {
                line: pos.line,
                column: pos.column,
            })
        }
    }

    /// Inserts `text` at the cursor; newlines in `text` split the line.
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Result<EditOutcome> {
        let (range, current) = self.cursor_line(pos)?;
        let at = byte_offset(current, pos.column).ok_or(DiffSyncError::InvalidPosition {
            line: pos.line,
            column: pos.column,
        })?;
        if text.is_empty() {
            return Ok(EditOutcome::unchanged(pos));
        }

        let text = text.replace("\r\n", "\n");
        let joined = format!("{}{}{}", &current[..at], text, &current[at..]);
        let lines: Vec<String> = joined.split('\n').map(String::from).collect();

        let breaks = text.matches('\n').count();
        let cursor = match text.rfind('\n') {
            Some(idx) => Position::new(pos.line + breaks, text[idx + 1..].chars().count()),
            None => Position::new(pos.line, pos.column + text.chars().count()),
        };
        let change = self.apply(LineEdit::replace(range, lines))?;
        Ok(EditOutcome { change, cursor })
    }

    /// Breaks the line at the cursor (enter).
    pub fn split_line(&mut self, pos: Position) -> Result<EditOutcome> {
        self.insert_text(pos, "\n")
    }

    /// Deletes the character under the cursor; at the end of a line, joins
    /// the next line onto it.
    pub fn delete_char(&mut self, pos: Position) -> Result<EditOutcome> {
        let (_, current) = self.cursor_line(pos)?;
        let len = current.chars().count();
        if pos.column > len {
            return Err(DiffSyncError::InvalidPosition {
                line: pos.line,
                column: pos.column,
            });
        }

        let edit = if pos.column < len {
            LineEdit::replace(pos.line..pos.line + 1, [remove_char(current, pos.column)])
        } else if pos.line + 1 < self.lines.len() {
            let joined = format!("{}{}", current, self.lines[pos.line + 1]);
            LineEdit::replace(pos.line..pos.line + 2, [joined])
        } else {
            return Ok(EditOutcome::unchanged(pos));
        };
        let change = self.apply(edit)?;
        Ok(EditOutcome { change, cursor: pos })
    }

    /// Deletes the character before the cursor; at column 0, joins the line
    /// onto the previous one.
    pub fn backspace(&mut self, pos: Position) -> Result<EditOutcome> {
        let (_, current) = self.cursor_line(pos)?;
        let len = current.chars().count();
        if pos.column > len {
            return Err(DiffSyncError::InvalidPosition {
                line: pos.line,
                column: pos.column,
            });
        }

        if pos.column > 0 {
            let edited = remove_char(current, pos.column - 1);
            let edit = LineEdit::replace(pos.line..pos.line + 1, [edited]);
            let change = self.apply(edit)?;
            return Ok(EditOutcome {
                change,
                cursor: Position::new(pos.line, pos.column - 1),
            });
        }
        if pos.line == 0 {
            return Ok(EditOutcome::unchanged(pos));
        }

        let previous = &self.lines[pos.line - 1];
        let cursor = Position::new(pos.line - 1, previous.chars().count());
        if pos.line == self.lines.len() {
            return Ok(EditOutcome::unchanged(cursor));
        }
        let joined = format!("{}{}", previous, current);
        let change = self.apply(LineEdit::replace(pos.line - 1..pos.line + 1, [joined]))?;
        Ok(EditOutcome { change, cursor })
    }

    /// Joins `line` onto the previous line, collapsing the whitespace at the
    /// seam to a single space.
    pub fn join_lines(&mut self, line: usize) -> Result<EditOutcome> {
        self.line(line)?;
        if line == 0 {
            return Ok(EditOutcome::unchanged(Position::new(0, 0)));
        }
        let previous = self.lines[line - 1].trim_end();
        let current = self.lines[line].trim_start();
        let joined = if previous.is_empty() || current.is_empty() {
            format!("{}{}", previous, current)
        } else {
            format!("{} {}", previous, current)
        };
        let cursor = Position::new(line - 1, previous.chars().count());
        let change = self.apply(LineEdit::replace(line - 1..line + 1, [joined]))?;
        Ok(EditOutcome { change, cursor })
    }

    /// Reverts the latest edit. Undo is itself an edit and bumps the
    /// revision.
    pub fn undo(&mut self) -> Option<EditOutcome> {
        let inverse = self.history.pop_undo()?;
        let (change, redo) = self.splice(inverse);
        self.history.push_redo(redo);
        Some(self.outcome_at(change))
    }

    pub fn redo(&mut self) -> Option<EditOutcome> {
        let edit = self.history.pop_redo()?;
        let (change, inverse) = self.splice(edit);
        self.history.push_undo(inverse);
        Some(self.outcome_at(change))
    }

    fn outcome_at(&self, change: LineChange) -> EditOutcome {
        let line = change.start.min(self.lines.len().saturating_sub(1));
        EditOutcome {
            change: Some(change),
            cursor: Position::new(line, 0),
        }
    }
}

/// Byte offset of character `column`, allowing the end of the string.
fn byte_offset(s: &str, column: usize) -> Option<usize> {
    s.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(s.len()))
        .nth(column)
}

fn remove_char(s: &str, column: usize) -> String {
    s.chars()
        .enumerate()
        .filter(|&(idx, _)| idx != column)
        .map(|(_, c)| c)
        .collect()
}
