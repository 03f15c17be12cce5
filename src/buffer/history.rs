use std::collections::VecDeque;

use super::LineEdit;

/// Undo/redo stacks of inverse edits for one buffer.
///
/// Every entry is the edit that reverts a change, expressed against the
/// buffer as it was right after that change. Recording a new change clears
/// the redo stack; the oldest undo entries are dropped past `limit`.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<LineEdit>,
    redo: Vec<LineEdit>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn record(&mut self, inverse: LineEdit) {
        self.redo.clear();
        self.push_undo(inverse);
    }

    pub(crate) fn push_undo(&mut self, inverse: LineEdit) {
        if self.limit == 0 {
            return;
        }
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(inverse);
    }

    pub(crate) fn push_redo(&mut self, inverse: LineEdit) {
        self.redo.push(inverse);
    }

    pub(crate) fn pop_undo(&mut self) -> Option<LineEdit> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<LineEdit> {
        self.redo.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(2);
        history.record(LineEdit::delete(0..1));
        history.record(LineEdit::delete(1..2));
        history.record(LineEdit::delete(2..3));
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.pop_undo(), Some(LineEdit::delete(2..3)));
        assert_eq!(history.pop_undo(), Some(LineEdit::delete(1..2)));
        assert_eq!(history.pop_undo(), None);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        history.push_redo(LineEdit::delete(0..1));
        assert!(history.can_redo());
        history.record(LineEdit::delete(0..1));
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }
}
