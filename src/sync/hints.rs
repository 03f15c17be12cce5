use crate::buffer::LineChange;
use crate::matcher::{RegionKind, Side, Window};
use crate::model::{DiffModel, RevisionPair};

/// Tracks how much of both buffers' edges is provably unchanged since the
/// installed model was computed.
///
/// The model's leading and trailing `Equal` regions are the starting point;
/// each edit can only shrink them. Any gap in the observed revisions (an
/// edit that was never reported) makes the hints unusable until the next
/// install.
#[derive(Debug, Clone)]
pub struct EditHints {
    tracked: RevisionPair,
    prefix: usize,
    suffix: usize,
    valid: bool,
}

impl Default for EditHints {
    fn default() -> Self {
        Self {
            tracked: RevisionPair::default(),
            prefix: 0,
            suffix: 0,
            valid: false,
        }
    }
}

impl EditHints {
    /// Starts over from a freshly installed model.
    pub fn reset(&mut self, model: &DiffModel) {
        let Some(at) = model.computed_at() else {
            self.invalidate();
            return;
        };
        let regions = model.regions();
        let equal_len = |region: Option<&crate::matcher::AlignmentRegion>| {
            region
                .filter(|r| r.kind == RegionKind::Equal)
                .map_or(0, |r| r.left.len())
        };
        self.tracked = at;
        self.prefix = equal_len(regions.first());
        self.suffix = equal_len(regions.last());
        self.valid = true;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn record(&mut self, side: Side, change: &LineChange) {
        if !self.valid {
            return;
        }
        let seen = match side {
            Side::Left => &mut self.tracked.left,
            Side::Right => &mut self.tracked.right,
        };
        if change.revision != *seen + 1 {
            tracing::debug!(
                %side,
                expected = *seen + 1,
                got = change.revision,
                "edit sequence has a gap, next recompute is full"
            );
            self.valid = false;
            return;
        }
        *seen = change.revision;
        self.prefix = self.prefix.min(change.start);
        self.suffix = self.suffix.min(change.untouched_tail());
    }

    /// The matching window for buffers at `current`, if every edit since
    /// the model was computed has been seen.
    pub fn window(&self, current: RevisionPair) -> Option<Window> {
        (self.valid && self.tracked == current).then(|| Window::new(self.prefix, self.suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::matcher::LineMatcher;

    fn buffers(left: &[&str], right: &[&str]) -> (TextBuffer, TextBuffer) {
        (
            TextBuffer::from_lines(Side::Left, left.iter().copied()),
            TextBuffer::from_lines(Side::Right, right.iter().copied()),
        )
    }

    #[test]
    fn test_hints_shrink_with_edits() {
        let (mut left, right) = buffers(&["a", "b", "c", "d", "e"], &["a", "b", "x", "d", "e"]);
        let model = DiffModel::compute(&LineMatcher::default(), &left, &right);
        let mut hints = EditHints::default();
        hints.reset(&model);
        assert_eq!(hints.window(RevisionPair::of(&left, &right)), Some(Window::new(2, 2)));

        let change = left.set_line(3, "D").unwrap().unwrap();
        hints.record(Side::Left, &change);
        assert_eq!(hints.window(RevisionPair::of(&left, &right)), Some(Window::new(2, 1)));
    }

    #[test]
    fn test_unreported_edit_invalidates() {
        let (mut left, right) = buffers(&["a", "b"], &["a", "b"]);
        let model = DiffModel::compute(&LineMatcher::default(), &left, &right);
        let mut hints = EditHints::default();
        hints.reset(&model);

        left.set_line(0, "x").unwrap();
        assert_eq!(hints.window(RevisionPair::of(&left, &right)), None);

        let change = left.set_line(1, "y").unwrap().unwrap();
        hints.record(Side::Left, &change);
        assert_eq!(hints.window(RevisionPair::of(&left, &right)), None);
    }

    #[test]
    fn test_empty_model_gives_no_window() {
        let mut hints = EditHints::default();
        hints.reset(&DiffModel::empty());
        assert_eq!(hints.window(RevisionPair::default()), None);
    }
}
