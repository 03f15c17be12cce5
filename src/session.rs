//! Edit session
//!
//! Owns both buffers, the sync controller and the highlight refiner. This is
//! the surface a presentation layer talks to: every mutation goes through
//! here so the controller hears about it, and every read of the diff goes
//! through the controller so it is fresh.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use crate::buffer::{EditOutcome, LineChange, LineEdit, Position, TextBuffer};
use crate::config::DiffSyncConfig;
use crate::error::Result;
use crate::matcher::{AlignmentRegion, RegionHighlight, Refiner, Side};
use crate::model::{DiffModel, DiffStats, RevisionPair};
use crate::sync::{SyncController, SyncState};

pub struct EditSession {
    left: TextBuffer,
    right: TextBuffer,
    sync: SyncController,
    refiner: Refiner,
    config: DiffSyncConfig,
    show_sub_highlights: bool,
}

impl EditSession {
    /// A session over two empty buffers.
    pub fn new(config: DiffSyncConfig) -> Result<Self> {
        Self::from_lines(Vec::<String>::new(), Vec::<String>::new(), config)
    }

    pub fn from_lines<L, R, S>(left: L, right: R, config: DiffSyncConfig) -> Result<Self>
    where
        L: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        config.validate()?;
        let undo_limit = config.buffer.undo_limit;
        Ok(Self {
            left: TextBuffer::from_lines(Side::Left, left).with_undo_limit(undo_limit),
            right: TextBuffer::from_lines(Side::Right, right).with_undo_limit(undo_limit),
            sync: SyncController::new(&config),
            refiner: refiner_for(&config),
            config,
            show_sub_highlights: true,
        })
    }

    /// A session over loaded file contents; see [`crate::buffer::split_lines`].
    pub fn from_texts(left: &str, right: &str, config: DiffSyncConfig) -> Result<Self> {
        Self::from_lines(
            crate::buffer::split_lines(left),
            crate::buffer::split_lines(right),
            config,
        )
    }

    pub fn config(&self) -> &DiffSyncConfig {
        &self.config
    }

    /// Replaces the configuration; the next read recomputes in full.
    pub fn set_config(&mut self, config: DiffSyncConfig) -> Result<()> {
        config.validate()?;
        self.sync.reconfigure(&config);
        self.refiner = refiner_for(&config);
        self.config = config;
        Ok(())
    }

    pub fn buffer(&self, side: Side) -> &TextBuffer {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn buffer_mut(&mut self, side: Side) -> &mut TextBuffer {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn revisions(&self) -> RevisionPair {
        RevisionPair::of(&self.left, &self.right)
    }

    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn state(&self) -> SyncState {
        self.sync.state()
    }

    /// Content of one side for saving.
    pub fn text(&self, side: Side) -> String {
        self.buffer(side).text()
    }

    pub fn is_dirty(&self, side: Side) -> bool {
        self.buffer(side).is_dirty()
    }

    pub fn mark_saved(&mut self, side: Side) {
        self.buffer_mut(side).mark_saved();
    }

    fn changed(&mut self, side: Side, change: Option<LineChange>) -> Option<LineChange> {
        if let Some(change) = &change {
            self.sync.notify(side, change);
        }
        change
    }

    fn edited(&mut self, side: Side, outcome: EditOutcome) -> EditOutcome {
        self.changed(side, outcome.change);
        outcome
    }

    pub fn apply_edit(&mut self, side: Side, edit: LineEdit) -> Result<Option<LineChange>> {
        let change = self.buffer_mut(side).apply(edit)?;
        Ok(self.changed(side, change))
    }

    pub fn replace_lines<I, S>(
        &mut self,
        side: Side,
        range: Range<usize>,
        lines: I,
    ) -> Result<Option<LineChange>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_edit(side, LineEdit::replace(range, lines))
    }

    pub fn insert_lines<I, S>(
        &mut self,
        side: Side,
        at: usize,
        lines: I,
    ) -> Result<Option<LineChange>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_edit(side, LineEdit::insert(at, lines))
    }

    pub fn set_line(
        &mut self,
        side: Side,
        index: usize,
        text: impl Into<String>,
    ) -> Result<Option<LineChange>> {
        let change = self.buffer_mut(side).set_line(index, text)?;
        Ok(self.changed(side, change))
    }

    pub fn edit_line(
        &mut self,
        side: Side,
        line: usize,
        columns: Range<usize>,
        replacement: &str,
    ) -> Result<Option<LineChange>> {
        let change = self.buffer_mut(side).edit_line(line, columns, replacement)?;
        Ok(self.changed(side, change))
    }

    pub fn delete_lines(&mut self, side: Side, range: Range<usize>) -> Result<EditOutcome> {
        let outcome = self.buffer_mut(side).delete_lines(range)?;
        Ok(self.edited(side, outcome))
    }

    pub fn insert_text(&mut self, side: Side, pos: Position, text: &str) -> Result<EditOutcome> {
        let outcome = self.buffer_mut(side).insert_text(pos, text)?;
        Ok(self.edited(side, outcome))
    }

    pub fn split_line(&mut self, side: Side, pos: Position) -> Result<EditOutcome> {
        let outcome = self.buffer_mut(side).split_line(pos)?;
        Ok(self.edited(side, outcome))
    }

    pub fn delete_char(&mut self, side: Side, pos: Position) -> Result<EditOutcome> {
        let outcome = self.buffer_mut(side).delete_char(pos)?;
        Ok(self.edited(side, outcome))
    }

    pub fn backspace(&mut self, side: Side, pos: Position) -> Result<EditOutcome> {
        let outcome = self.buffer_mut(side).backspace(pos)?;
        Ok(self.edited(side, outcome))
    }

    pub fn join_lines(&mut self, side: Side, line: usize) -> Result<EditOutcome> {
        let outcome = self.buffer_mut(side).join_lines(line)?;
        Ok(self.edited(side, outcome))
    }

    pub fn undo(&mut self, side: Side) -> Option<EditOutcome> {
        let outcome = self.buffer_mut(side).undo()?;
        Some(self.edited(side, outcome))
    }

    pub fn redo(&mut self, side: Side) -> Option<EditOutcome> {
        let outcome = self.buffer_mut(side).redo()?;
        Some(self.edited(side, outcome))
    }

    /// The diff for the current buffer contents.
    pub fn diff(&mut self) -> Arc<DiffModel> {
        self.sync.ensure_fresh(&self.left, &self.right)
    }

    /// The installed diff without recomputing; check [`Self::is_stale`].
    pub fn snapshot(&self) -> Arc<DiffModel> {
        self.sync.snapshot()
    }

    pub fn is_stale(&self) -> bool {
        self.sync.is_stale(&self.left, &self.right)
    }

    /// Render-tick hook; `true` when a new diff was installed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.sync.tick(&self.left, &self.right, now)
    }

    pub fn region_at(&mut self, side: Side, line: usize) -> Result<AlignmentRegion> {
        self.diff().region_at(side, line).cloned()
    }

    pub fn corresponding_line(&mut self, side: Side, line: usize) -> Result<Option<usize>> {
        self.diff().corresponding_line(side, line)
    }

    pub fn equivalent_line(&mut self, side: Side, line: usize) -> Result<usize> {
        self.diff().equivalent_line(side, line)
    }

    pub fn stats(&mut self) -> DiffStats {
        self.diff().stats()
    }

    /// Line on `side` where the next difference after `line` starts,
    /// clamped to the buffer's last line.
    pub fn next_difference(&mut self, side: Side, line: usize) -> Option<usize> {
        let model = self.diff();
        let index = model.next_difference(side, line)?;
        Some(self.jump_target(&model, side, index))
    }

    pub fn previous_difference(&mut self, side: Side, line: usize) -> Option<usize> {
        let model = self.diff();
        let index = model.previous_difference(side, line)?;
        Some(self.jump_target(&model, side, index))
    }

    fn jump_target(&self, model: &DiffModel, side: Side, index: usize) -> usize {
        let start = model.regions()[index].range(side).start;
        start.min(self.buffer(side).line_count().saturating_sub(1))
    }

    pub fn show_sub_highlights(&self) -> bool {
        self.show_sub_highlights
    }

    pub fn set_show_sub_highlights(&mut self, show: bool) {
        self.show_sub_highlights = show;
    }

    /// Intra-line highlights for a `Changed` region of the current diff.
    ///
    /// `None` when sub-highlighting is off, the region is of another kind,
    /// or its sides are less similar than the configured threshold.
    pub fn highlights(&mut self, region_index: usize) -> Result<Option<RegionHighlight>> {
        let model = self.diff();
        let region = model.region(region_index)?;
        if !self.show_sub_highlights {
            return Ok(None);
        }
        Ok(self
            .refiner
            .refine(region, self.left.all_lines(), self.right.all_lines()))
    }

    /// Copies the other side's lines of region `region_index` over `into`'s
    /// lines, refreshing the diff first. The copy is an ordinary edit of
    /// `into`.
    pub fn accept_change(&mut self, region_index: usize, into: Side) -> Result<Option<LineChange>> {
        let model = self.diff();
        self.accept_change_in(&model, region_index, into)
    }

    /// Like [`Self::accept_change`] against a model the caller already
    /// holds. Fails with `StaleRead` if the buffers moved on since it was
    /// computed.
    pub fn accept_change_in(
        &mut self,
        model: &DiffModel,
        region_index: usize,
        into: Side,
    ) -> Result<Option<LineChange>> {
        model.ensure_current(self.revisions())?;
        let region = model.region(region_index)?;
        let lines = self
            .buffer(into.other())
            .lines(region.range(into.other()).clone())?
            .to_vec();
        tracing::debug!(region = %region, %into, "accepting change");
        self.apply_edit(into, LineEdit::replace(region.range(into).clone(), lines))
    }

    /// Accepts the change in the region holding `line` on `side`.
    pub fn accept_change_at(
        &mut self,
        side: Side,
        line: usize,
        into: Side,
    ) -> Result<Option<LineChange>> {
        let model = self.diff();
        let index = model.region_index_at(side, line)?;
        self.accept_change_in(&model, index, into)
    }
}

fn refiner_for(config: &DiffSyncConfig) -> Refiner {
    Refiner::new(
        config.matcher.similarity_threshold,
        config.matcher.max_edit_cost,
        config.matcher.deadline(),
        config.matcher.refine_cache_size,
    )
}
