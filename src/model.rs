//! Diff model
//!
//! An immutable alignment between the two buffers, stamped with the buffer
//! revisions it was computed against. Recomputation builds a new model; the
//! session swaps it in whole, so a reader holding an `Arc<DiffModel>` never
//! sees a partial update.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffer::TextBuffer;
use crate::error::{DiffSyncError, Result};
use crate::matcher::{AlignmentRegion, LineMatcher, RegionKind, Side};

/// Revisions of the left and right buffers at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RevisionPair {
    pub left: u64,
    pub right: u64,
}

impl RevisionPair {
    pub fn new(left: u64, right: u64) -> Self {
        Self { left, right }
    }

    pub fn of(left: &TextBuffer, right: &TextBuffer) -> Self {
        Self::new(left.revision(), right.revision())
    }

    /// Whether `self` is at or after `other` on both sides.
    pub fn dominates(&self, other: &RevisionPair) -> bool {
        self.left >= other.left && self.right >= other.right
    }
}

impl fmt::Display for RevisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left {}, right {}", self.left, self.right)
    }
}

/// Line counts per region kind.
///
/// `regions` counts the difference regions (everything but `Equal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffStats {
    pub equal: usize,
    pub changed_left: usize,
    pub changed_right: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub regions: usize,
}

impl DiffStats {
    pub fn has_differences(&self) -> bool {
        self.regions > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffModel {
    regions: Vec<AlignmentRegion>,
    computed_at: Option<RevisionPair>,
    left_len: usize,
    right_len: usize,
}

impl Default for DiffModel {
    fn default() -> Self {
        Self::empty()
    }
}

impl DiffModel {
    /// The model a session starts with; stale against any buffers.
    pub fn empty() -> Self {
        Self {
            regions: Vec::new(),
            computed_at: None,
            left_len: 0,
            right_len: 0,
        }
    }

    pub fn new(
        regions: Vec<AlignmentRegion>,
        computed_at: RevisionPair,
        left_len: usize,
        right_len: usize,
    ) -> Self {
        debug_assert!(crate::matcher::covers(&regions, left_len, right_len));
        Self {
            regions,
            computed_at: Some(computed_at),
            left_len,
            right_len,
        }
    }

    /// Full alignment of two buffers.
    pub fn compute(matcher: &LineMatcher, left: &TextBuffer, right: &TextBuffer) -> Self {
        let regions = matcher.match_lines(left.all_lines(), right.all_lines());
        Self::new(
            regions,
            RevisionPair::of(left, right),
            left.line_count(),
            right.line_count(),
        )
    }

    pub fn regions(&self) -> &[AlignmentRegion] {
        &self.regions
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn computed_at(&self) -> Option<RevisionPair> {
        self.computed_at
    }

    /// Line count of one side when the model was computed.
    pub fn line_count(&self, side: Side) -> usize {
        match side {
            Side::Left => self.left_len,
            Side::Right => self.right_len,
        }
    }

    pub fn region(&self, index: usize) -> Result<&AlignmentRegion> {
        self.regions.get(index).ok_or(DiffSyncError::NoSuchRegion {
            index,
            count: self.regions.len(),
        })
    }

    /// Index of the region holding `line` on `side`.
    ///
    /// `line == line_count` is the position just past the last line and
    /// resolves to the last region.
    pub fn region_index_at(&self, side: Side, line: usize) -> Result<usize> {
        let len = self.line_count(side);
        if line > len || self.regions.is_empty() {
            return Err(DiffSyncError::OutOfRange {
                side,
                index: line,
                len,
            });
        }
        let index = self
            .regions
            .partition_point(|region| region.range(side).end <= line);
        Ok(index.min(self.regions.len() - 1))
    }

    pub fn region_at(&self, side: Side, line: usize) -> Result<&AlignmentRegion> {
        let index = self.region_index_at(side, line)?;
        Ok(&self.regions[index])
    }

    /// The line on the other side aligned with `line`, or `None` when `line`
    /// is in an `InsertOnly`/`DeleteOnly` region.
    ///
    /// Lines of a `Changed` region pair up by offset; offsets past the end of
    /// the shorter side map to its last line.
    pub fn corresponding_line(&self, side: Side, line: usize) -> Result<Option<usize>> {
        let region = self.region_at(side, line)?;
        let here = region.range(side);
        let there = region.range(side.other());
        let offset = line.saturating_sub(here.start);
        let mapped = match region.kind {
            RegionKind::InsertOnly | RegionKind::DeleteOnly => None,
            RegionKind::Equal => Some(there.start + offset),
            RegionKind::Changed if line >= here.end => Some(there.end),
            RegionKind::Changed => Some(there.start + offset.min(there.len() - 1)),
        };
        Ok(mapped)
    }

    /// A line on the other side to show next to `line`, for scroll-follow.
    ///
    /// Always answers: inside a region the offset is scaled to the other
    /// side's range, and the result is clamped to the other side's last line.
    pub fn equivalent_line(&self, side: Side, line: usize) -> Result<usize> {
        let region = self.region_at(side, line)?;
        let here = region.range(side);
        let there = region.range(side.other());
        let offset = line.saturating_sub(here.start);

        let mapped = if there.is_empty() || here.is_empty() {
            there.start
        } else if region.kind == RegionKind::Equal {
            there.start + offset
        } else {
            let scaled = (offset * there.len() + here.len() / 2) / here.len();
            there.start + scaled.min(there.len() - 1)
        };
        let last = self.line_count(side.other()).saturating_sub(1);
        Ok(mapped.min(last))
    }

    pub fn is_stale(&self, left: &TextBuffer, right: &TextBuffer) -> bool {
        self.is_stale_at(RevisionPair::of(left, right))
    }

    pub fn is_stale_at(&self, current: RevisionPair) -> bool {
        self.computed_at != Some(current)
    }

    /// Fails with `StaleRead` unless the model matches `current`.
    pub fn ensure_current(&self, current: RevisionPair) -> Result<()> {
        if self.is_stale_at(current) {
            return Err(DiffSyncError::StaleRead {
                model: self.computed_at,
                current,
            });
        }
        Ok(())
    }

    pub fn differences(&self) -> impl Iterator<Item = (usize, &AlignmentRegion)> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, region)| region.is_difference())
    }

    /// First difference region starting after `line` on `side`.
    pub fn next_difference(&self, side: Side, line: usize) -> Option<usize> {
        self.differences()
            .find(|(_, region)| region.range(side).start > line)
            .map(|(index, _)| index)
    }

    /// Last difference region starting before `line` on `side`.
    pub fn previous_difference(&self, side: Side, line: usize) -> Option<usize> {
        self.differences()
            .filter(|(_, region)| region.range(side).start < line)
            .last()
            .map(|(index, _)| index)
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for region in &self.regions {
            match region.kind {
                RegionKind::Equal => stats.equal += region.left.len(),
                RegionKind::Changed => {
                    stats.changed_left += region.left.len();
                    stats.changed_right += region.right.len();
                }
                RegionKind::InsertOnly => stats.inserted += region.right.len(),
                RegionKind::DeleteOnly => stats.deleted += region.left.len(),
            }
            if region.is_difference() {
                stats.regions += 1;
            }
        }
        stats
    }
}
