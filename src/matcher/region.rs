use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One of the two buffers being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of an alignment region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// Both sides hold the same lines.
    Equal,
    /// Both sides hold lines, and they differ.
    Changed,
    /// Lines exist only on the right.
    InsertOnly,
    /// Lines exist only on the left.
    DeleteOnly,
}

impl RegionKind {
    pub fn is_difference(self) -> bool {
        self != Self::Equal
    }

    /// The kind this region takes when left and right are swapped.
    pub fn mirrored(self) -> Self {
        match self {
            Self::InsertOnly => Self::DeleteOnly,
            Self::DeleteOnly => Self::InsertOnly,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::Changed => "Changed",
            Self::InsertOnly => "InsertOnly",
            Self::DeleteOnly => "DeleteOnly",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A maximal span of the alignment with a line range on each side.
///
/// Ranges are half-open. An `InsertOnly` region has an empty left range and a
/// `DeleteOnly` region an empty right range; the empty range still carries the
/// position where the other side's lines would go.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignmentRegion {
    pub kind: RegionKind,
    pub left: Range<usize>,
    pub right: Range<usize>,
}

impl AlignmentRegion {
    pub fn new(kind: RegionKind, left: Range<usize>, right: Range<usize>) -> Self {
        Self { kind, left, right }
    }

    pub fn range(&self, side: Side) -> &Range<usize> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn is_difference(&self) -> bool {
        self.kind.is_difference()
    }

    /// The same region with sides swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            kind: self.kind.mirrored(),
            left: self.right.clone(),
            right: self.left.clone(),
        }
    }
}

impl fmt::Display for AlignmentRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}([{},{}),[{},{}))",
            self.kind, self.left.start, self.left.end, self.right.start, self.right.end
        )
    }
}

/// Accumulates token-level runs into maximal alignment regions.
///
/// Equal runs merge with each other; any mix of deletions and insertions
/// between two equal runs becomes one `Changed`, `DeleteOnly` or `InsertOnly`
/// region.
#[derive(Debug, Default)]
pub(crate) struct RegionBuilder {
    regions: Vec<AlignmentRegion>,
    left: usize,
    right: usize,
    deleted: usize,
    inserted: usize,
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equal(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.flush_change();
        let left = self.left..self.left + len;
        let right = self.right..self.right + len;
        self.left += len;
        self.right += len;
        match self.regions.last_mut() {
            Some(last) if last.kind == RegionKind::Equal => {
                last.left.end = left.end;
                last.right.end = right.end;
            }
            _ => self
                .regions
                .push(AlignmentRegion::new(RegionKind::Equal, left, right)),
        }
    }

    pub fn delete(&mut self, len: usize) {
        self.deleted += len;
    }

    pub fn insert(&mut self, len: usize) {
        self.inserted += len;
    }

    pub fn finish(mut self) -> Vec<AlignmentRegion> {
        self.flush_change();
        self.regions
    }

    fn flush_change(&mut self) {
        let kind = match (self.deleted, self.inserted) {
            (0, 0) => return,
            (_, 0) => RegionKind::DeleteOnly,
            (0, _) => RegionKind::InsertOnly,
            _ => RegionKind::Changed,
        };
        let left = self.left..self.left + self.deleted;
        let right = self.right..self.right + self.inserted;
        self.left = left.end;
        self.right = right.end;
        self.deleted = 0;
        self.inserted = 0;
        self.regions.push(AlignmentRegion::new(kind, left, right));
    }
}

/// Regions used when matching gives up: everything on both sides is one
/// difference.
pub(crate) fn fallback_regions(left_len: usize, right_len: usize) -> Vec<AlignmentRegion> {
    let mut builder = RegionBuilder::new();
    builder.delete(left_len);
    builder.insert(right_len);
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_equal_runs() {
        let mut builder = RegionBuilder::new();
        builder.equal(2);
        builder.equal(3);
        let regions = builder.finish();
        assert_eq!(
            regions,
            vec![AlignmentRegion::new(RegionKind::Equal, 0..5, 0..5)]
        );
    }

    #[test]
    fn test_builder_groups_mixed_changes() {
        let mut builder = RegionBuilder::new();
        builder.equal(1);
        builder.delete(1);
        builder.insert(2);
        builder.delete(1);
        builder.equal(1);
        builder.insert(1);
        let regions = builder.finish();
        assert_eq!(
            regions,
            vec![
                AlignmentRegion::new(RegionKind::Equal, 0..1, 0..1),
                AlignmentRegion::new(RegionKind::Changed, 1..3, 1..3),
                AlignmentRegion::new(RegionKind::Equal, 3..4, 3..4),
                AlignmentRegion::new(RegionKind::InsertOnly, 4..4, 4..5),
            ]
        );
    }

    #[test]
    fn test_fallback_regions() {
        assert!(fallback_regions(0, 0).is_empty());
        assert_eq!(
            fallback_regions(3, 0),
            vec![AlignmentRegion::new(RegionKind::DeleteOnly, 0..3, 0..0)]
        );
        assert_eq!(
            fallback_regions(2, 4),
            vec![AlignmentRegion::new(RegionKind::Changed, 0..2, 0..4)]
        );
    }

    #[test]
    fn test_mirrored_swaps_kind_and_ranges() {
        let region = AlignmentRegion::new(RegionKind::InsertOnly, 2..2, 2..5);
        let mirrored = region.mirrored();
        assert_eq!(mirrored.kind, RegionKind::DeleteOnly);
        assert_eq!(mirrored.left, 2..5);
        assert_eq!(mirrored.right, 2..2);
        assert_eq!(region.to_string(), "InsertOnly([2,2),[2,5))");
    }
}
