//! Line matcher
//!
//! Computes the alignment between two line sequences as an ordered list of
//! [`AlignmentRegion`]s covering both sides exactly once. Lines are interned
//! (optionally whitespace-normalized) and handed to a [`SequenceMatcher`];
//! the default is the native Myers search in [`myers`].

pub mod algorithms;
pub mod myers;
pub mod refine;
pub mod region;
pub mod tokens;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use algorithms::{MatchAlgorithm, MyersMatcher, PatienceMatcher, SequenceMatcher};
pub use myers::{Budget, CancelToken, DiffOp, DiffTag, Interrupted};
pub use refine::{CharSpan, RegionHighlight, Refiner, SpanKind};
pub use region::{AlignmentRegion, RegionKind, Side};

use crate::config::MatcherConfig;
use region::{fallback_regions, RegionBuilder};
use tokens::{lines_match, normalize, LineInterner};

/// Whether the search should run on `b` against `a` and be mirrored back.
///
/// Searching the lexicographically smaller side first makes the result of
/// swapped inputs the exact mirror of the original, whichever minimal
/// script the tie-break picks.
fn search_swapped<A, B, T>(a: A, b: B) -> bool
where
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
    T: Ord,
{
    a.into_iter().cmp(b) == Ordering::Greater
}

/// Lines at the edges of both buffers that the caller already knows match.
///
/// The matcher extends these itself, so any underestimate (including zero)
/// yields the same alignment; only the amount of comparison work changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub known_prefix: usize,
    pub known_suffix: usize,
}

impl Window {
    /// Nothing known: match the whole buffers.
    pub const FULL: Window = Window {
        known_prefix: 0,
        known_suffix: 0,
    };

    pub fn new(known_prefix: usize, known_suffix: usize) -> Self {
        Self {
            known_prefix,
            known_suffix,
        }
    }
}

/// The matching was abandoned because its result is no longer wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

#[derive(Clone)]
pub struct LineMatcher {
    algorithm: MatchAlgorithm,
    sequence: Arc<dyn SequenceMatcher>,
    ignore_whitespace: bool,
    max_cost: usize,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for LineMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineMatcher")
            .field("algorithm", &self.algorithm)
            .field("ignore_whitespace", &self.ignore_whitespace)
            .field("max_cost", &self.max_cost)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Default for LineMatcher {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

impl LineMatcher {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            sequence: Arc::from(config.algorithm.create()),
            ignore_whitespace: config.ignore_whitespace,
            max_cost: config.max_edit_cost,
            deadline: config.deadline(),
        }
    }

    pub fn algorithm(&self) -> MatchAlgorithm {
        self.algorithm
    }

    pub fn ignore_whitespace(&self) -> bool {
        self.ignore_whitespace
    }

    /// Aligns two whole line sequences.
    pub fn match_lines<S: AsRef<str>>(&self, left: &[S], right: &[S]) -> Vec<AlignmentRegion> {
        match self.match_window(left, right, Window::FULL, None) {
            Ok(regions) => regions,
            // Without a token nothing can cancel the search.
            Err(Cancelled) => fallback_regions(left.len(), right.len()),
        }
    }

    /// Aligns two line sequences, trusting `window` for the lines known to
    /// match at both ends.
    ///
    /// The common prefix and suffix are always trimmed to their full extent
    /// before the sequence matcher runs, so the result does not depend on
    /// how much of them the window already covered. When the edit cost or
    /// deadline budget runs out the whole of both sequences is reported as a
    /// single difference.
    pub fn match_window<S: AsRef<str>>(
        &self,
        left: &[S],
        right: &[S],
        window: Window,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<AlignmentRegion>, Cancelled> {
        let n = left.len();
        let m = right.len();
        let eq = |i: usize, j: usize| {
            lines_match(left[i].as_ref(), right[j].as_ref(), self.ignore_whitespace)
        };

        let bound = n.min(m);
        let mut prefix = window.known_prefix.min(bound);
        debug_assert!((0..prefix).all(|i| eq(i, i)));
        while prefix < bound && eq(prefix, prefix) {
            prefix += 1;
        }
        let bound = bound - prefix;
        let mut suffix = window.known_suffix.min(bound);
        debug_assert!((1..=suffix).all(|s| eq(n - s, m - s)));
        while suffix < bound && eq(n - suffix - 1, m - suffix - 1) {
            suffix += 1;
        }

        let mut builder = RegionBuilder::new();
        builder.equal(prefix);

        let mid_left = &left[prefix..n - suffix];
        let mid_right = &right[prefix..m - suffix];
        if mid_left.is_empty() || mid_right.is_empty() {
            builder.delete(mid_left.len());
            builder.insert(mid_right.len());
        } else {
            let ws = self.ignore_whitespace;
            let swapped = search_swapped(
                mid_left.iter().map(|line| normalize(line.as_ref(), ws)),
                mid_right.iter().map(|line| normalize(line.as_ref(), ws)),
            );
            let mut interner = LineInterner::new(ws);
            let a = interner.intern_all(mid_left);
            let b = interner.intern_all(mid_right);
            let (first, second) = if swapped { (&b, &a) } else { (&a, &b) };
            let budget = Budget {
                max_cost: self.max_cost,
                deadline: self.deadline.map(|d| Instant::now() + d),
                cancel: cancel.cloned(),
            };
            match self.sequence.run(first, second, &budget) {
                Ok(ops) if swapped => replay(&myers::mirrored(&ops), &mut builder),
                Ok(ops) => replay(&ops, &mut builder),
                Err(Interrupted::Cancelled) => return Err(Cancelled),
                Err(reason) => {
                    tracing::warn!(
                        ?reason,
                        left_lines = n,
                        right_lines = m,
                        "line matching exceeded its budget, reporting one changed region"
                    );
                    return Ok(fallback_regions(n, m));
                }
            }
        }

        builder.equal(suffix);
        Ok(builder.finish())
    }

    /// Aligns two arbitrary token sequences (e.g. characters) with the
    /// native Myers search.
    pub fn match_tokens<T: Ord>(&self, left: &[T], right: &[T]) -> Vec<AlignmentRegion> {
        let budget = Budget {
            max_cost: self.max_cost,
            deadline: self.deadline.map(|d| Instant::now() + d),
            cancel: None,
        };
        let script = if search_swapped(left.iter(), right.iter()) {
            myers::diff(right, left, &budget).map(|ops| myers::mirrored(&ops))
        } else {
            myers::diff(left, right, &budget)
        };
        match script {
            Ok(ops) => {
                let mut builder = RegionBuilder::new();
                replay(&ops, &mut builder);
                builder.finish()
            }
            Err(_) => fallback_regions(left.len(), right.len()),
        }
    }
}

fn replay(ops: &[DiffOp], builder: &mut RegionBuilder) {
    for op in ops {
        match op.tag {
            DiffTag::Equal => builder.equal(op.len),
            DiffTag::Delete => builder.delete(op.len),
            DiffTag::Insert => builder.insert(op.len),
        }
    }
}

/// Checks that `regions` cover `0..left_len` and `0..right_len` in order,
/// without gaps or overlaps.
pub fn covers(regions: &[AlignmentRegion], left_len: usize, right_len: usize) -> bool {
    let (mut left, mut right) = (0, 0);
    for region in regions {
        if region.left.start != left || region.right.start != right {
            return false;
        }
        let consistent = match region.kind {
            RegionKind::Equal => region.left.len() == region.right.len() && !region.left.is_empty(),
            RegionKind::Changed => !region.left.is_empty() && !region.right.is_empty(),
            RegionKind::InsertOnly => region.left.is_empty() && !region.right.is_empty(),
            RegionKind::DeleteOnly => !region.left.is_empty() && region.right.is_empty(),
        };
        if !consistent {
            return false;
        }
        left = region.left.end;
        right = region.right.end;
    }
    left == left_len && right == right_len
}
