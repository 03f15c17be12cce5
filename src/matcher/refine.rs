//! Character-level highlighting inside `Changed` regions.
//!
//! The lines of a changed region are joined with `\n` on each side and run
//! through the same Myers matcher at character granularity. The resulting
//! runs are mapped back to `(line, column)` spans; newlines never appear
//! inside a span.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::myers::{self, Budget, DiffOp, DiffTag};
use super::region::{AlignmentRegion, RegionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    /// Characters changed on both sides at this point.
    Replaced,
    /// Characters present only on the right.
    Inserted,
    /// Characters present only on the left.
    Deleted,
}

/// Highlighted characters `start..end` (in chars) of one buffer line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

/// Intra-line highlighting for one changed region, in buffer coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHighlight {
    pub similarity: f32,
    pub left: Vec<CharSpan>,
    pub right: Vec<CharSpan>,
}

/// Result of refining a pair of texts, with lines relative to the region.
#[derive(Debug, Clone, PartialEq)]
struct Refinement {
    similarity: f32,
    left: Vec<CharSpan>,
    right: Vec<CharSpan>,
}

impl Refinement {
    fn offset(&self, left_line: usize, right_line: usize) -> RegionHighlight {
        let shift = |spans: &[CharSpan], by: usize| {
            spans
                .iter()
                .map(|span| CharSpan {
                    line: span.line + by,
                    ..span.clone()
                })
                .collect()
        };
        RegionHighlight {
            similarity: self.similarity,
            left: shift(&self.left, left_line),
            right: shift(&self.right, right_line),
        }
    }
}

/// Produces and caches intra-line highlights.
pub struct Refiner {
    threshold: f32,
    max_cost: usize,
    deadline: Option<Duration>,
    cache: LruCache<(String, String), Refinement>,
}

impl Refiner {
    /// `max_cost` and `deadline` bound each character search the same way
    /// they bound line matching.
    pub fn new(
        threshold: f32,
        max_cost: usize,
        deadline: Option<Duration>,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            threshold,
            max_cost,
            deadline,
            cache: LruCache::new(capacity),
        }
    }

    /// Highlights for a `Changed` region, or `None` when the region is of
    /// another kind or its sides are less similar than the threshold.
    pub fn refine<S: AsRef<str>>(
        &mut self,
        region: &AlignmentRegion,
        left_lines: &[S],
        right_lines: &[S],
    ) -> Option<RegionHighlight> {
        if region.kind != RegionKind::Changed {
            return None;
        }
        let left = join(&left_lines[region.left.clone()]);
        let right = join(&right_lines[region.right.clone()]);
        let key = (left, right);

        if !self.cache.contains(&key) {
            let budget = Budget {
                max_cost: self.max_cost,
                deadline: self.deadline.map(|d| Instant::now() + d),
                cancel: None,
            };
            let refinement = refine_texts(&key.0, &key.1, &budget);
            self.cache.put(key.clone(), refinement);
        }
        let refinement = self.cache.get(&key)?;
        if refinement.similarity < self.threshold {
            return None;
        }
        Some(refinement.offset(region.left.start, region.right.start))
    }

    /// Cached entries and capacity.
    pub fn stats(&self) -> (usize, usize) {
        (self.cache.len(), self.cache.cap().get())
    }
}

fn join<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Similarity ratio `2·M / T`, with `M` matched characters and `T` the total
/// length of both texts. Two empty texts are identical.
pub fn similarity(ops: &[DiffOp], total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    let matched: usize = ops
        .iter()
        .filter(|op| op.tag == DiffTag::Equal)
        .map(|op| op.len)
        .sum();
    (2 * matched) as f32 / total as f32
}

fn refine_texts(left: &str, right: &str, budget: &Budget) -> Refinement {
    let a: Vec<char> = left.chars().collect();
    let b: Vec<char> = right.chars().collect();
    // Same orientation rule as line matching, so swapped sides mirror.
    let script = if a > b {
        myers::diff(&b, &a, budget).map(|ops| myers::mirrored(&ops))
    } else {
        myers::diff(&a, &b, budget)
    };
    let ops = match script {
        Ok(ops) => ops,
        Err(reason) => {
            tracing::debug!(?reason, "character refinement gave up");
            return Refinement {
                similarity: 0.0,
                left: Vec::new(),
                right: Vec::new(),
            };
        }
    };

    let mut left_spans = Vec::new();
    let mut right_spans = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let mut idx = 0;
    while idx < ops.len() {
        if ops[idx].tag == DiffTag::Equal {
            i += ops[idx].len;
            j += ops[idx].len;
            idx += 1;
            continue;
        }
        let (mut deleted, mut inserted) = (0, 0);
        while idx < ops.len() && ops[idx].tag != DiffTag::Equal {
            if ops[idx].tag == DiffTag::Delete {
                deleted += ops[idx].len;
            } else {
                inserted += ops[idx].len;
            }
            idx += 1;
        }
        let (left_kind, right_kind) = if deleted > 0 && inserted > 0 {
            (SpanKind::Replaced, SpanKind::Replaced)
        } else {
            (SpanKind::Deleted, SpanKind::Inserted)
        };
        push_spans(&a, i, i + deleted, left_kind, &mut left_spans);
        push_spans(&b, j, j + inserted, right_kind, &mut right_spans);
        i += deleted;
        j += inserted;
    }

    Refinement {
        similarity: similarity(&ops, a.len() + b.len()),
        left: left_spans,
        right: right_spans,
    }
}

/// Splits the character run `start..end` of `text` at newlines into spans.
fn push_spans(text: &[char], start: usize, end: usize, kind: SpanKind, out: &mut Vec<CharSpan>) {
    if start == end {
        return;
    }
    let mut line = text[..start].iter().filter(|&&c| c == '\n').count();
    let mut column = text[..start]
        .iter()
        .rev()
        .take_while(|&&c| c != '\n')
        .count();
    let mut span_start = column;
    for &c in &text[start..end] {
        if c == '\n' {
            if column > span_start {
                out.push(CharSpan {
                    line,
                    start: span_start,
                    end: column,
                    kind,
                });
            }
            line += 1;
            column = 0;
            span_start = 0;
        } else {
            column += 1;
        }
    }
    if column > span_start {
        out.push(CharSpan {
            line,
            start: span_start,
            end: column,
            kind,
        });
    }
}
