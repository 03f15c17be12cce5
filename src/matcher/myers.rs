//! Greedy forward Myers diff, O((N+M)·D) time.
//!
//! The forward search records the furthest-reaching x of every diagonal for
//! each edit cost `d`, then walks the trace backwards to recover the path.
//! When two predecessors reach equally far the deletion is taken, so every
//! matching run is as long and as early as the minimal cost allows. A common
//! prefix and suffix are stripped before searching.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared flag used to abandon a running match once its result is no longer wanted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a search stopped before finding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The edit cost passed the configured maximum.
    CostExceeded,
    /// The deadline passed.
    DeadlineExceeded,
    /// The caller cancelled the search.
    Cancelled,
}

/// Limits applied to a single search.
#[derive(Debug, Clone)]
pub struct Budget {
    pub max_cost: usize,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelToken>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self {
            max_cost: usize::MAX,
            deadline: None,
            cancel: None,
        }
    }

    fn check(&self) -> Result<(), Interrupted> {
        if let Some(cancel) = &self.cancel {
            if cancel.is_cancelled() {
                return Err(Interrupted::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupted::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    Equal,
    Delete,
    Insert,
}

impl DiffTag {
    /// The tag this run takes when `a` and `b` are swapped.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Delete => Self::Insert,
            Self::Insert => Self::Delete,
            Self::Equal => Self::Equal,
        }
    }
}

/// A run of `len` tokens sharing one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOp {
    pub tag: DiffTag,
    pub len: usize,
}

#[derive(Debug, Default)]
struct OpList(Vec<DiffOp>);

impl OpList {
    fn push(&mut self, tag: DiffTag, len: usize) {
        if len == 0 {
            return;
        }
        match self.0.last_mut() {
            Some(last) if last.tag == tag => last.len += len,
            _ => self.0.push(DiffOp { tag, len }),
        }
    }
}

/// Computes a minimal edit script turning `a` into `b`.
///
/// The returned runs are in order and cover `a` (Equal + Delete) and `b`
/// (Equal + Insert) exactly once.
pub fn diff<T: Eq>(a: &[T], b: &[T], budget: &Budget) -> Result<Vec<DiffOp>, Interrupted> {
    let prefix = common_prefix(a, b);
    let suffix = common_suffix(&a[prefix..], &b[prefix..]);
    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let mut ops = OpList::default();
    ops.push(DiffTag::Equal, prefix);
    if mid_a.is_empty() || mid_b.is_empty() {
        ops.push(DiffTag::Delete, mid_a.len());
        ops.push(DiffTag::Insert, mid_b.len());
    } else {
        let trace = forward(mid_a, mid_b, budget)?;
        backtrack(mid_a.len(), mid_b.len(), &trace, &mut ops);
    }
    ops.push(DiffTag::Equal, suffix);
    Ok(ops.0)
}

/// The script for `b` into `a`, given the script for `a` into `b`.
pub fn mirrored(ops: &[DiffOp]) -> Vec<DiffOp> {
    ops.iter()
        .map(|op| DiffOp {
            tag: op.tag.mirrored(),
            len: op.len,
        })
        .collect()
}

/// Number of tokens that are not part of an equal run.
pub fn edit_cost(ops: &[DiffOp]) -> usize {
    ops.iter()
        .filter(|op| op.tag != DiffTag::Equal)
        .map(|op| op.len)
        .sum()
}

pub(crate) fn common_prefix<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

pub(crate) fn common_suffix<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Furthest-reaching x per diagonal, one row per edit cost.
///
/// Row `d` stores only the diagonals of matching parity, `k = -d, -d+2, ..., d`,
/// at index `(k + d) / 2`.
type Trace = Vec<Vec<u32>>;

fn row_get(row: &[u32], d: isize, k: isize) -> usize {
    row[((k + d) / 2) as usize] as usize
}

fn forward<T: Eq>(a: &[T], b: &[T], budget: &Budget) -> Result<Trace, Interrupted> {
    let n = a.len();
    let m = b.len();
    let max_d = (n + m).min(budget.max_cost);
    let offset = max_d as isize + 1;
    let mut v = vec![0usize; 2 * max_d + 3];
    let mut trace: Trace = Vec::new();

    for d in 0..=max_d as isize {
        budget.check()?;
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            while x < n && y < m && a[x] == b[y] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                trace.push(snapshot(&v, offset, d));
                return Ok(trace);
            }
            k += 2;
        }
        trace.push(snapshot(&v, offset, d));
    }
    Err(Interrupted::CostExceeded)
}

fn snapshot(v: &[usize], offset: isize, d: isize) -> Vec<u32> {
    (-d..=d)
        .step_by(2)
        .map(|k| v[(k + offset) as usize] as u32)
        .collect()
}

fn backtrack(n: usize, m: usize, trace: &Trace, ops: &mut OpList) {
    let mut x = n;
    let mut y = m;
    let mut reversed: Vec<(DiffTag, usize)> = Vec::with_capacity(trace.len() * 2);

    for d in (1..trace.len()).rev() {
        let d = d as isize;
        let prev = &trace[(d - 1) as usize];
        let k = x as isize - y as isize;
        let down = k == -d
            || (k != d && row_get(prev, d - 1, k - 1) < row_get(prev, d - 1, k + 1));
        let prev_k = if down { k + 1 } else { k - 1 };
        let prev_x = row_get(prev, d - 1, prev_k);
        let prev_y = (prev_x as isize - prev_k) as usize;
        let (mid_x, tag) = if down {
            (prev_x, DiffTag::Insert)
        } else {
            (prev_x + 1, DiffTag::Delete)
        };
        reversed.push((DiffTag::Equal, x - mid_x));
        reversed.push((tag, 1));
        x = prev_x;
        y = prev_y;
    }
    debug_assert_eq!(x, y);
    reversed.push((DiffTag::Equal, x));

    for (tag, len) in reversed.into_iter().rev() {
        ops.push(tag, len);
    }
}
