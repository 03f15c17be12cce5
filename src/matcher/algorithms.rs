use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use similar::Algorithm;

use super::myers::{self, Budget, DiffOp, DiffTag, Interrupted};

/// Trait for the token-sequence matchers the line matcher can run on the
/// interned middle of two buffers.
pub trait SequenceMatcher: Send + Sync {
    /// Edit script turning `a` into `b`, as ordered runs.
    fn run(&self, a: &[u32], b: &[u32], budget: &Budget) -> Result<Vec<DiffOp>, Interrupted>;

    fn name(&self) -> &'static str;
}

/// Myers' greedy forward search (native implementation).
pub struct MyersMatcher;

impl SequenceMatcher for MyersMatcher {
    fn run(&self, a: &[u32], b: &[u32], budget: &Budget) -> Result<Vec<DiffOp>, Interrupted> {
        myers::diff(a, b, budget)
    }

    fn name(&self) -> &'static str {
        "Myers"
    }
}

/// Patience diff, delegated to `similar`.
pub struct PatienceMatcher;

impl SequenceMatcher for PatienceMatcher {
    fn run(&self, a: &[u32], b: &[u32], budget: &Budget) -> Result<Vec<DiffOp>, Interrupted> {
        if budget.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(Interrupted::Cancelled);
        }
        let ops = similar::capture_diff_slices_deadline(Algorithm::Patience, a, b, budget.deadline);
        let mut out = Vec::with_capacity(ops.len() * 2);
        for op in ops {
            match op {
                similar::DiffOp::Equal { len, .. } => out.push(DiffOp {
                    tag: DiffTag::Equal,
                    len,
                }),
                similar::DiffOp::Delete { old_len, .. } => out.push(DiffOp {
                    tag: DiffTag::Delete,
                    len: old_len,
                }),
                similar::DiffOp::Insert { new_len, .. } => out.push(DiffOp {
                    tag: DiffTag::Insert,
                    len: new_len,
                }),
                similar::DiffOp::Replace {
                    old_len, new_len, ..
                } => {
                    out.push(DiffOp {
                        tag: DiffTag::Delete,
                        len: old_len,
                    });
                    out.push(DiffOp {
                        tag: DiffTag::Insert,
                        len: new_len,
                    });
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Patience"
    }
}

/// Available line matching algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchAlgorithm {
    #[default]
    Myers,
    Patience,
}

impl MatchAlgorithm {
    pub fn all() -> &'static [MatchAlgorithm] {
        &[Self::Myers, Self::Patience]
    }

    pub fn create(&self) -> Box<dyn SequenceMatcher> {
        match self {
            Self::Myers => Box::new(MyersMatcher),
            Self::Patience => Box::new(PatienceMatcher),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Myers => "Myers",
            Self::Patience => "Patience",
        }
    }
}

impl fmt::Display for MatchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithms_agree_on_simple_change() {
        let a = [1, 2, 3];
        let b = [1, 4, 3];
        for algorithm in MatchAlgorithm::all() {
            let matcher = algorithm.create();
            let ops = matcher.run(&a, &b, &Budget::unlimited()).unwrap();
            assert_eq!(myers::edit_cost(&ops), 2, "{}", matcher.name());
            assert_eq!(matcher.name(), algorithm.name());
        }
    }

    #[test]
    fn test_patience_respects_cancellation() {
        let cancel = myers::CancelToken::new();
        cancel.cancel();
        let budget = Budget {
            cancel: Some(cancel),
            ..Budget::unlimited()
        };
        assert_eq!(
            PatienceMatcher.run(&[1], &[2], &budget),
            Err(Interrupted::Cancelled)
        );
    }

    #[test]
    fn test_default_algorithm() {
        assert_eq!(MatchAlgorithm::default(), MatchAlgorithm::Myers);
        assert_eq!(MatchAlgorithm::Patience.to_string(), "Patience");
    }
}
