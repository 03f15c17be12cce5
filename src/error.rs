//! Error kinds surfaced by the diff-and-synchronization core.
//!
//! Every variant is recoverable by the caller: re-validate the range, or force
//! a recompute and read again. None of them poisons an [`EditSession`].
//!
//! [`EditSession`]: crate::session::EditSession

use thiserror::Error;

use crate::matcher::Side;
use crate::model::RevisionPair;

pub type Result<T> = std::result::Result<T, DiffSyncError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffSyncError {
    /// A line index past the end of a buffer or diff model.
    #[error("line {index} is out of range for the {side} side ({len} lines)")]
    OutOfRange { side: Side, index: usize, len: usize },

    /// A malformed line range, e.g. end before start or end past the buffer.
    #[error("invalid line range {start}..{end} for a buffer of {len} lines")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// A cursor position that does not address a character boundary.
    #[error("invalid position {line}:{column}")]
    InvalidPosition { line: usize, column: usize },

    /// A region index past the end of the diff model.
    #[error("no region {index} (model has {count} regions)")]
    NoSuchRegion { index: usize, count: usize },

    /// The diff model was computed against older buffer revisions.
    #[error("diff model computed at {model:?} but buffers are at {current}")]
    StaleRead {
        model: Option<RevisionPair>,
        current: RevisionPair,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_side() {
        let err = DiffSyncError::OutOfRange {
            side: Side::Right,
            index: 7,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "line 7 is out of range for the right side (3 lines)"
        );
    }

    #[test]
    fn test_stale_read_message() {
        let err = DiffSyncError::StaleRead {
            model: None,
            current: RevisionPair::new(2, 0),
        };
        assert!(err.to_string().contains("left 2, right 0"));
    }
}
