pub mod buffer;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod matcher;
pub mod model;
pub mod session;
pub mod sync;

pub use buffer::{EditOutcome, LineChange, LineEdit, Position, TextBuffer};
pub use config::{DiffSyncConfig, RecomputeScope};
pub use error::{DiffSyncError, Result};
pub use matcher::{AlignmentRegion, LineMatcher, MatchAlgorithm, RegionKind, Side};
pub use model::{DiffModel, DiffStats, RevisionPair};
pub use session::EditSession;
pub use sync::{SyncController, SyncState};
