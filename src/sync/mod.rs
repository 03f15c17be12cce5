//! Sync controller
//!
//! Keeps the diff model in step with the two buffers. Edits are reported
//! with [`SyncController::notify`], which moves the controller from `Idle`
//! to `Dirty`. Nothing is recomputed until a read: either an explicit
//! [`SyncController::ensure_fresh`] or a render [`SyncController::tick`]
//! once the debounce interval has passed since the last edit. A burst of
//! edits therefore costs one recompute.
//!
//! Scoped and full recomputes are the same matcher call. Scoped passes a
//! [`Window`] of edge lines that [`EditHints`] proved unchanged; full
//! passes [`Window::FULL`].

mod hints;
mod worker;

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use hints::EditHints;

use crate::buffer::{LineChange, TextBuffer};
use crate::config::{DiffSyncConfig, RecomputeScope};
use crate::matcher::region::fallback_regions;
use crate::matcher::{AlignmentRegion, CancelToken, LineMatcher, Side, Window};
use crate::model::{DiffModel, RevisionPair};
use worker::{Job, JobResult, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// The installed model matches the buffers.
    Idle,
    /// The buffers changed since the model was computed.
    Dirty,
    /// A background recompute for the current revisions is running.
    Recomputing,
}

/// Counters for recompute activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub full_recomputes: u64,
    pub scoped_recomputes: u64,
    /// Edge lines skipped by scoped recomputes.
    pub lines_reused: u64,
    /// Background results thrown away because newer edits superseded them.
    pub discarded_results: u64,
    pub last_duration: Option<Duration>,
}

pub struct SyncController {
    matcher: LineMatcher,
    scope: RecomputeScope,
    debounce: Duration,
    model: Arc<DiffModel>,
    state: SyncState,
    hints: EditHints,
    last_edit: Option<Instant>,
    worker: Option<Worker>,
    stats: SyncStats,
}

impl SyncController {
    pub fn new(config: &DiffSyncConfig) -> Self {
        let mut controller = Self {
            matcher: LineMatcher::new(&config.matcher),
            scope: config.sync.scope,
            debounce: config.sync.debounce_duration(),
            model: Arc::new(DiffModel::empty()),
            state: SyncState::Dirty,
            hints: EditHints::default(),
            last_edit: None,
            worker: None,
            stats: SyncStats::default(),
        };
        controller.set_background(config.sync.background);
        controller
    }

    /// Applies new settings. The next recompute is full.
    pub fn reconfigure(&mut self, config: &DiffSyncConfig) {
        self.matcher = LineMatcher::new(&config.matcher);
        self.scope = config.sync.scope;
        self.debounce = config.sync.debounce_duration();
        self.set_background(config.sync.background);
        if let Some(worker) = &mut self.worker {
            worker.cancel();
        }
        self.hints.invalidate();
        self.state = SyncState::Dirty;
    }

    fn set_background(&mut self, background: bool) {
        match (background, self.worker.is_some()) {
            (true, false) => match Worker::spawn() {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => tracing::warn!("Recomputing inline: {:#}", e),
            },
            (false, true) => self.worker = None,
            _ => {}
        }
    }

    pub fn matcher(&self) -> &LineMatcher {
        &self.matcher
    }

    pub fn scope(&self) -> RecomputeScope {
        self.scope
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// The installed model, fresh or not.
    pub fn snapshot(&self) -> Arc<DiffModel> {
        Arc::clone(&self.model)
    }

    pub fn is_stale(&self, left: &TextBuffer, right: &TextBuffer) -> bool {
        self.state != SyncState::Idle || self.model.is_stale(left, right)
    }

    pub fn notify(&mut self, side: Side, change: &LineChange) {
        self.notify_at(side, change, Instant::now());
    }

    /// Records an edit made at `now`. A recompute running in the background
    /// is cancelled; its result could only be stale.
    pub fn notify_at(&mut self, side: Side, change: &LineChange, now: Instant) {
        self.hints.record(side, change);
        self.last_edit = Some(now);
        if self.state == SyncState::Recomputing {
            if let Some(worker) = &mut self.worker {
                worker.cancel();
            }
        }
        self.state = SyncState::Dirty;
    }

    /// Render-tick hook. Installs finished background results and starts a
    /// recompute once the debounce interval has passed. Returns `true` when
    /// a new model was installed.
    pub fn tick(&mut self, left: &TextBuffer, right: &TextBuffer, now: Instant) -> bool {
        let current = RevisionPair::of(left, right);
        let mut installed = self.poll(current);

        let settled = self
            .last_edit
            .map_or(true, |at| now.saturating_duration_since(at) >= self.debounce);
        if self.state == SyncState::Dirty && settled {
            if self.submit(left, right) {
                self.state = SyncState::Recomputing;
            } else {
                self.recompute(left, right, false);
                installed = true;
            }
        }
        installed
    }

    /// The model for the buffers' current revisions, recomputing now if
    /// needed.
    pub fn ensure_fresh(&mut self, left: &TextBuffer, right: &TextBuffer) -> Arc<DiffModel> {
        let current = RevisionPair::of(left, right);
        self.poll(current);
        if self.state == SyncState::Idle && !self.model.is_stale_at(current) {
            return self.snapshot();
        }

        if self.state == SyncState::Recomputing {
            let waited = self
                .worker
                .as_mut()
                .filter(|worker| worker.in_flight() == Some(current))
                .and_then(Worker::wait);
            if let Some(result) = waited {
                self.accept(result, current);
                if self.state == SyncState::Idle {
                    return self.snapshot();
                }
            }
        }

        self.recompute(left, right, false)
    }

    /// Recomputes over the whole buffers, ignoring any hints.
    pub fn recompute_full(&mut self, left: &TextBuffer, right: &TextBuffer) -> Arc<DiffModel> {
        self.recompute(left, right, true)
    }

    fn window_for(&self, current: RevisionPair, force_full: bool) -> Option<Window> {
        if force_full || self.scope == RecomputeScope::Full {
            return None;
        }
        self.hints.window(current)
    }

    fn recompute(
        &mut self,
        left: &TextBuffer,
        right: &TextBuffer,
        force_full: bool,
    ) -> Arc<DiffModel> {
        if let Some(worker) = &mut self.worker {
            worker.cancel();
        }
        let current = RevisionPair::of(left, right);
        let scoped = self.window_for(current, force_full);
        let window = scoped.unwrap_or(Window::FULL);

        let started = Instant::now();
        let regions = self
            .matcher
            .match_window(left.all_lines(), right.all_lines(), window, None)
            .unwrap_or_else(|_| fallback_regions(left.line_count(), right.line_count()));
        self.install(
            regions,
            current,
            (left.line_count(), right.line_count()),
            scoped.is_some(),
            window,
            started.elapsed(),
        );
        self.snapshot()
    }

    /// Hands the recompute to the worker. Returns `false` when there is no
    /// worker to take it.
    fn submit(&mut self, left: &TextBuffer, right: &TextBuffer) -> bool {
        let current = RevisionPair::of(left, right);
        let scoped = self.window_for(current, false);
        let Some(worker) = &mut self.worker else {
            return false;
        };
        let job = Job {
            id: worker.next_id(),
            matcher: self.matcher.clone(),
            left: left.all_lines().to_vec(),
            right: right.all_lines().to_vec(),
            window: scoped.unwrap_or(Window::FULL),
            scoped: scoped.is_some(),
            revisions: current,
            cancel: CancelToken::new(),
        };
        tracing::debug!(id = job.id, revisions = %current, "recompute submitted to worker");
        worker.submit(job)
    }

    fn poll(&mut self, current: RevisionPair) -> bool {
        let mut installed = false;
        while let Some((result, is_current)) = self.worker.as_mut().and_then(Worker::try_recv) {
            if is_current {
                installed |= self.accept(result, current);
            } else {
                self.discard(&result, "superseded");
            }
        }
        installed
    }

    /// Installs a worker result if it still describes the buffers.
    fn accept(&mut self, result: JobResult, current: RevisionPair) -> bool {
        if self.state != SyncState::Recomputing {
            self.discard(&result, "edited since submission");
            return false;
        }
        if result.revisions != current {
            self.discard(&result, "revisions moved on");
            self.state = SyncState::Dirty;
            return false;
        }
        let previous = self.model.computed_at().unwrap_or_default();
        if !result.revisions.dominates(&previous) {
            self.discard(&result, "older than installed model");
            return false;
        }
        match result.outcome {
            Ok(regions) => {
                self.install(
                    regions,
                    result.revisions,
                    (result.left_len, result.right_len),
                    result.scoped,
                    result.window,
                    result.elapsed,
                );
                true
            }
            Err(_) => {
                self.stats.discarded_results += 1;
                self.state = SyncState::Dirty;
                false
            }
        }
    }

    fn discard(&mut self, result: &JobResult, reason: &str) {
        self.stats.discarded_results += 1;
        tracing::warn!(
            id = result.id,
            revisions = %result.revisions,
            reason,
            "discarding stale recompute result"
        );
    }

    fn install(
        &mut self,
        regions: Vec<AlignmentRegion>,
        revisions: RevisionPair,
        (left_len, right_len): (usize, usize),
        scoped: bool,
        window: Window,
        elapsed: Duration,
    ) {
        let model = DiffModel::new(regions, revisions, left_len, right_len);
        tracing::debug!(
            scope = if scoped { "scoped" } else { "full" },
            known_prefix = window.known_prefix,
            known_suffix = window.known_suffix,
            regions = model.region_count(),
            elapsed_us = elapsed.as_micros() as u64,
            %revisions,
            "diff model recomputed"
        );

        if scoped {
            self.stats.scoped_recomputes += 1;
            self.stats.lines_reused += (window.known_prefix + window.known_suffix) as u64;
        } else {
            self.stats.full_recomputes += 1;
        }
        self.stats.last_duration = Some(elapsed);

        self.hints.reset(&model);
        self.model = Arc::new(model);
        self.state = SyncState::Idle;
    }
}
