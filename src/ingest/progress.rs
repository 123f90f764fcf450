//! Scheduler accounting, progress observation and error collection

use super::task::TaskOutcome;
use crate::utils::constants::MAX_COLLECTED_ERRORS;
use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use imstr::ImString;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::warn;

/// Task counters owned by the scheduler's coordinator
///
/// `completed <= submitted <= total_discovered` holds after every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    pub total_discovered: usize,
    pub submitted: usize,
    pub completed: usize,
}

impl SchedulerState {
    #[must_use]
    pub fn new(total_discovered: usize) -> Self {
        Self {
            total_discovered,
            submitted: 0,
            completed: 0,
        }
    }

    /// Submitted tasks that have not completed yet
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.submitted - self.completed
    }

    #[inline]
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.total_discovered - self.submitted
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed == self.total_discovered
    }

    /// Completion percentage; an empty run counts as complete
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.total_discovered == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total_discovered as f64
        }
    }

    pub(crate) fn record_submitted(&mut self) {
        debug_assert!(self.submitted < self.total_discovered);
        self.submitted += 1;
    }

    pub(crate) fn record_completed(&mut self) {
        debug_assert!(self.completed < self.submitted);
        self.completed += 1;
    }
}

/// Receives scheduler events on the coordinator thread
///
/// Both methods default to doing nothing.
pub trait ProgressObserver {
    /// Called after every top-up of the in-flight window
    fn on_progress(&self, _state: &SchedulerState) {}

    /// Called once per finished task, after the counters were updated
    fn on_task_completed(&self, _outcome: &TaskOutcome, _state: &SchedulerState) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Writes `./<parent>/<file>\t<documents indexed>` for every finished task
///
/// The first failed write is logged and all further lines are dropped, so a
/// closed pipe does not produce one warning per file.
pub struct LineObserver<W: Write> {
    out: Mutex<W>,
    suppressed: AtomicBool,
}

impl<W: Write> LineObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            suppressed: AtomicBool::new(false),
        }
    }

    /// True once a write has failed
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::Relaxed)
    }
}

impl<W: Write> ProgressObserver for LineObserver<W> {
    fn on_task_completed(&self, outcome: &TaskOutcome, _state: &SchedulerState) {
        if self.is_suppressed() {
            return;
        }
        let mut out = self.out.lock();
        let written = writeln!(
            out,
            "{}\t{}",
            outcome.file.progress_label(),
            outcome.documents_indexed
        )
        .and_then(|()| out.flush());
        if let Err(e) = written {
            self.suppressed.store(true, Ordering::Relaxed);
            warn!(error = %e, "Failed to write progress line, suppressing further lines");
        }
    }
}

/// One retained per-file error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectedError {
    /// Path relative to the input root
    pub file: String,
    pub category: &'static str,
    pub message: String,
}

/// Error collector with lock-free structures for concurrent access
///
/// - `SegQueue` for error storage (lock-free concurrent push)
/// - `DashMap` for per-category counts
/// - `AtomicUsize` slot reservation and overflow tracking
pub struct ErrorCollector {
    errors: SegQueue<(ImString, &'static str, ImString)>,
    max_errors: usize,
    reserved: AtomicUsize,
    overflow_count: AtomicUsize,
    error_counts: DashMap<&'static str, AtomicUsize>,
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCollector {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_COLLECTED_ERRORS)
    }

    #[must_use]
    pub fn with_capacity(max_errors: usize) -> Self {
        Self {
            errors: SegQueue::new(),
            max_errors,
            reserved: AtomicUsize::new(0),
            overflow_count: AtomicUsize::new(0),
            error_counts: DashMap::new(),
        }
    }

    /// Record one error for `file`; every error is counted, only the first
    /// `max_errors` are kept
    pub fn push(&self, file: ImString, category: &'static str, message: impl Into<ImString>) {
        self.error_counts
            .entry(category)
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);

        if self.reserved.fetch_add(1, Ordering::Relaxed) < self.max_errors {
            self.errors.push((file, category, message.into()));
        } else {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total errors recorded, retained or not
    #[must_use]
    pub fn total(&self) -> usize {
        self.error_counts
            .iter()
            .map(|entry| entry.value().load(Ordering::Relaxed))
            .sum()
    }

    #[must_use]
    pub fn overflow(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Counts per category, ordered by category name
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.error_counts
            .iter()
            .map(|entry| ((*entry.key()).to_string(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }

    /// Copy of the retained errors, in the order they were recorded
    ///
    /// Drains and re-pushes the queue; errors pushed concurrently may or may
    /// not be included.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CollectedError> {
        let mut retained = Vec::with_capacity(self.errors.len());
        while let Some(error) = self.errors.pop() {
            retained.push(error);
        }
        let snapshot = retained
            .iter()
            .map(|(file, category, message)| CollectedError {
                file: file.to_string(),
                category,
                message: message.to_string(),
            })
            .collect();
        for error in retained {
            self.errors.push(error);
        }
        snapshot
    }
}
