use collection_indexer::document::{DiscoveredFile, IndexingHints};
use collection_indexer::ingest::scheduler::{self, SchedulerOptions};
use collection_indexer::ingest::{ErrorCollector, ProgressObserver, SchedulerState, TaskContext};
use collection_indexer::{MemorySink, ParserVariant};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

#[derive(Default)]
struct StateLog(Mutex<Vec<SchedulerState>>);

impl ProgressObserver for StateLog {
    fn on_progress(&self, state: &SchedulerState) {
        self.0.lock().push(*state);
    }

    fn on_task_completed(&self, _outcome: &collection_indexer::TaskOutcome, state: &SchedulerState) {
        self.0.lock().push(*state);
    }
}

fn missing_files(count: usize) -> Vec<DiscoveredFile> {
    let root = Path::new("/nonexistent/scheduler-props");
    (0..count)
        .map(|i| DiscoveredFile::new(i, root.join(format!("bundle{i}.warc.gz")), root))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn window_is_respected_and_every_file_completes(
        files in 0usize..60,
        workers in 1usize..6,
        extra_capacity in 0usize..8,
    ) {
        let capacity = workers + extra_capacity;
        let ctx = TaskContext::new(IndexingHints::default(), Arc::new(ErrorCollector::new()), false);
        let log = StateLog::default();

        let report = scheduler::run(
            missing_files(files),
            ParserVariant::ClueWeb12,
            Arc::new(MemorySink::new(IndexingHints::default())),
            ctx,
            SchedulerOptions::new(workers, capacity),
            &log,
        )
        .unwrap();

        prop_assert_eq!(report.state.completed, files);
        prop_assert_eq!(report.totals.files_failed, files);

        let states = log.0.lock();
        for state in states.iter() {
            prop_assert!(state.in_flight() <= capacity);
            prop_assert!(state.completed <= state.submitted);
            prop_assert!(state.submitted <= state.total_discovered);
        }
        for pair in states.windows(2) {
            prop_assert!(pair[0].completed <= pair[1].completed);
            prop_assert!(pair[0].submitted <= pair[1].submitted);
        }
    }
}
