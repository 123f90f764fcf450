pub mod config;
pub mod discovery;
pub mod document;
pub mod formats;
pub mod ingest;
pub mod sink;
pub mod utils;

pub use config::{ConfigError, IndexConfig};
pub use discovery::{Discovery, DiscoveryError, discover_files};
pub use document::{DiscoveredFile, Document, IndexingHints};
pub use formats::{FormatError, ParserVariant};
pub use ingest::{
    IngestError, NoopObserver, ProgressObserver, RunSummary, SchedulerState, TaskOutcome,
    build_index,
};
pub use sink::{IndexSink, MemorySink, SinkError, TantivySink};
