//! Record and failure storage.
//!
//! Records and terminal failures are appended as JSON Lines and flushed per
//! line, so completed work survives a crash later in the run.

mod jsonl;
mod memory;
mod sink;

// Re-export commonly used items
pub use jsonl::JsonlWriter;
pub use memory::{MemoryFailureSink, MemorySink};
pub use sink::{FailureRecord, FailureSink, JsonlFailureSink, JsonlSink, RecordSink};
