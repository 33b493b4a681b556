//! Bridge services
//!
//! The write paths (activity sampling, task ingestion) and the read-side
//! facade, all talking to the store through one `MemoryGateway`.

pub mod activity;
pub mod ingest;
pub mod processor;
pub mod query;
pub mod queue;
pub mod task;

pub use activity::{ActivitySyncLoop, SyncOutcome};
pub use ingest::{AppState, SyncResult};
pub use processor::{ProcessReport, TaskUpdateProcessor};
pub use query::QueryFacade;
pub use queue::UpdateQueue;
pub use task::{TaskStatus, TaskUpdate};
