//! Recall Bridge
//!
//! Feeds a remote long-term memory store with what a developer is doing:
//! - Periodic working-context snapshots, stored only when they change
//! - Task updates from the project tracker, fanned out into searchable records
//! - Read-side context and task history for editors and the HTTP API

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod services;
pub mod tools;
pub mod utils;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use memory::{MemoryGateway, MemoryStore};
pub use services::{ActivitySyncLoop, QueryFacade, TaskUpdateProcessor, UpdateQueue};
