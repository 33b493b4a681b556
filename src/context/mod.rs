//! Developer context sampling
//!
//! Snapshots of the local working context and the rule for deciding when a
//! new snapshot is worth remembering.

pub mod change;
pub mod probe;
pub mod sampler;
pub mod snapshot;

pub use change::{has_changed, ChangeDetector};
pub use probe::Probe;
pub use sampler::{ContextSampler, ContextSource};
pub use snapshot::{ContextSnapshot, EnvironmentFlags, VcsInfo};
