//! Database context and domain operations.

mod alerts;
mod context;
mod jobs;
mod observations;
mod targets;

pub use alerts::AlertOps;
pub use context::DbContext;
pub use jobs::JobOps;
pub use observations::ObservationOps;
pub use targets::TargetOps;
