//! Business logic services for the Agri Supply Chain platform

pub mod event_log;
pub mod lifecycle;
pub mod pricing;
pub mod profile;
pub mod traceability;

pub use lifecycle::LifecycleService;
pub use profile::ProfileService;
pub use traceability::TraceabilityService;
