//! HTTP handlers

pub mod batch;
pub mod health;
pub mod profile;
pub mod traceability;
pub mod transport;

pub use batch::*;
pub use health::health_check;
pub use profile::*;
pub use traceability::get_traceability_view;
pub use transport::*;
