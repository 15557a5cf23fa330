//! Shared types and rules for the Agri Supply Chain platform
//!
//! This crate contains the pure batch lifecycle vocabulary shared between the
//! backend, the browser client (via WASM), and other components of the system.
//! Nothing in here performs I/O.

pub mod error;
pub mod models;
pub mod pricing;
pub mod transition;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use pricing::*;
pub use transition::*;
pub use types::*;
pub use validation::*;

#[doc(hidden)]
pub use serde_json as __serde_json;
