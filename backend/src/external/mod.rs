//! External API integrations

pub mod artifact;

pub use artifact::{trace_url, ArtifactGenerator, HttpArtifactClient};
