//! Domain models for the Agri Supply Chain platform

mod batch;
mod event;
mod inspection;
mod listing;
mod split;
mod stakeholder;
mod transport;

pub use batch::*;
pub use event::*;
pub use inspection::*;
pub use listing::*;
pub use split::*;
pub use stakeholder::*;
pub use transport::*;
