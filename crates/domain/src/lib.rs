pub mod entities;
pub mod errors;
pub mod events;
pub mod messages;

pub use entities::*;
pub use errors::{HubError, HubResult};
pub use events::*;
pub use messages::*;
