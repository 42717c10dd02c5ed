pub mod auth;
pub mod resource;

pub use auth::*;
pub use resource::{AuthRequirement, Resource};
