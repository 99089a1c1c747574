// handlers/public/mod.rs - endpoints reachable without a token
pub mod auth;
pub mod system;

pub use auth::{signin, signup};
pub use system::{health, root};
