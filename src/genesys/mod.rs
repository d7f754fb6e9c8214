pub mod api;
pub mod auth;
pub mod environment;
pub mod error;
pub mod models;

pub use api::GenesysClient;
pub use auth::{authenticate, AccessToken, Credentials};
pub use environment::{Endpoints, Environment, Routing, KNOWN_ENVIRONMENTS};
pub use error::DashError;
