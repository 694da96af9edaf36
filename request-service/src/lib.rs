//! HTTP front end for the service desk.
//!
//! Validates input, checks the API key on mutating routes and maps
//! [`servicedesk_core::DeskError`] onto status codes. All request semantics
//! live in `servicedesk-core`.

pub mod api;
pub mod auth;
pub mod config;
pub mod validation;

pub use api::AppState;
pub use api::router;
pub use api::serve;
pub use config::ConfigLoader;
pub use config::ServiceConfig;
