//! HTTP API of the Qynnovel publishing backend.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use error::{ApiError, ApiResult};
pub use routes::{cors_layer, router};
pub use state::{AppState, bootstrap};
