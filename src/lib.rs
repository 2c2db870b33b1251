//! Book recommendation engine: vocabulary encoding of reader profiles,
//! similarity ranking over a cached embedding catalog, keep/remove metadata
//! filtering and a 3D genre projection for visualization.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ml;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{ApiError, Result};
