//! Read-only HTTP query API over the engine state

pub mod error;
pub mod handlers;
pub mod responses;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use routes::{create_router, AppState};
pub use server::start_server;
