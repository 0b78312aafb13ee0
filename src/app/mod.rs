// HTTP layer: axum router over the core services.

pub mod error;
pub mod handlers;
pub mod server;
