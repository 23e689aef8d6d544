//! # Deskwise Gateway
//!
//! HTTP surface of the assistant engine: the public `/api/v1/ask` endpoint
//! plus the pairing-protected admin surface (reload, metrics, sessions).
//! Routing and state wiring live in `server`, handlers in `routes`.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
