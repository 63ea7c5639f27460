//! HTTP server
//!
//! Binds the listener, builds the shared state and routes requests to the handlers.

pub mod core;
pub mod handlers;
pub mod routes;
pub mod state;

pub use self::core::Server;
pub use routes::build_router;
pub use state::AppState;
