//! STL Hub
//!
//! A web service for keeping 3D-printing files: every signed-in user gets a private
//! directory tree they can browse, upload to, download from and manage over HTTP.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod storage;
pub mod terminal;

pub use config::ServerConfig;
pub use server::Server;
