//! Core module - configuration, state, server lifecycle and errors
//!
//! - [`Config`] - environment configuration
//! - [`ServerState`] - shared handler state
//! - [`Server`] - loopback HTTP server
//! - [`ServerError`] - lifecycle errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::{MAX_BODY_BYTES, Server, build_app};
pub use state::ServerState;
