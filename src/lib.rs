//! Filecab - A physical records cabinet inventory system
//!
//! This crate provides the cabinet layout engine, the placement resolver and
//! the location formatter behind the Filecab inventory, together with the
//! record store, HTTP API and live snapshot feed that serve them.

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod grid;
pub mod handlers;
pub mod layout;
pub mod location;
pub mod middleware;
pub mod placement;
pub mod routes;
pub mod state;
pub mod store;
pub mod ws;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
