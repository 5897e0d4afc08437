//! Live snapshot feed

pub mod hub;

pub use hub::serve_ws;
