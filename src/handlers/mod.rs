//! Request handlers module

pub mod auth;
pub mod cabinet;
pub mod config;
pub mod file_type;
pub mod item;
pub mod label;
