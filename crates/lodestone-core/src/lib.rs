//! Lodestone Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the wire-level value objects and configuration layer
//! shared by the Lodestone client and CLI.

pub mod config;
pub mod error;
pub mod models;

pub use error::{LodestoneError, Result};
