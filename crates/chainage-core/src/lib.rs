//! Chainage Core - Domain models, station arithmetic, and configuration
//!
//! This crate contains the core domain types shared by the chainage pipeline:
//! features and their attribute maps, the canonical geometry enum, typed
//! station values, layered configuration, and the error type.

pub mod config;
pub mod error;
pub mod models;

pub use error::{ChainageError, Result};
