//! Core domain models
//!
//! Configuration, the shared pipeline environment and step run records.

pub mod config;
pub mod environment;
pub mod state;

pub use environment::*;
pub use state::*;
