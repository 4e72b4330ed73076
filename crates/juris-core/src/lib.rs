//! Core types shared across Juris crates.

pub mod config;
pub mod error;

pub use config::JurisConfig;
pub use error::{Error, Result};
