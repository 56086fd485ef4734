//! # GenWiki Common Library
//!
//! Shared code for the GenWiki tools including:
//! - Common error and result types
//! - TOML configuration resolution, loading and writing
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
