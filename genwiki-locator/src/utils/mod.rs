//! Utility modules for genwiki-locator

pub mod retry;

pub use retry::retry_transient;
