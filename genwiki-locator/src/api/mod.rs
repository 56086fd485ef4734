//! HTTP API handlers for genwiki-locator

pub mod health;
pub mod locate;

pub use health::health_routes;
pub use locate::locate_routes;
