//! Evidence validation
//!
//! Validators take an evidence map and return a new, possibly smaller one.

pub mod geo_validator;

pub use geo_validator::GeoValidator;
