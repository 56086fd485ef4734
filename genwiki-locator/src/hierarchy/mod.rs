//! Hierarchy paths and location pages
//!
//! - **path_resolver** - candidate → `DE/TH/Weimar` path, page materialization
//! - **location_store** - page store the resolver writes to

pub mod location_store;
pub mod path_resolver;

pub use location_store::{FileLocationStore, LocationStore};
pub use path_resolver::{leaf_path, to_path, LeafPath, LocationKind, LocationRecord, PathResolver};
