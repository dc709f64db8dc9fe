//! The model layer: the simulator contract, fixture catalogs and the
//! name → simulator registry.

pub mod catalog;
pub mod contract;
pub mod registry;

pub use catalog::{Catalog, CatalogEntry};
pub use contract::Model;
pub use registry::{GameKind, Registry};
