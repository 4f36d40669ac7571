//! Product catalog module.
//!
//! Contains products, variants and the live-catalog collaborator used by
//! cart reconciliation.

mod product;
mod source;

pub use product::{Product, ProductVariant};
pub use source::{CatalogSnapshot, CatalogSource, InMemoryCatalog};
