//! Type-safe key-value cache for storefront state.
//!
//! Carts are a client-side convenience copy that survives across sessions,
//! keyed by the store they belong to. This crate stores any serde value as
//! JSON, backed by Spin's Key-Value Store when compiled for `wasm32` and by an
//! in-process map everywhere else.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_cache::{cache_key, Cache};
//!
//! let cache = Cache::open_default()?;
//! let key = cache_key!("cart", store_id);
//!
//! cache.set(&key, &cart)?;
//! let cart: Option<Cart> = cache.get(&key)?;
//! cache.delete(&key)?;
//! ```

mod error;
mod kv;

pub use error::CacheError;
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cache_key, Cache, CacheError};
}
