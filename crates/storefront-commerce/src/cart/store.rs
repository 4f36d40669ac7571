//! Cart persistence keyed by store context.

use crate::cart::Cart;
use crate::error::CommerceError;
use crate::ids::StoreId;
use storefront_cache::{cache_key, Cache};

/// Persists one cart per store in the key-value cache.
pub struct CartStore {
    cache: Cache,
}

impl CartStore {
    /// Use the default key-value store.
    pub fn open_default() -> Result<Self, CommerceError> {
        Ok(Self {
            cache: Cache::open_default()?,
        })
    }

    /// Use a named key-value store.
    pub fn open(name: &str) -> Result<Self, CommerceError> {
        Ok(Self {
            cache: Cache::open(name)?,
        })
    }

    /// Load the cart for a store, if one was saved.
    pub fn load(&self, store_id: &StoreId) -> Result<Option<Cart>, CommerceError> {
        Ok(self.cache.get(&Self::key(store_id))?)
    }

    /// Load the cart for a store, or start an empty one.
    pub fn load_or_new(&self, store_id: &StoreId) -> Result<Cart, CommerceError> {
        Ok(self
            .load(store_id)?
            .unwrap_or_else(|| Cart::new(store_id.clone())))
    }

    /// Save a cart under its store.
    pub fn save(&self, cart: &Cart) -> Result<(), CommerceError> {
        self.cache.set(&Self::key(&cart.store_id), cart)?;
        tracing::debug!(store = %cart.store_id, lines = cart.lines.len(), "cart saved");
        Ok(())
    }

    /// Remove the saved cart for a store, e.g. after checkout.
    pub fn clear(&self, store_id: &StoreId) -> Result<(), CommerceError> {
        self.cache.delete(&Self::key(store_id))?;
        Ok(())
    }

    fn key(store_id: &StoreId) -> String {
        cache_key!("cart", store_id)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use rust_decimal_macros::dec;

    #[test]
    fn test_save_and_load_per_store() {
        let store = CartStore::open("cart-store-test").unwrap();
        let mut cart = Cart::new("store-a");
        cart.add_line(CartLine::new("mug", "Mug", dec!(12.345), 2)).unwrap();
        store.save(&cart).unwrap();

        let loaded = store.load(&StoreId::new("store-a")).unwrap();
        assert_eq!(loaded, Some(cart));

        let other = store.load_or_new(&StoreId::new("store-b")).unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_clear_removes_cart() {
        let store = CartStore::open("cart-store-clear").unwrap();
        let cart = Cart::new("store-c");
        store.save(&cart).unwrap();
        store.clear(&cart.store_id).unwrap();

        assert_eq!(store.load(&cart.store_id).unwrap(), None);
    }
}
