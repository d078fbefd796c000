//! # Cart Repository
//!
//! Snapshot of the cart being sold, stored under `pharmaCart` as the plain
//! array of lines so the counter can resume after a restart.

use pharma_core::{Cart, CartItem};
use tracing::debug;

use super::keys;
use super::kv::KvRepository;
use crate::error::StoreResult;

/// Repository for the cart snapshot.
#[derive(Debug, Clone)]
pub struct CartRepository {
    kv: KvRepository,
}

impl CartRepository {
    pub fn new(kv: KvRepository) -> Self {
        CartRepository { kv }
    }

    /// The saved cart, or an empty one.
    pub async fn load(&self) -> StoreResult<Cart> {
        let items: Vec<CartItem> = self.kv.get(keys::CART).await?.unwrap_or_default();
        debug!(lines = items.len(), "Restored cart snapshot");
        Ok(Cart { items })
    }

    /// Replaces the snapshot. An empty cart removes the key.
    pub async fn save(&self, cart: &Cart) -> StoreResult<()> {
        if cart.is_empty() {
            return self.clear().await;
        }
        self.kv.put(keys::CART, &cart.items).await
    }

    pub async fn clear(&self) -> StoreResult<()> {
        self.kv.delete(keys::CART).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{LocalStore, StoreConfig};
    use pharma_core::{Cart, Medicine, Money};

    fn doliprane() -> Medicine {
        Medicine {
            id: 7,
            code: "6118000041".to_string(),
            name: "DOLIPRANE 1G".to_string(),
            form: "Comprimé".to_string(),
            presentation: "B/8".to_string(),
            ppv: Money::from_cents(1980),
            ph: Money::from_cents(1500),
            quantity: 12,
            expiry: None,
            category: None,
            raw: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_cart_survives_reload() {
        let store = LocalStore::new(StoreConfig::in_memory()).await.unwrap();

        let mut cart = Cart::new();
        cart.add(&doliprane()).unwrap();
        cart.add(&doliprane()).unwrap();
        cart.set_discount(7, 10).unwrap();
        store.cart().save(&cart).await.unwrap();

        let restored = store.cart().load().await.unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.total(), Money::from_cents(3564));
    }

    #[tokio::test]
    async fn test_empty_cart_clears_key() {
        let store = LocalStore::new(StoreConfig::in_memory()).await.unwrap();

        let mut cart = Cart::new();
        cart.add(&doliprane()).unwrap();
        store.cart().save(&cart).await.unwrap();

        cart.clear();
        store.cart().save(&cart).await.unwrap();

        assert!(store.kv().get_raw("pharmaCart").await.unwrap().is_none());
        assert!(store.cart().load().await.unwrap().is_empty());
    }
}
