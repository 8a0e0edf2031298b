//! # Session Store
//!
//! In-process, session-scoped cart storage.
//!
//! ## Thread Safety
//! Carts live in an `Arc<Mutex<HashMap>>` because:
//! 1. Operations from many sessions run concurrently
//! 2. Only one operation should touch a given cart at a time
//! 3. Cart data is single-user; last-write-wins per session is acceptable.
//!    Only the checkout-versus-stock interaction is safety-critical, and
//!    that lives in the database transaction, not here.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create() ──► session id (UUID v4)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  with_cart_mut(id, f) ──► cart created lazily on first mutation         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  export(id) / import(id, json) ──► wire format round trip               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  destroy(id) ──► session ends, cart destroyed                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use souk_core::Cart;

/// In-memory session-scoped cart store.
///
/// Cart persistence beyond a single session store is out of scope; a
/// process restart starts everyone with empty carts.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    carts: Arc<Mutex<HashMap<String, Cart>>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        SessionStore {
            carts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Allocates a fresh session id. No cart exists until the first
    /// mutation touches it.
    pub fn create(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Executes a function with read access to the session's cart.
    ///
    /// A session with no cart yet reads as an empty cart; nothing is
    /// created as a side effect of reading.
    pub fn with_cart<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let carts = self.carts.lock().expect("session store mutex poisoned");
        match carts.get(session_id) {
            Some(cart) => f(cart),
            None => f(&Cart::new()),
        }
    }

    /// Executes a function with write access to the session's cart,
    /// creating the cart lazily.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let qty = sessions.with_cart_mut(&sid, |c| c.add(&product, buyer, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut carts = self.carts.lock().expect("session store mutex poisoned");
        let cart = carts
            .entry(session_id.to_string())
            .or_insert_with(Cart::new);
        f(cart)
    }

    /// Observes cart expiry for a session at `now`.
    ///
    /// Touches only an existing cart (reading a session that never
    /// mutated must not create one). Returns `true` when the cart was
    /// stale: it has been cleared and its timestamp reset, and the caller
    /// should surface `CartExpired` exactly once.
    pub fn expire_if_stale(&self, session_id: &str, now: chrono::DateTime<chrono::Utc>) -> bool {
        let mut carts = self.carts.lock().expect("session store mutex poisoned");
        carts
            .get_mut(session_id)
            .map(|cart| cart.expire_if_stale(now))
            .unwrap_or(false)
    }

    /// Destroys a session's cart (session end).
    pub fn destroy(&self, session_id: &str) {
        let mut carts = self.carts.lock().expect("session store mutex poisoned");
        carts.remove(session_id);
    }

    /// Serializes a session's cart to the wire format:
    /// `{"cart": {"<id>": qty}, "cart_created_at": "<ISO-8601>"}`.
    ///
    /// Returns `None` when the session has no cart.
    pub fn export(&self, session_id: &str) -> Option<String> {
        let carts = self.carts.lock().expect("session store mutex poisoned");
        carts
            .get(session_id)
            .map(|cart| serde_json::to_string(cart).expect("cart wire format is serializable"))
    }

    /// Replaces a session's cart from the wire format.
    pub fn import(&self, session_id: &str, json: &str) -> Result<(), serde_json::Error> {
        let cart: Cart = serde_json::from_str(json)?;
        let mut carts = self.carts.lock().expect("session store mutex poisoned");
        carts.insert(session_id.to_string(), cart);
        Ok(())
    }

    /// Number of live session carts (diagnostics).
    pub fn len(&self) -> usize {
        self.carts.lock().expect("session store mutex poisoned").len()
    }

    /// True when no session carts exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use souk_core::Product;

    fn test_product(id: i64) -> Product {
        Product {
            id,
            owner_id: 900,
            name: format!("Product {}", id),
            price: "10.00".parse().unwrap(),
            stock: 10,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reading_does_not_create_a_cart() {
        let store = SessionStore::new();
        let sid = store.create();

        let empty = store.with_cart(&sid, |c| c.is_empty());
        assert!(empty);
        assert!(store.is_empty());
    }

    #[test]
    fn test_mutation_creates_cart_lazily() {
        let store = SessionStore::new();
        let sid = store.create();

        store
            .with_cart_mut(&sid, |c| c.add(&test_product(7), 1, 2))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.with_cart(&sid, |c| c.quantity(7)), Some(2));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();

        store
            .with_cart_mut(&a, |c| c.add(&test_product(7), 1, 1))
            .unwrap();

        assert_eq!(store.with_cart(&a, |c| c.total_units()), 1);
        assert_eq!(store.with_cart(&b, |c| c.total_units()), 0);

        store.destroy(&a);
        assert_eq!(store.with_cart(&a, |c| c.total_units()), 0);
    }

    #[test]
    fn test_export_import_round_trip() {
        let store = SessionStore::new();
        let sid = store.create();

        assert!(store.export(&sid).is_none());

        store
            .with_cart_mut(&sid, |c| c.add(&test_product(42), 1, 3))
            .unwrap();

        let json = store.export(&sid).unwrap();
        assert!(json.contains("\"cart\""));
        assert!(json.contains("\"42\":3"));
        assert!(json.contains("\"cart_created_at\""));

        let other = store.create();
        store.import(&other, &json).unwrap();
        assert_eq!(store.with_cart(&other, |c| c.quantity(42)), Some(3));

        assert!(store.import(&other, "{not json").is_err());
    }
}
