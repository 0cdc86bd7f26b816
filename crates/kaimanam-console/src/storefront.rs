//! # Storefront
//!
//! The customer-facing session: a live catalog, the cart, and order
//! submission.
//!
//! ## Submission
//!
//! `submit` turns the cart into `{items, total, createdAt}` and makes exactly
//! one write to the order sink. On success the cart is cleared; on failure it
//! is left exactly as it was so the customer can try again. Taking `&mut self`
//! means a second submission cannot start while one is in flight.

use thiserror::Error;

use kaimanam_client::{OrderSink, StoreError};
use kaimanam_core::{Item, ItemId, Keyed, Order, RecordKey, Timestamp};
use kaimanam_state::{Cart, CatalogView, Reconciliation, ViewState};

/// Errors from placing an order.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("the cart is empty")]
    EmptyCart,
    #[error("failed to place order: {0}")]
    Store(#[from] StoreError),
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// Stored key, when the endpoint reports one.
    pub key: Option<RecordKey>,
    pub order: Order,
}

/// One customer session.
#[derive(Debug)]
pub struct Storefront<S> {
    sink: S,
    cart: Cart,
    catalog: ViewState<CatalogView>,
}

impl<S: OrderSink> Storefront<S> {
    /// A session with an empty cart.
    pub fn new(sink: S) -> Self {
        Self::with_cart(sink, Cart::new())
    }

    /// Resume a session with a previously saved cart.
    pub fn with_cart(sink: S, cart: Cart) -> Self {
        Self {
            sink,
            cart,
            catalog: ViewState::default(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Give up the session, keeping the cart.
    pub fn into_cart(self) -> Cart {
        self.cart
    }

    pub fn catalog(&self) -> &ViewState<CatalogView> {
        &self.catalog
    }

    /// Fold one catalog snapshot (or subscription error) into the session.
    ///
    /// A fresh snapshot also reconciles the cart against it. Returns the
    /// reconciliation report when the cart changed.
    pub fn apply_catalog<E: std::fmt::Display>(
        &mut self,
        outcome: Result<Vec<Keyed<Item>>, E>,
    ) -> Option<Reconciliation> {
        self.catalog.apply(outcome);
        let view = self.catalog.ready()?;
        let report = self.cart.reconcile(view);
        for line in &report.removed {
            tracing::warn!(id = %line.item.id, name = %line.item.name, "item left the catalog; removed from cart");
        }
        if !report.refreshed.is_empty() {
            tracing::info!(count = report.refreshed.len(), "cart lines refreshed from catalog");
        }
        (!report.is_empty()).then_some(report)
    }

    /// Add the catalog item with business id `id` to the cart.
    ///
    /// Returns the line's new count, or `None` when the catalog has no such
    /// item (or has not loaded yet).
    pub fn add(&mut self, id: &ItemId) -> Option<u32> {
        let item = self.catalog.ready()?.get(id)?;
        Some(self.cart.add(item))
    }

    /// Place the cart as an order.
    pub async fn submit(&mut self) -> Result<Confirmation, SubmitError> {
        if self.cart.is_empty() {
            return Err(SubmitError::EmptyCart);
        }
        let order = self.cart.to_order(Some(Timestamp::now()));
        match self.sink.submit_order(&order).await {
            Ok(key) => {
                tracing::info!(
                    key = ?key.as_ref().map(RecordKey::as_str),
                    lines = order.items.len(),
                    total = %order.total,
                    "order placed"
                );
                self.cart.clear();
                Ok(Confirmation { key, order })
            }
            Err(e) => {
                tracing::warn!(error = %e, lines = order.items.len(), "order submission failed; cart kept");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_client::{MemoryBackend, OrderRepository};
    use kaimanam_core::{Category, Money};

    fn item(id: &str, name: &str, units: u32) -> Item {
        Item {
            id: ItemId::from_raw(id),
            name: name.into(),
            amount: Money::from_units(units),
            rating: 4.0,
            category: Category::Lunch,
            description: String::new(),
            image_url: String::new(),
            count: 1,
        }
    }

    fn catalog(items: &[Item]) -> Vec<Keyed<Item>> {
        items
            .iter()
            .enumerate()
            .map(|(i, it)| Keyed::new(RecordKey::new(format!("-K{i}")), it.clone()))
            .collect()
    }

    #[tokio::test]
    async fn submit_writes_once_and_clears_cart() {
        let backend = MemoryBackend::new();
        let mut shop = Storefront::new(backend.clone());
        shop.apply_catalog::<String>(Ok(catalog(&[item("1", "Idli", 50), item("2", "Vada", 30)])));

        shop.add(&ItemId::from_raw("1"));
        shop.add(&ItemId::from_raw("1"));
        shop.add(&ItemId::from_raw("2"));

        let confirmation = shop.submit().await.unwrap();
        assert!(confirmation.key.is_some());
        assert_eq!(confirmation.order.total, Money::from_units(130));
        assert!(confirmation.order.created_at.is_some());
        assert!(shop.cart().is_empty());

        let stored = backend.list_orders().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value.items.len(), 2);
        assert_eq!(stored[0].value.total, Money::from_units(130));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_a_write() {
        let backend = MemoryBackend::new();
        let mut shop = Storefront::new(backend.clone());
        assert!(matches!(shop.submit().await, Err(SubmitError::EmptyCart)));
        assert!(backend.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_submission_keeps_the_cart() {
        let backend = MemoryBackend::new();
        backend.reject_writes("UserData", true);
        let mut shop = Storefront::new(backend.clone());
        shop.apply_catalog::<String>(Ok(catalog(&[item("1", "Idli", 50)])));
        shop.add(&ItemId::from_raw("1"));
        let before = shop.cart().clone();

        let err = shop.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert_eq!(shop.cart(), &before);

        backend.reject_writes("UserData", false);
        assert!(shop.submit().await.is_ok());
        assert!(shop.cart().is_empty());
    }

    #[test]
    fn add_needs_a_loaded_catalog() {
        let mut shop = Storefront::new(MemoryBackend::new());
        assert_eq!(shop.add(&ItemId::from_raw("1")), None);

        shop.apply_catalog::<String>(Ok(catalog(&[item("1", "Idli", 50)])));
        assert_eq!(shop.add(&ItemId::from_raw("1")), Some(1));
        assert_eq!(shop.add(&ItemId::from_raw("1")), Some(2));
        assert_eq!(shop.add(&ItemId::from_raw("9")), None);
    }

    #[test]
    fn catalog_changes_reconcile_the_cart() {
        let mut shop = Storefront::new(MemoryBackend::new());
        shop.apply_catalog::<String>(Ok(catalog(&[item("1", "Idli", 50), item("2", "Vada", 30)])));
        shop.add(&ItemId::from_raw("1"));
        shop.add(&ItemId::from_raw("2"));

        let report = shop
            .apply_catalog::<String>(Ok(catalog(&[item("1", "Idli", 55)])))
            .unwrap();
        assert_eq!(report.refreshed, vec![ItemId::from_raw("1")]);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(shop.cart().total(), Money::from_units(55));

        assert!(shop.apply_catalog::<String>(Err("offline".into())).is_none());
        assert_eq!(shop.catalog().error(), Some("offline"));
        assert_eq!(shop.cart().len(), 1);
    }
}
