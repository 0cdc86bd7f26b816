//! # Order Desk
//!
//! The admin view of placed orders: a live board, deletion behind a
//! confirmation, inline edits, and receipts.
//!
//! ## Edits
//!
//! An edit session starts from a point read, so it knows the version the
//! order was read at. Saving writes the whole line list and the recomputed
//! total back conditionally on that version; if someone else changed the
//! order in between, the save fails with a conflict and nothing is written.

use kaimanam_client::{OrderRepository, StoreError, Subscription};
use kaimanam_core::{Keyed, Order, RecordKey, Version};
use kaimanam_state::{OrderBoard, OrderEditor, ViewState};

use crate::error::AdminError;
use crate::receipt::{Receipt, ShopProfile};

/// An order under edit.
#[derive(Debug, Clone)]
pub struct EditSession {
    key: RecordKey,
    version: Option<Version>,
    editor: OrderEditor,
}

impl EditSession {
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn editor(&self) -> &OrderEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut OrderEditor {
        &mut self.editor
    }
}

/// What a save did.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The edited order was written.
    Saved {
        order: Order,
        version: Option<Version>,
    },
    /// Nothing changed, so nothing was written.
    Unchanged,
}

/// Admin access to placed orders.
#[derive(Debug)]
pub struct OrderDesk<R> {
    orders: R,
    profile: ShopProfile,
    board: ViewState<OrderBoard>,
}

impl<R: OrderRepository> OrderDesk<R> {
    pub fn new(orders: R, profile: ShopProfile) -> Self {
        Self {
            orders,
            profile,
            board: ViewState::default(),
        }
    }

    pub fn board(&self) -> &ViewState<OrderBoard> {
        &self.board
    }

    pub fn profile(&self) -> &ShopProfile {
        &self.profile
    }

    /// Open a live feed of the `UserData` collection.
    pub async fn subscribe(&self) -> Result<Subscription<Order>, StoreError> {
        self.orders.subscribe_orders().await
    }

    /// Replace the board with one subscription outcome.
    pub fn apply<E: std::fmt::Display>(&mut self, outcome: Result<Vec<Keyed<Order>>, E>) {
        self.board.apply(outcome);
        if let Some(board) = self.board.ready() {
            for order in board.inconsistent() {
                tracing::warn!(
                    key = %order.key,
                    stored = %order.value.total,
                    computed = %order.value.line_sum(),
                    "order total disagrees with its lines"
                );
            }
        }
    }

    /// Load the board once, without subscribing.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        match self.orders.list_orders().await {
            Ok(records) => {
                self.apply::<StoreError>(Ok(records));
                Ok(())
            }
            Err(e) => {
                self.board = ViewState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Delete the order at `key` once `confirm` agrees.
    ///
    /// `confirm` sees the key and, when the board has it, the order. Returns
    /// `false` when the deletion was declined; nothing is written then.
    pub async fn delete<F>(&self, key: &RecordKey, confirm: F) -> Result<bool, AdminError>
    where
        F: FnOnce(&RecordKey, Option<&Order>) -> bool,
    {
        let shown = self.board.ready().and_then(|b| b.get(key));
        if !confirm(key, shown) {
            tracing::info!(key = %key, "order deletion declined");
            return Ok(false);
        }
        self.orders.delete_order(key).await?;
        tracing::info!(key = %key, "order deleted");
        Ok(true)
    }

    /// Start editing the order at `key`.
    pub async fn begin_edit(&self, key: &RecordKey) -> Result<EditSession, AdminError> {
        let read = self
            .orders
            .get_order(key)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                what: format!("order {key}"),
            })?;
        Ok(EditSession {
            key: read.record.key,
            version: read.version,
            editor: OrderEditor::new(read.record.value),
        })
    }

    /// Write an edit session back.
    pub async fn save(&self, session: EditSession) -> Result<SaveOutcome, AdminError> {
        if !session.editor.is_dirty() {
            tracing::debug!(key = %session.key, "order unchanged; nothing to save");
            return Ok(SaveOutcome::Unchanged);
        }
        let order = session.editor.finish();
        let version = self
            .orders
            .update_order(&session.key, &order, session.version.as_ref())
            .await?;
        tracing::info!(
            key = %session.key,
            lines = order.items.len(),
            total = %order.total,
            "order updated"
        );
        Ok(SaveOutcome::Saved { order, version })
    }

    /// Read the order at `key` and hand it to `render` with its receipt.
    pub async fn receipt<T>(
        &self,
        key: &RecordKey,
        render: impl FnOnce(&Receipt<'_>) -> T,
    ) -> Result<T, AdminError> {
        let read = self
            .orders
            .get_order(key)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                what: format!("order {key}"),
            })?;
        let receipt = Receipt::new(&self.profile, read.key(), read.value());
        Ok(render(&receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_client::{MemoryBackend, OrderSink};
    use kaimanam_core::{ItemId, Money, OrderLine, Timestamp};

    fn order() -> Order {
        Order::new(
            vec![
                OrderLine {
                    id: ItemId::from_raw("1"),
                    name: "Idli".into(),
                    rate: Money::from_units(50),
                    count: 2,
                },
                OrderLine {
                    id: ItemId::from_raw("2"),
                    name: "Vada".into(),
                    rate: Money::from_units(30),
                    count: 1,
                },
            ],
            Some(Timestamp::parse("2026-10-19T09:00:00Z").unwrap()),
        )
    }

    async fn seeded() -> (MemoryBackend, RecordKey) {
        let backend = MemoryBackend::new();
        let key = backend.submit_order(&order()).await.unwrap().unwrap();
        (backend, key)
    }

    #[tokio::test]
    async fn declined_delete_writes_nothing() {
        let (backend, key) = seeded().await;
        let desk = OrderDesk::new(backend.clone(), ShopProfile::default());

        assert!(!desk.delete(&key, |_, _| false).await.unwrap());
        assert_eq!(backend.list_orders().await.unwrap().len(), 1);

        assert!(desk.delete(&key, |_, _| true).await.unwrap());
        assert!(backend.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirm_sees_the_boarded_order() {
        let (backend, key) = seeded().await;
        let mut desk = OrderDesk::new(backend.clone(), ShopProfile::default());
        desk.refresh().await.unwrap();

        let mut seen_total = None;
        desk.delete(&key, |_, order| {
            seen_total = order.map(|o| o.total);
            false
        })
        .await
        .unwrap();
        assert_eq!(seen_total, Some(Money::from_units(130)));
    }

    #[tokio::test]
    async fn edit_recomputes_total_and_keeps_timestamp() {
        let (backend, key) = seeded().await;
        let desk = OrderDesk::new(backend.clone(), ShopProfile::default());

        let mut session = desk.begin_edit(&key).await.unwrap();
        session.editor_mut().set_count(1, 3).unwrap();
        session.editor_mut().remove_line(0).unwrap();
        let outcome = desk.save(session).await.unwrap();

        let SaveOutcome::Saved { order, .. } = outcome else {
            panic!("expected a write");
        };
        assert_eq!(order.total, Money::from_units(90));

        let stored = backend.get_order(&key).await.unwrap().unwrap();
        assert_eq!(stored.value(), &order);
        assert!(stored.value().created_at.is_some());
    }

    #[tokio::test]
    async fn untouched_edit_is_not_written() {
        let (backend, key) = seeded().await;
        let desk = OrderDesk::new(backend.clone(), ShopProfile::default());
        let before = backend.get_order(&key).await.unwrap().unwrap().version;

        let session = desk.begin_edit(&key).await.unwrap();
        assert_eq!(desk.save(session).await.unwrap(), SaveOutcome::Unchanged);
        let after = backend.get_order(&key).await.unwrap().unwrap().version;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn concurrent_edit_conflicts() {
        let (backend, key) = seeded().await;
        let desk = OrderDesk::new(backend.clone(), ShopProfile::default());

        let mut mine = desk.begin_edit(&key).await.unwrap();
        let mut theirs = desk.begin_edit(&key).await.unwrap();
        theirs.editor_mut().increase(0).unwrap();
        desk.save(theirs).await.unwrap();

        mine.editor_mut().decrease(0).unwrap();
        let err = desk.save(mine).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = backend.get_order(&key).await.unwrap().unwrap();
        assert_eq!(stored.value().items[0].count, 3);
    }

    #[tokio::test]
    async fn editing_missing_order_is_not_found() {
        let backend = MemoryBackend::new();
        let desk = OrderDesk::new(backend, ShopProfile::default());
        let err = desk.begin_edit(&RecordKey::new("-nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn receipt_renders_stored_order() {
        let (backend, key) = seeded().await;
        let desk = OrderDesk::new(backend, ShopProfile::default());
        let text = desk.receipt(&key, |r| r.to_text()).await.unwrap();
        assert!(text.contains("Idli"));
        assert!(text.contains("Total: ₹130"));
    }

    #[tokio::test]
    async fn board_follows_subscription() {
        let (backend, key) = seeded().await;
        let mut desk = OrderDesk::new(backend.clone(), ShopProfile::default());
        let mut sub = desk.subscribe().await.unwrap();

        let first = sub.next().await.unwrap().map(|s| s.records);
        desk.apply(first);
        assert_eq!(desk.board().ready().unwrap().len(), 1);

        backend.delete_order(&key).await.unwrap();
        let second = sub.next().await.unwrap().map(|s| s.records);
        desk.apply(second);
        assert!(desk.board().ready().unwrap().is_empty());
    }
}
