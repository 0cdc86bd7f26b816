//! # Snapshot Views
//!
//! A live subscription delivers full snapshots of a collection. Each view
//! here is rebuilt from one snapshot; applying the next snapshot replaces
//! the view wholesale, there is no incremental diffing.
//!
//! ```text
//! Loading ──snapshot──▶ Ready(view) ──snapshot──▶ Ready(view')
//!    │                      │
//!    └──────error──────▶ Failed(msg) ──snapshot──▶ Ready(view)
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;

use kaimanam_core::{Category, Item, ItemId, Keyed, Order, RecordKey};

/// A view model built from one full snapshot of a collection.
pub trait SnapshotView: Sized {
    /// Record type of the collection.
    type Record;

    /// Build the view from every record in a snapshot, in key order.
    fn from_records(records: Vec<Keyed<Self::Record>>) -> Self;
}

/// Load status of one screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<V> {
    /// No snapshot has arrived yet.
    Loading,
    /// The most recent snapshot.
    Ready(V),
    /// The subscription reported an error.
    Failed(String),
}

impl<V> Default for ViewState<V> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<V: SnapshotView> ViewState<V> {
    /// Fold one subscription outcome into the state.
    pub fn apply<E: Display>(&mut self, outcome: Result<Vec<Keyed<V::Record>>, E>) {
        *self = match outcome {
            Ok(records) => Self::Ready(V::from_records(records)),
            Err(e) => Self::Failed(e.to_string()),
        };
    }
}

impl<V> ViewState<V> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The view, once a snapshot has been applied.
    pub fn ready(&self) -> Option<&V> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    /// The error message, if the last outcome was a failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

// ─── Catalog ─────────────────────────────────────────────────────────

/// The catalog as of one snapshot of the `items` collection.
///
/// Items are listed in key order. Lookup is by business id; when two
/// records share an id the first in key order wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogView {
    items: Vec<Keyed<Item>>,
    by_id: BTreeMap<ItemId, usize>,
}

impl CatalogView {
    /// Every item in key order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().map(|k| &k.value)
    }

    /// Every record with its key.
    pub fn records(&self) -> &[Keyed<Item>] {
        &self.items
    }

    /// Items in `category`, or all items for `None`.
    pub fn filtered(&self, category: Option<Category>) -> Vec<&Item> {
        self.items().filter(|i| i.in_category(category)).collect()
    }

    /// Look up an item by business id.
    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.by_id.get(id).map(|&i| &self.items[i].value)
    }

    /// The record key of the item with business id `id`.
    pub fn key_of(&self, id: &ItemId) -> Option<&RecordKey> {
        self.by_id.get(id).map(|&i| &self.items[i].key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SnapshotView for CatalogView {
    type Record = Item;

    fn from_records(records: Vec<Keyed<Item>>) -> Self {
        let mut by_id = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            by_id.entry(record.value.id.clone()).or_insert(i);
        }
        Self {
            items: records,
            by_id,
        }
    }
}

// ─── Orders ──────────────────────────────────────────────────────────

/// The order desk as of one snapshot of the `UserData` collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBoard {
    orders: Vec<Keyed<Order>>,
}

impl OrderBoard {
    /// Orders in key order, which is placement order for pushed records.
    pub fn orders(&self) -> &[Keyed<Order>] {
        &self.orders
    }

    /// Look up an order by its record key.
    pub fn get(&self, key: &RecordKey) -> Option<&Order> {
        self.orders.iter().find(|o| &o.key == key).map(|o| &o.value)
    }

    /// Orders whose stored total disagrees with their lines.
    pub fn inconsistent(&self) -> impl Iterator<Item = &Keyed<Order>> {
        self.orders.iter().filter(|o| !o.value.is_consistent())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl SnapshotView for OrderBoard {
    type Record = Order;

    fn from_records(orders: Vec<Keyed<Order>>) -> Self {
        Self { orders }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_core::{Money, OrderLine};

    fn item(key: &str, id: &str, category: Category) -> Keyed<Item> {
        Keyed::new(
            RecordKey::new(key),
            Item {
                id: ItemId::from_raw(id),
                name: format!("item-{id}"),
                amount: Money::from_units(10),
                rating: 0.0,
                category,
                description: String::new(),
                image_url: String::new(),
                count: 1,
            },
        )
    }

    #[test]
    fn catalog_lookup_and_filter() {
        let view = CatalogView::from_records(vec![
            item("-A", "1", Category::Breakfast),
            item("-B", "2", Category::Dinner),
            item("-C", "3", Category::Breakfast),
        ]);
        assert_eq!(view.len(), 3);
        assert_eq!(view.filtered(Some(Category::Breakfast)).len(), 2);
        assert_eq!(view.filtered(None).len(), 3);
        assert_eq!(view.key_of(&ItemId::from_raw("2")).unwrap().as_str(), "-B");
        assert!(view.get(&ItemId::from_raw("9")).is_none());
    }

    #[test]
    fn duplicate_business_ids_resolve_to_first_record() {
        let view = CatalogView::from_records(vec![
            item("-A", "1", Category::Lunch),
            item("-B", "1", Category::Snack),
        ]);
        assert_eq!(view.key_of(&ItemId::from_raw("1")).unwrap().as_str(), "-A");
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn snapshots_replace_the_view() {
        let mut state: ViewState<CatalogView> = ViewState::default();
        assert!(state.is_loading());

        state.apply::<String>(Ok(vec![
            item("-A", "1", Category::Lunch),
            item("-B", "2", Category::Lunch),
        ]));
        assert_eq!(state.ready().unwrap().len(), 2);

        state.apply::<String>(Ok(vec![item("-C", "3", Category::Lunch)]));
        let view = state.ready().unwrap();
        assert_eq!(view.len(), 1);
        assert!(view.get(&ItemId::from_raw("1")).is_none());
    }

    #[test]
    fn failure_then_recovery() {
        let mut state: ViewState<OrderBoard> = ViewState::default();
        state.apply(Err("Failed to fetch orders."));
        assert_eq!(state.error(), Some("Failed to fetch orders."));
        assert!(state.ready().is_none());

        state.apply::<String>(Ok(Vec::new()));
        assert!(state.ready().unwrap().is_empty());
    }

    #[test]
    fn order_board_flags_inconsistent_totals() {
        let good = Order::new(
            vec![OrderLine {
                id: ItemId::from_raw("1"),
                name: "a".into(),
                rate: Money::from_units(10),
                count: 2,
            }],
            None,
        );
        let mut bad = good.clone();
        bad.total = Money::from_units(5);
        let board = OrderBoard::from_records(vec![
            Keyed::new(RecordKey::new("-1"), good),
            Keyed::new(RecordKey::new("-2"), bad),
        ]);
        let flagged: Vec<_> = board.inconsistent().map(|o| o.key.as_str()).collect();
        assert_eq!(flagged, vec!["-2"]);
        assert!(board.get(&RecordKey::new("-1")).is_some());
    }
}
