//! # Orders
//!
//! An [`Order`] is a submitted cart snapshot stored in the `UserData`
//! collection: the ordered line list, the client-computed total, and the
//! submission time.
//!
//! The total is always computed on the client. Records written by other
//! clients may carry a total that no longer matches their lines;
//! [`Order::is_consistent`] reports that drift without correcting it.

use serde::{Deserialize, Serialize};

use crate::identity::ItemId;
use crate::lenient;
use crate::money::Money;
use crate::record::Record;
use crate::temporal::Timestamp;
use crate::ORDERS_COLLECTION;

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Business id of the ordered item.
    pub id: ItemId,
    pub name: String,
    /// Unit price at the time the order was placed.
    pub rate: Money,
    #[serde(
        default = "lenient::default_count",
        deserialize_with = "lenient::unsigned"
    )]
    pub count: u32,
}

impl OrderLine {
    /// `rate × count`.
    pub fn amount(&self) -> Money {
        self.rate.times(self.count)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// The database drops empty arrays, so an order whose lines were all
    /// removed comes back without this field.
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Order {
    /// Build an order from its lines, computing the total.
    pub fn new(items: Vec<OrderLine>, created_at: Option<Timestamp>) -> Self {
        let total = sum_lines(&items);
        Self {
            items,
            total,
            created_at,
        }
    }

    /// Σ `rate × count` over the lines.
    pub fn line_sum(&self) -> Money {
        sum_lines(&self.items)
    }

    /// Overwrite the stored total with the line sum.
    pub fn recompute_total(&mut self) {
        self.total = self.line_sum();
    }

    /// Whether the stored total equals the line sum and every count is at
    /// least one.
    pub fn is_consistent(&self) -> bool {
        self.total == self.line_sum() && self.items.iter().all(|l| l.count >= 1)
    }

    /// Number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.count)).sum()
    }
}

fn sum_lines(items: &[OrderLine]) -> Money {
    items.iter().map(OrderLine::amount).sum()
}

impl Record for Order {
    const COLLECTION: &'static str = ORDERS_COLLECTION;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::RecordKey;
    use serde_json::json;
    use proptest::prelude::*;

    fn line(id: &str, rate: u32, count: u32) -> OrderLine {
        OrderLine {
            id: ItemId::from_raw(id),
            name: format!("item-{id}"),
            rate: Money::from_units(rate),
            count,
        }
    }

    #[test]
    fn new_computes_total() {
        let order = Order::new(vec![line("1", 50, 2), line("2", 30, 1)], None);
        assert_eq!(order.total, Money::from_units(130));
        assert!(order.is_consistent());
        assert_eq!(order.unit_count(), 3);
    }

    #[test]
    fn empty_order_totals_zero() {
        let order = Order::new(Vec::new(), None);
        assert_eq!(order.total, Money::ZERO);
    }

    #[test]
    fn drift_is_reported_and_recompute_fixes_it() {
        let mut order = Order::new(vec![line("1", 50, 2)], None);
        order.total = Money::from_units(999);
        assert!(!order.is_consistent());
        order.recompute_total();
        assert!(order.is_consistent());
    }

    #[test]
    fn decodes_stored_order_without_lines_or_date() {
        let order = Order::decode(&RecordKey::new("-Norder"), json!({"total": 0})).unwrap();
        assert!(order.items.is_empty());
        assert!(order.created_at.is_none());
    }

    #[test]
    fn decodes_legacy_string_fields() {
        let body = json!({
            "items": [{"id": "7", "name": "Idli", "rate": "40", "count": 2}],
            "total": 80,
            "createdAt": "2026-10-19T09:00:00Z"
        });
        let order = Order::decode(&RecordKey::new("-N1"), body).unwrap();
        assert_eq!(order.items[0].amount(), Money::from_units(80));
        assert!(order.is_consistent());
    }

    #[test]
    fn wire_shape() {
        let order = Order::new(vec![line("7", 40, 2)], None);
        let v = serde_json::to_value(&order).unwrap();
        assert_eq!(
            v,
            json!({"items": [{"id": "7", "name": "item-7", "rate": 40, "count": 2}], "total": 80})
        );
    }

    fn arb_lines() -> impl Strategy<Value = Vec<OrderLine>> {
        prop::collection::vec((0u32..2_000, 1u32..20), 0..12).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (rate, count))| line(&i.to_string(), rate, count))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn new_orders_are_consistent(lines in arb_lines()) {
            let order = Order::new(lines, None);
            prop_assert!(order.is_consistent());
            prop_assert_eq!(order.total, order.line_sum());
        }

        #[test]
        fn stored_order_reads_back_consistent(lines in arb_lines()) {
            let order = Order::new(lines, Some(Timestamp::from_epoch_millis(0).unwrap()));
            let body = serde_json::to_value(&order).unwrap();
            let decoded: Order = serde_json::from_value(body).unwrap();
            prop_assert!(decoded.is_consistent());
            prop_assert_eq!(decoded, order);
        }
    }
}
