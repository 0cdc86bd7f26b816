//! # Cart Aggregator
//!
//! The cart maps item ids to cart lines. Lines keep the order in which their
//! items were first added, which is also the line order of the submitted
//! order.
//!
//! ## Rules
//!
//! ```text
//! add(item)       absent  -> insert with count 1
//!                 present -> count + 1
//! remove(id)      delete the line; absent is not an error
//! increase(id)    count + 1; absent is a no-op
//! decrease(id)    count - 1, floored at 1 (never removes); absent is a no-op
//! total()         Σ amount × count; empty cart -> 0
//! ```
//!
//! Counts can never reach zero and ids never repeat: the only way in is
//! `add`, and a decoded cart is checked for both.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kaimanam_core::{Item, ItemId, Money, Order, OrderLine, Timestamp};

use crate::feed::CatalogView;

/// An item snapshot and the quantity chosen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: Item,
    pub count: u32,
}

impl CartLine {
    /// `amount × count`.
    pub fn amount(&self) -> Money {
        self.item.amount.times(self.count)
    }

    fn to_order_line(&self) -> OrderLine {
        OrderLine {
            id: self.item.id.clone(),
            name: self.item.name.clone(),
            rate: self.item.amount,
            count: self.count,
        }
    }
}

/// Errors raised when a stored cart breaks the cart rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("cart line for item {0} has a zero count")]
    ZeroCount(ItemId),
    #[error("cart holds more than one line for item {0}")]
    DuplicateLine(ItemId),
}

/// What [`Cart::reconcile`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Lines whose item snapshot was refreshed from the catalog.
    pub refreshed: Vec<ItemId>,
    /// Lines dropped because their item left the catalog.
    pub removed: Vec<CartLine>,
}

impl Reconciliation {
    /// Whether the cart was left untouched.
    pub fn is_empty(&self) -> bool {
        self.refreshed.is_empty() && self.removed.is_empty()
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `item`. Returns the line's new count.
    pub fn add(&mut self, item: &Item) -> u32 {
        match self.line_mut(&item.id) {
            Some(line) => {
                line.count = line.count.saturating_add(1);
                line.count
            }
            None => {
                self.lines.push(CartLine {
                    item: item.clone(),
                    count: 1,
                });
                1
            }
        }
    }

    /// Remove the line for `id`, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<CartLine> {
        let pos = self.lines.iter().position(|l| &l.item.id == id)?;
        Some(self.lines.remove(pos))
    }

    /// Raise the count for `id` by one. Returns the new count, or `None`
    /// when the item is not in the cart.
    pub fn increase(&mut self, id: &ItemId) -> Option<u32> {
        let line = self.line_mut(id)?;
        line.count = line.count.saturating_add(1);
        Some(line.count)
    }

    /// Lower the count for `id` by one, never below one. Returns the new
    /// count, or `None` when the item is not in the cart.
    pub fn decrease(&mut self, id: &ItemId) -> Option<u32> {
        let line = self.line_mut(id)?;
        if line.count > 1 {
            line.count -= 1;
        }
        Some(line.count)
    }

    /// Σ `amount × count` over all lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::amount).sum()
    }

    /// The count for `id`, if it is in the cart.
    pub fn count_of(&self, id: &ItemId) -> Option<u32> {
        self.line(id).map(|l| l.count)
    }

    /// Whether `id` is in the cart.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.line(id).is_some()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The order this cart would place.
    pub fn to_order(&self, created_at: Option<Timestamp>) -> Order {
        Order::new(
            self.lines.iter().map(CartLine::to_order_line).collect(),
            created_at,
        )
    }

    /// Bring item snapshots in line with the live catalog.
    ///
    /// Lines whose item changed in the catalog take the new snapshot and
    /// keep their count. Lines whose item is gone are removed.
    pub fn reconcile(&mut self, catalog: &CatalogView) -> Reconciliation {
        let mut report = Reconciliation::default();
        let mut kept = Vec::with_capacity(self.lines.len());
        for mut line in self.lines.drain(..) {
            match catalog.get(&line.item.id) {
                Some(current) => {
                    if current != &line.item {
                        line.item = current.clone();
                        report.refreshed.push(line.item.id.clone());
                    }
                    kept.push(line);
                }
                None => report.removed.push(line),
            }
        }
        self.lines = kept;
        report
    }

    fn line(&self, id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.item.id == id)
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.item.id == id)
    }
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = CartError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        for (i, line) in lines.iter().enumerate() {
            if line.count == 0 {
                return Err(CartError::ZeroCount(line.item.id.clone()));
            }
            if lines[..i].iter().any(|l| l.item.id == line.item.id) {
                return Err(CartError::DuplicateLine(line.item.id.clone()));
            }
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
