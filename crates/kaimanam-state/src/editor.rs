//! # Order Editor
//!
//! Inline editing of a placed order from the admin desk. Line counts can be
//! changed and lines removed; the total is recomputed from the remaining
//! lines on every read. `finish` yields the order to write back whole.

use thiserror::Error;

use kaimanam_core::{ItemId, Money, Order, OrderLine};

/// Errors raised by an invalid edit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("order has no line {index} (it has {len})")]
    NoSuchLine { index: usize, len: usize },
    #[error("line counts must be at least 1; remove the line instead")]
    ZeroCount,
}

/// Working copy of an order under edit.
#[derive(Debug, Clone)]
pub struct OrderEditor {
    original: Order,
    lines: Vec<OrderLine>,
}

impl OrderEditor {
    /// Start editing `order`.
    pub fn new(order: Order) -> Self {
        let lines = order.items.clone();
        Self {
            original: order,
            lines,
        }
    }

    /// Current lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Set the count of line `index`.
    pub fn set_count(&mut self, index: usize, count: u32) -> Result<(), EditError> {
        if count == 0 {
            return Err(EditError::ZeroCount);
        }
        self.line_mut(index)?.count = count;
        Ok(())
    }

    /// Raise the count of line `index` by one.
    pub fn increase(&mut self, index: usize) -> Result<u32, EditError> {
        let line = self.line_mut(index)?;
        line.count = line.count.saturating_add(1);
        Ok(line.count)
    }

    /// Lower the count of line `index` by one, never below one.
    pub fn decrease(&mut self, index: usize) -> Result<u32, EditError> {
        let line = self.line_mut(index)?;
        if line.count > 1 {
            line.count -= 1;
        }
        Ok(line.count)
    }

    /// Remove line `index`.
    pub fn remove_line(&mut self, index: usize) -> Result<OrderLine, EditError> {
        self.check(index)?;
        Ok(self.lines.remove(index))
    }

    /// Remove every line for item `id`. Returns how many were removed.
    pub fn remove_item(&mut self, id: &ItemId) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != id);
        before - self.lines.len()
    }

    /// Total of the current lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::amount).sum()
    }

    /// Whether the lines or the total differ from the order being edited.
    pub fn is_dirty(&self) -> bool {
        self.lines != self.original.items || self.total() != self.original.total
    }

    /// The edited order: new lines, recomputed total, original timestamp.
    pub fn finish(self) -> Order {
        Order::new(self.lines, self.original.created_at)
    }

    fn check(&self, index: usize) -> Result<(), EditError> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(EditError::NoSuchLine {
                index,
                len: self.lines.len(),
            })
        }
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut OrderLine, EditError> {
        self.check(index)?;
        Ok(&mut self.lines[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_core::Timestamp;

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

    #[test]
    fn untouched_editor_is_clean() {
        let editor = OrderEditor::new(order());
        assert!(!editor.is_dirty());
        assert_eq!(editor.total(), Money::from_units(130));
    }

    #[test]
    fn count_changes_recompute_total() {
        let mut editor = OrderEditor::new(order());
        editor.set_count(1, 3).unwrap();
        assert_eq!(editor.total(), Money::from_units(190));
        assert_eq!(editor.decrease(0).unwrap(), 1);
        assert_eq!(editor.decrease(0).unwrap(), 1);
        assert_eq!(editor.increase(0).unwrap(), 2);
        assert!(editor.is_dirty());
    }

    #[test]
    fn removing_every_line_totals_zero() {
        let mut editor = OrderEditor::new(order());
        editor.remove_line(0).unwrap();
        editor.remove_line(0).unwrap();
        let edited = editor.finish();
        assert!(edited.items.is_empty());
        assert_eq!(edited.total, Money::ZERO);
        assert!(edited.created_at.is_some());
    }

    #[test]
    fn remove_item_by_id() {
        let mut editor = OrderEditor::new(order());
        assert_eq!(editor.remove_item(&ItemId::from_raw("1")), 1);
        assert_eq!(editor.remove_item(&ItemId::from_raw("1")), 0);
        assert_eq!(editor.finish().total, Money::from_units(30));
    }

    #[test]
    fn invalid_edits_are_rejected() {
        let mut editor = OrderEditor::new(order());
        assert_eq!(editor.set_count(0, 0), Err(EditError::ZeroCount));
        assert_eq!(
            editor.remove_line(5),
            Err(EditError::NoSuchLine { index: 5, len: 2 })
        );
        assert!(!editor.is_dirty());
    }
}
