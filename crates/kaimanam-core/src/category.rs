//! Menu categories an item can be filed under.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Menu category of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
    /// Catch-all for values written outside the admin form. Never accepted
    /// by validation and never matched by a category filter.
    #[serde(other)]
    Unknown,
}

impl Category {
    /// The categories an admin can choose from, in menu order.
    pub const SELECTABLE: [Category; 4] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Snack,
        Category::Dinner,
    ];

    /// Parse a form or command-line value, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::SELECTABLE
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "category",
                reason: format!("expected breakfast, lunch, snack or dinner, got {raw:?}"),
            })
    }

    /// The stored wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snack => "snack",
            Self::Dinner => "dinner",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
