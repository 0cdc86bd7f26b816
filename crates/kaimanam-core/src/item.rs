//! # Catalog Items
//!
//! An [`Item`] is one product record in the `items` collection. Items are
//! created and edited only through the admin catalog flow; the storefront
//! reads them through the catalog feed.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::form::ItemDraft;
use crate::identity::{ItemId, RecordKey};
use crate::lenient;
use crate::money::Money;
use crate::record::Record;
use crate::ITEMS_COLLECTION;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Admin-assigned business id.
    pub id: ItemId,
    pub name: String,
    /// Unit price.
    pub amount: Money,
    #[serde(default, deserialize_with = "lenient::float")]
    pub rating: f64,
    #[serde(default = "unknown_category")]
    pub category: Category,
    #[serde(default)]
    pub description: String,
    /// Retrieval URL of the product image in the blob store.
    #[serde(default)]
    pub image_url: String,
    /// Display quantity; always 1 for stored items.
    #[serde(
        default = "lenient::default_count",
        deserialize_with = "lenient::unsigned"
    )]
    pub count: u32,
}

fn unknown_category() -> Category {
    Category::Unknown
}

impl Item {
    /// Assemble an item from a validated form and the URL its image was
    /// uploaded to.
    pub fn from_draft(draft: ItemDraft, image_url: String) -> Self {
        Self {
            id: draft.id,
            name: draft.name,
            amount: draft.amount,
            rating: draft.rating,
            category: draft.category,
            description: draft.description,
            image_url,
            count: 1,
        }
    }

    /// Whether the item belongs to `category`, or to any category when
    /// `None` is given.
    pub fn in_category(&self, category: Option<Category>) -> bool {
        category.map_or(true, |c| self.category == c)
    }
}

impl Record for Item {
    const COLLECTION: &'static str = ITEMS_COLLECTION;

    /// Records without an `id` field are identified by their key.
    fn prepare(key: &RecordKey, body: &mut serde_json::Value) {
        if let Some(obj) = body.as_object_mut() {
            obj.entry("id")
                .or_insert_with(|| serde_json::Value::String(key.as_str().to_string()));
        }
    }
}
