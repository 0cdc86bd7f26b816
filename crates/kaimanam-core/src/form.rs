//! # Admin Item Form
//!
//! The admin catalog flow collects raw text for every item field plus an
//! optional image file. Validation runs before any upload or write:
//!
//! - **Create** requires every field and an image.
//! - **Update** requires every field; the image is optional and the stored
//!   URL is kept when none is chosen.
//!
//! Missing fields are reported together in one [`ValidationError::MissingFields`].

use crate::category::Category;
use crate::error::ValidationError;
use crate::identity::ItemId;
use crate::money::Money;

/// Folder in the blob store that item images are uploaded under.
pub const IMAGE_PREFIX: &str = "images";

/// An image chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    /// Build an image, inferring the content type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Object path in the blob store: `images/<file_name>`.
    pub fn storage_path(&self) -> String {
        format!("{IMAGE_PREFIX}/{}", self.file_name)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let name = self.file_name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(ValidationError::InvalidField {
                field: "image",
                reason: format!("unusable file name {:?}", self.file_name),
            });
        }
        if !self.content_type.starts_with("image/") {
            return Err(ValidationError::InvalidField {
                field: "image",
                reason: format!("{} is not an image", self.file_name),
            });
        }
        if self.bytes.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "image",
                reason: format!("{} is empty", self.file_name),
            });
        }
        Ok(())
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Raw admin input for an item.
#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    pub id: String,
    pub name: String,
    pub amount: String,
    pub rating: String,
    pub category: String,
    pub description: String,
    pub image: Option<ImageFile>,
}

/// Validated item fields, everything except the image URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub id: ItemId,
    pub name: String,
    pub amount: Money,
    pub rating: f64,
    pub category: Category,
    pub description: String,
}

impl ItemForm {
    /// Validate for creating a new item. An image is mandatory.
    pub fn into_create(self) -> Result<(ItemDraft, ImageFile), ValidationError> {
        let mut missing = self.missing_text_fields();
        if self.image.is_none() {
            missing.push("image");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        let (draft, image) = self.parse()?;
        match image {
            Some(image) => Ok((draft, image)),
            None => Err(ValidationError::MissingFields(vec!["image"])),
        }
    }

    /// Validate for updating an existing item. The image is optional.
    pub fn into_update(self) -> Result<(ItemDraft, Option<ImageFile>), ValidationError> {
        let missing = self.missing_text_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        self.parse()
    }

    fn missing_text_fields(&self) -> Vec<&'static str> {
        [
            ("id", &self.id),
            ("name", &self.name),
            ("amount", &self.amount),
            ("rating", &self.rating),
            ("category", &self.category),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    fn parse(self) -> Result<(ItemDraft, Option<ImageFile>), ValidationError> {
        let id = ItemId::parse(&self.id)?;
        let amount = Money::parse(&self.amount).map_err(|e| ValidationError::InvalidField {
            field: "amount",
            reason: e.to_string(),
        })?;
        let rating: f64 = self
            .rating
            .trim()
            .parse()
            .ok()
            .filter(|r: &f64| r.is_finite() && *r >= 0.0)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "rating",
                reason: format!("expected a non-negative number, got {:?}", self.rating),
            })?;
        let category = Category::parse(&self.category)?;
        if let Some(image) = &self.image {
            image.validate()?;
        }
        Ok((
            ItemDraft {
                id,
                name: self.name.trim().to_string(),
                amount,
                rating,
                category,
                description: self.description.trim().to_string(),
            },
            self.image,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ItemForm {
        ItemForm {
            id: "7".into(),
            name: "Idli".into(),
            amount: "40".into(),
            rating: "4.5".into(),
            category: "breakfast".into(),
            description: "Steamed rice cakes".into(),
            image: Some(ImageFile::new("idli.png", vec![1, 2, 3])),
        }
    }

    #[test]
    fn create_accepts_complete_form() {
        let (draft, image) = filled().into_create().unwrap();
        assert_eq!(draft.id.as_str(), "7");
        assert_eq!(draft.amount, Money::from_units(40));
        assert_eq!(draft.category, Category::Breakfast);
        assert_eq!(image.storage_path(), "images/idli.png");
        assert_eq!(image.content_type, "image/png");
    }

    #[test]
    fn create_requires_image() {
        let form = ItemForm {
            image: None,
            ..filled()
        };
        assert_eq!(
            form.into_create().unwrap_err(),
            ValidationError::MissingFields(vec!["image"])
        );
    }

    #[test]
    fn update_keeps_image_optional() {
        let form = ItemForm {
            image: None,
            ..filled()
        };
        let (_, image) = form.into_update().unwrap();
        assert!(image.is_none());
    }

    #[test]
    fn reports_every_missing_field() {
        let form = ItemForm {
            name: " ".into(),
            rating: String::new(),
            description: String::new(),
            image: None,
            ..filled()
        };
        assert_eq!(
            form.into_create().unwrap_err(),
            ValidationError::MissingFields(vec!["name", "rating", "description", "image"])
        );
    }

    #[test]
    fn rejects_malformed_values() {
        let bad_amount = ItemForm {
            amount: "forty".into(),
            ..filled()
        };
        assert!(matches!(
            bad_amount.into_update(),
            Err(ValidationError::InvalidField { field: "amount", .. })
        ));

        let bad_rating = ItemForm {
            rating: "-1".into(),
            ..filled()
        };
        assert!(matches!(
            bad_rating.into_update(),
            Err(ValidationError::InvalidField { field: "rating", .. })
        ));

        let bad_image = ItemForm {
            image: Some(ImageFile::new("notes.txt", vec![1])),
            ..filled()
        };
        assert!(matches!(
            bad_image.into_create(),
            Err(ValidationError::InvalidField { field: "image", .. })
        ));
    }
}
