//! # Catalog Administration
//!
//! Create, look up, update, and delete catalog items.
//!
//! Creating an item uploads its image first and then writes the record with
//! the returned URL. The two steps are not atomic: when the upload succeeds
//! and the record write fails, the image stays in storage. That case is
//! logged at `warn` with the image path and left for manual cleanup.

use kaimanam_client::{BlobStore, ItemRepository, StoreError};
use kaimanam_core::{ImageFile, Item, ItemForm, ItemId, RecordKey, Version, Versioned};

use crate::error::AdminError;

/// Catalog administration over an item repository and an image store.
#[derive(Debug, Clone)]
pub struct CatalogAdmin<R, B> {
    items: R,
    blobs: B,
}

/// A form pre-filled from a stored item, for editing. No image is attached;
/// leaving it empty keeps the stored one.
pub fn form_for(item: &Item) -> ItemForm {
    ItemForm {
        id: item.id.to_string(),
        name: item.name.clone(),
        amount: item.amount.to_string(),
        rating: item.rating.to_string(),
        category: item.category.as_str().to_string(),
        description: item.description.clone(),
        image: None,
    }
}

impl<R: ItemRepository, B: BlobStore> CatalogAdmin<R, B> {
    pub fn new(items: R, blobs: B) -> Self {
        Self { items, blobs }
    }

    /// Validate `form`, upload its image, and store the new item.
    pub async fn create(&self, form: ItemForm) -> Result<(RecordKey, Item), AdminError> {
        let (draft, image) = form.into_create()?;
        let image_url = self.blobs.upload_image(&image).await?;
        let item = Item::from_draft(draft, image_url);

        match self.items.insert_item(&item).await {
            Ok(key) => {
                tracing::info!(key = %key, id = %item.id, name = %item.name, "item created");
                Ok((key, item))
            }
            Err(e) => Err(orphaned(&image, e)),
        }
    }

    /// Look up an item by business id.
    pub async fn fetch(&self, id: &ItemId) -> Result<Versioned<Item>, AdminError> {
        self.items.find_item(id).await?.ok_or_else(|| {
            AdminError::Store(StoreError::NotFound {
                what: format!("item with id {id}"),
            })
        })
    }

    /// Replace a fetched item with the contents of `form`.
    ///
    /// Without a new image the stored image URL is kept. The write is
    /// conditional on the version `current` was read at, so an edit made
    /// elsewhere in between fails with a conflict instead of being lost.
    pub async fn update(
        &self,
        current: &Versioned<Item>,
        form: ItemForm,
    ) -> Result<(Item, Option<Version>), AdminError> {
        let (draft, image) = form.into_update()?;
        let image_url = match &image {
            Some(image) => self.blobs.upload_image(image).await?,
            None => current.value().image_url.clone(),
        };
        let item = Item::from_draft(draft, image_url);

        match self
            .items
            .update_item(current.key(), &item, current.version.as_ref())
            .await
        {
            Ok(version) => {
                tracing::info!(key = %current.key(), id = %item.id, "item updated");
                Ok((item, version))
            }
            Err(e) => match &image {
                Some(image) => Err(orphaned(image, e)),
                None => Err(e.into()),
            },
        }
    }

    /// Delete the item with business id `id`. Returns the removed record key.
    pub async fn delete(&self, id: &ItemId) -> Result<RecordKey, AdminError> {
        let current = self.fetch(id).await?;
        self.items.delete_item(current.key()).await?;
        tracing::info!(key = %current.key(), id = %id, "item deleted");
        Ok(current.record.key)
    }
}

fn orphaned(image: &ImageFile, e: StoreError) -> AdminError {
    tracing::warn!(
        path = %image.storage_path(),
        error = %e,
        "image uploaded but item write failed; blob left orphaned"
    );
    AdminError::Store(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_client::MemoryBackend;
    use kaimanam_core::{Category, Money, ValidationError};

    fn form(id: &str, image: Option<&str>) -> ItemForm {
        ItemForm {
            id: id.into(),
            name: "Masala Dosa".into(),
            amount: "70".into(),
            rating: "4.5".into(),
            category: "breakfast".into(),
            description: "Crisp dosa with potato masala".into(),
            image: image.map(|name| ImageFile::new(name, vec![1, 2, 3])),
        }
    }

    fn admin(backend: &MemoryBackend) -> CatalogAdmin<MemoryBackend, MemoryBackend> {
        CatalogAdmin::new(backend.clone(), backend.clone())
    }

    #[tokio::test]
    async fn create_uploads_then_stores() {
        let backend = MemoryBackend::new();
        let (key, item) = admin(&backend)
            .create(form("101", Some("dosa.png")))
            .await
            .unwrap();

        assert_eq!(item.image_url, "memory:///images/dosa.png");
        assert_eq!(item.category, Category::Breakfast);
        assert_eq!(item.count, 1);
        assert!(backend.blob("images/dosa.png").is_some());

        let fetched = admin(&backend).fetch(&ItemId::from_raw("101")).await.unwrap();
        assert_eq!(fetched.key(), &key);
        assert_eq!(fetched.value(), &item);
    }

    #[tokio::test]
    async fn create_requires_an_image() {
        let backend = MemoryBackend::new();
        let err = admin(&backend).create(form("101", None)).await.unwrap_err();
        match err {
            AdminError::Validation(ValidationError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["image"]);
            }
            other => panic!("expected missing image, got {other:?}"),
        }
        assert_eq!(backend.blob_count(), 0);
    }

    #[tokio::test]
    async fn failed_insert_leaves_blob_orphaned() {
        let backend = MemoryBackend::new();
        backend.reject_writes("items", true);
        let err = admin(&backend)
            .create(form("101", Some("dosa.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Store(StoreError::Api { .. })));
        assert_eq!(backend.blob_count(), 1);
    }

    #[tokio::test]
    async fn fetch_unknown_id_is_not_found() {
        let backend = MemoryBackend::new();
        let err = admin(&backend).fetch(&ItemId::from_raw("5")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_without_image_keeps_url() {
        let backend = MemoryBackend::new();
        let admin = admin(&backend);
        admin.create(form("101", Some("dosa.png"))).await.unwrap();

        let current = admin.fetch(&ItemId::from_raw("101")).await.unwrap();
        let mut edit = form_for(current.value());
        edit.amount = "75.50".into();
        let (updated, version) = admin.update(&current, edit).await.unwrap();

        assert_eq!(updated.amount, Money::parse("75.50").unwrap());
        assert_eq!(updated.image_url, "memory:///images/dosa.png");
        assert!(version.is_some());
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let backend = MemoryBackend::new();
        let admin = admin(&backend);
        admin.create(form("101", Some("dosa.png"))).await.unwrap();

        let first = admin.fetch(&ItemId::from_raw("101")).await.unwrap();
        let second = admin.fetch(&ItemId::from_raw("101")).await.unwrap();
        admin.update(&first, form_for(first.value())).await.unwrap();

        let err = admin
            .update(&second, form_for(second.value()))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn update_with_new_image_replaces_url() {
        let backend = MemoryBackend::new();
        let admin = admin(&backend);
        admin.create(form("101", Some("dosa.png"))).await.unwrap();

        let current = admin.fetch(&ItemId::from_raw("101")).await.unwrap();
        let mut edit = form_for(current.value());
        edit.image = Some(ImageFile::new("dosa-v2.jpg", vec![9]));
        let (updated, _) = admin.update(&current, edit).await.unwrap();
        assert_eq!(updated.image_url, "memory:///images/dosa-v2.jpg");
    }

    #[tokio::test]
    async fn delete_by_business_id() {
        let backend = MemoryBackend::new();
        let admin = admin(&backend);
        let (key, _) = admin.create(form("101", Some("dosa.png"))).await.unwrap();

        assert_eq!(admin.delete(&ItemId::from_raw("101")).await.unwrap(), key);
        assert!(admin.fetch(&ItemId::from_raw("101")).await.unwrap_err().is_not_found());
        assert!(admin.delete(&ItemId::from_raw("101")).await.is_err());
    }
}
