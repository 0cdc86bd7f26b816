//! # Items Subcommand
//!
//! Catalog administration by business id.
//!
//! ## Subcommands
//!
//! - `add`: Create an item. Every field and an image are required.
//! - `show`: Print one item.
//! - `update`: Change some fields of an item; the rest keep their values.
//!   Without `--image` the stored image is kept.
//! - `delete`: Delete an item after confirmation (`--yes` skips it).
//!
//! Field values are validated together before anything is uploaded, so a
//! form with several problems reports all missing fields at once.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use kaimanam_client::{BlobStore, ItemRepository};
use kaimanam_console::{form_for, CatalogAdmin};
use kaimanam_core::{ImageFile, Item, ItemForm, ItemId, Versioned};

use crate::confirm_on_terminal;

/// Arguments for the `kaimanam items` subcommand.
#[derive(Args, Debug)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,
}

/// Item field flags shared by `add` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct ItemFields {
    /// Display name.
    #[arg(long)]
    pub name: Option<String>,
    /// Unit price, e.g. 70 or 75.50.
    #[arg(long)]
    pub amount: Option<String>,
    /// Rating, e.g. 4.5.
    #[arg(long)]
    pub rating: Option<String>,
    /// breakfast, lunch, snack or dinner.
    #[arg(long)]
    pub category: Option<String>,
    /// Free-text description.
    #[arg(long)]
    pub description: Option<String>,
    /// Image file to upload.
    #[arg(long)]
    pub image: Option<PathBuf>,
}

/// Item administration subcommands.
#[derive(Subcommand, Debug)]
pub enum ItemsCommand {
    /// Create a catalog item.
    Add {
        /// Business id of the new item.
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        fields: ItemFields,
    },

    /// Print one item.
    Show {
        /// Business id of the item.
        id: String,
    },

    /// Update an item.
    Update {
        /// Business id of the item.
        id: String,
        /// Give the item a new business id.
        #[arg(long)]
        new_id: Option<String>,
        #[command(flatten)]
        fields: ItemFields,
    },

    /// Delete an item.
    Delete {
        /// Business id of the item.
        id: String,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
}

/// Execute the items subcommand.
pub async fn run_items<R: ItemRepository, B: BlobStore>(
    args: &ItemsArgs,
    items: R,
    blobs: B,
) -> Result<u8> {
    let admin = CatalogAdmin::new(items, blobs);
    match &args.command {
        ItemsCommand::Add { id, fields } => cmd_add(&admin, id.as_deref(), fields).await,
        ItemsCommand::Show { id } => {
            let current = admin.fetch(&item_id(id)).await?;
            print!("{}", render_item(&current));
            Ok(0)
        }
        ItemsCommand::Update { id, new_id, fields } => {
            cmd_update(&admin, &item_id(id), new_id.as_deref(), fields).await
        }
        ItemsCommand::Delete { id, yes } => cmd_delete(&admin, &item_id(id), *yes).await,
    }
}

fn item_id(raw: &str) -> ItemId {
    ItemId::from_raw(raw.trim())
}

async fn cmd_add<R: ItemRepository, B: BlobStore>(
    admin: &CatalogAdmin<R, B>,
    id: Option<&str>,
    fields: &ItemFields,
) -> Result<u8> {
    let mut form = ItemForm {
        id: id.unwrap_or_default().to_string(),
        ..ItemForm::default()
    };
    fill_form(&mut form, fields)?;
    let (key, item) = admin.create(form).await?;
    println!("OK: created item {} ({}) as {key}", item.id, item.name);
    Ok(0)
}

async fn cmd_update<R: ItemRepository, B: BlobStore>(
    admin: &CatalogAdmin<R, B>,
    id: &ItemId,
    new_id: Option<&str>,
    fields: &ItemFields,
) -> Result<u8> {
    let current = admin.fetch(id).await?;
    let mut form = form_for(current.value());
    if let Some(new_id) = new_id {
        form.id = new_id.to_string();
    }
    fill_form(&mut form, fields)?;
    let (item, _) = admin.update(&current, form).await?;
    println!("OK: updated item {} ({})", item.id, item.name);
    Ok(0)
}

async fn cmd_delete<R: ItemRepository, B: BlobStore>(
    admin: &CatalogAdmin<R, B>,
    id: &ItemId,
    yes: bool,
) -> Result<u8> {
    if !yes {
        let current = admin.fetch(id).await?;
        let prompt = format!("Delete item {id} ({})?", current.value().name);
        if !confirm_on_terminal(&prompt) {
            println!("Cancelled; item {id} kept.");
            return Ok(1);
        }
    }
    let key = admin.delete(id).await?;
    println!("OK: deleted item {id} ({key})");
    Ok(0)
}

/// Overlay the given flags onto `form` and load the image file, if any.
fn fill_form(form: &mut ItemForm, fields: &ItemFields) -> Result<()> {
    let overlay = [
        (&mut form.name, &fields.name),
        (&mut form.amount, &fields.amount),
        (&mut form.rating, &fields.rating),
        (&mut form.category, &fields.category),
        (&mut form.description, &fields.description),
    ];
    for (slot, value) in overlay {
        if let Some(value) = value {
            slot.clone_from(value);
        }
    }
    if let Some(path) = &fields.image {
        form.image = Some(read_image(path)?);
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageFile::new(file_name, bytes))
}

/// Render one item with its record key.
pub fn render_item(record: &Versioned<Item>) -> String {
    let item = record.value();
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", item.name, item.id);
    let _ = writeln!(out, "  key:         {}", record.key());
    let _ = writeln!(out, "  price:       ₹{}", item.amount);
    let _ = writeln!(out, "  rating:      {}", item.rating);
    let _ = writeln!(out, "  category:    {}", item.category);
    let _ = writeln!(out, "  description: {}", item.description);
    let _ = writeln!(out, "  image:       {}", item.image_url);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_client::MemoryBackend;
    use kaimanam_console::AdminError;
    use kaimanam_core::{Category, Money, ValidationError};

    fn fields(image: Option<PathBuf>) -> ItemFields {
        ItemFields {
            name: Some("Masala Dosa".into()),
            amount: Some("70".into()),
            rating: Some("4.5".into()),
            category: Some("Breakfast".into()),
            description: Some("Crisp dosa with potato masala".into()),
            image,
        }
    }

    fn image_file(dir: &Path) -> PathBuf {
        let path = dir.join("dosa.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        path
    }

    async fn run(backend: &MemoryBackend, command: ItemsCommand) -> Result<u8> {
        run_items(&ItemsArgs { command }, backend.clone(), backend.clone()).await
    }

    #[tokio::test]
    async fn add_uploads_image_and_stores_item() {
        let backend = MemoryBackend::new();
        let dir = tempfile::tempdir().unwrap();
        let command = ItemsCommand::Add {
            id: Some("101".into()),
            fields: fields(Some(image_file(dir.path()))),
        };
        assert_eq!(run(&backend, command).await.unwrap(), 0);

        let stored = backend
            .find_item(&ItemId::from_raw("101"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.value().category, Category::Breakfast);
        assert_eq!(stored.value().image_url, "memory:///images/dosa.png");
        assert_eq!(backend.blob("images/dosa.png").unwrap().bytes.len(), 4);
    }

    #[tokio::test]
    async fn add_reports_every_missing_field() {
        let backend = MemoryBackend::new();
        let command = ItemsCommand::Add {
            id: None,
            fields: ItemFields {
                name: Some("Dosa".into()),
                ..ItemFields::default()
            },
        };
        let err = run(&backend, command).await.unwrap_err();
        match err.downcast_ref::<AdminError>() {
            Some(AdminError::Validation(ValidationError::MissingFields(missing))) => {
                assert_eq!(
                    missing,
                    &vec!["id", "amount", "rating", "category", "description", "image"]
                );
            }
            other => panic!("expected missing fields, got {other:?}"),
        }
        assert_eq!(backend.blob_count(), 0);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let backend = MemoryBackend::new();
        let dir = tempfile::tempdir().unwrap();
        run(
            &backend,
            ItemsCommand::Add {
                id: Some("101".into()),
                fields: fields(Some(image_file(dir.path()))),
            },
        )
        .await
        .unwrap();

        let command = ItemsCommand::Update {
            id: "101".into(),
            new_id: None,
            fields: ItemFields {
                amount: Some("75.50".into()),
                ..ItemFields::default()
            },
        };
        run(&backend, command).await.unwrap();

        let stored = backend
            .find_item(&ItemId::from_raw("101"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.value().amount, Money::parse("75.50").unwrap());
        assert_eq!(stored.value().name, "Masala Dosa");
        assert_eq!(stored.value().image_url, "memory:///images/dosa.png");
        assert_eq!(backend.blob_count(), 1);
    }

    #[tokio::test]
    async fn delete_and_show_unknown() {
        let backend = MemoryBackend::new();
        let dir = tempfile::tempdir().unwrap();
        run(
            &backend,
            ItemsCommand::Add {
                id: Some("7".into()),
                fields: fields(Some(image_file(dir.path()))),
            },
        )
        .await
        .unwrap();

        run(&backend, ItemsCommand::Show { id: "7".into() }).await.unwrap();
        run(
            &backend,
            ItemsCommand::Delete {
                id: "7".into(),
                yes: true,
            },
        )
        .await
        .unwrap();

        let err = run(&backend, ItemsCommand::Show { id: "7".into() })
            .await
            .unwrap_err();
        assert!(err
            .downcast_ref::<AdminError>()
            .is_some_and(AdminError::is_not_found));
    }

    #[test]
    fn missing_image_file_is_reported() {
        let mut form = ItemForm::default();
        let err = fill_form(&mut form, &fields(Some(PathBuf::from("/no/such/dosa.png"))))
            .unwrap_err();
        assert!(err.to_string().contains("failed to read image"));
    }

    #[test]
    fn render_shows_price_and_key() {
        let item = Item {
            id: ItemId::from_raw("3"),
            name: "Vada".into(),
            amount: Money::from_units(30),
            rating: 4.0,
            category: Category::Snack,
            description: "Crisp".into(),
            image_url: "https://img/vada.png".into(),
            count: 1,
        };
        let record = Versioned::new(
            kaimanam_core::Keyed::new(kaimanam_core::RecordKey::new("-K1"), item),
            None,
        );
        let text = render_item(&record);
        assert!(text.starts_with("Vada (3)\n"));
        assert!(text.contains("key:         -K1"));
        assert!(text.contains("price:       ₹30"));
        assert!(text.contains("category:    snack"));
    }
}
