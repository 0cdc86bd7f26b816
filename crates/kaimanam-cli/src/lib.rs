//! # kaimanam-cli -- The `kaimanam` Command-Line Interface
//!
//! A terminal front end for both sides of the shop.
//!
//! ## Subcommands
//!
//! - `kaimanam catalog`: List or watch the catalog, optionally by category.
//! - `kaimanam cart`: Keep a cart between invocations and place it as an order.
//! - `kaimanam orders`: The order desk (list, watch, delete, edit, receipts).
//! - `kaimanam items`: Catalog administration by business id.
//!
//! ```bash
//! kaimanam catalog list --category breakfast
//! kaimanam cart add 7
//! kaimanam cart submit
//! kaimanam orders receipt -NX3f... --html --out bill.html
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live here and delegate to
//!   `kaimanam-console`.
//! - Handlers are generic over the repository traits so they can be tested
//!   against `MemoryBackend`.

pub mod cart;
pub mod cart_file;
pub mod catalog;
pub mod items;
pub mod orders;

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

use kaimanam_client::{ClientConfig, KaimanamClient};
use kaimanam_console::ShopProfile;
use kaimanam_core::Category;

/// Build a client from `KAIMANAM_*` environment variables.
pub fn connect() -> Result<KaimanamClient> {
    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    tracing::debug!(?config, "connecting");
    KaimanamClient::new(config).context("failed to build client")
}

/// Load a receipt header from a JSON file, or use the default one.
pub fn load_profile(path: Option<&Path>) -> Result<ShopProfile> {
    let Some(path) = path else {
        return Ok(ShopProfile::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shop profile: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid shop profile: {}", path.display()))
}

/// Clap value parser for `--category`.
pub fn parse_category(raw: &str) -> std::result::Result<Category, String> {
    Category::parse(raw).map_err(|e| e.to_string())
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is a no.
pub fn confirm_on_terminal(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
