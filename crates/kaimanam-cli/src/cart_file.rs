//! Cart persistence between invocations.
//!
//! The cart is a JSON array of `{item, count}` lines. A missing file is an
//! empty cart. Saves go through a sibling temp file and a rename so an
//! interrupted write never leaves a truncated cart behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use kaimanam_state::Cart;

/// Cart file used when `--cart` is not given.
pub const DEFAULT_CART_FILE: &str = ".kaimanam-cart.json";

/// Read the cart at `path`.
pub fn load_cart(path: &Path) -> Result<Cart> {
    if !path.exists() {
        return Ok(Cart::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cart file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Cart::new());
    }
    serde_json::from_str(&raw).with_context(|| format!("invalid cart file: {}", path.display()))
}

/// Write `cart` to `path`.
pub fn save_cart(path: &Path, cart: &Cart) -> Result<()> {
    let json = serde_json::to_string_pretty(cart)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write cart file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace cart file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), lines = cart.len(), "cart saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_CART_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}
