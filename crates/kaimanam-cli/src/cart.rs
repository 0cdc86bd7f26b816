//! # Cart Subcommand
//!
//! The shopper's cart, kept in a local JSON file between invocations.
//!
//! ## Subcommands
//!
//! - `add`: Add one unit of a catalog item (needs the catalog).
//! - `remove`: Drop an item's line.
//! - `inc` / `dec`: Change a line's count by one; `dec` stops at one.
//! - `show`: Print the lines and the total.
//! - `clear`: Empty the cart.
//! - `submit`: Place the cart as an order (needs the order endpoint).
//!
//! Only `add` and `submit` go over the network. Before submitting, the cart
//! is reconciled with the current catalog when the catalog can be read;
//! if it cannot, the stored snapshots are submitted as they are. A failed
//! submission leaves the cart file untouched.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use kaimanam_client::{ItemRepository, OrderSink, StoreError};
use kaimanam_console::{Storefront, SubmitError};
use kaimanam_core::ItemId;
use kaimanam_state::Cart;

use crate::cart_file::{load_cart, save_cart};

/// Arguments for the `kaimanam cart` subcommand.
#[derive(Args, Debug)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommand,
}

/// Cart subcommands.
#[derive(Subcommand, Debug)]
pub enum CartCommand {
    /// Add one unit of a catalog item.
    Add {
        /// Business id of the item.
        id: String,
    },

    /// Remove an item's line from the cart.
    Remove {
        /// Business id of the item.
        id: String,
    },

    /// Raise an item's count by one.
    Inc {
        /// Business id of the item.
        id: String,
    },

    /// Lower an item's count by one (never below one).
    Dec {
        /// Business id of the item.
        id: String,
    },

    /// Show the cart.
    Show,

    /// Empty the cart.
    Clear,

    /// Place the cart as an order.
    Submit,
}

/// Execute the cart subcommand.
///
/// `connect` is only called by commands that need the catalog or the order
/// endpoint, so purely local edits work without any configuration.
pub async fn run_cart<R, S, F>(args: &CartArgs, cart_path: &Path, connect: F) -> Result<u8>
where
    R: ItemRepository,
    S: OrderSink,
    F: FnOnce() -> Result<(R, S)>,
{
    let mut cart = load_cart(cart_path)?;
    match &args.command {
        CartCommand::Add { id } => {
            let (items, sink) = connect()?;
            cmd_add(&items, sink, cart, cart_path, &item_id(id)).await
        }
        CartCommand::Remove { id } => {
            let id = item_id(id);
            let Some(line) = cart.remove(&id) else {
                bail!("item {id} is not in the cart");
            };
            save_cart(cart_path, &cart)?;
            println!("OK: removed {} from the cart", line.item.name);
            Ok(0)
        }
        CartCommand::Inc { id } => {
            let id = item_id(id);
            let Some(count) = cart.increase(&id) else {
                bail!("item {id} is not in the cart");
            };
            save_cart(cart_path, &cart)?;
            println!("OK: {id} now x{count}");
            Ok(0)
        }
        CartCommand::Dec { id } => {
            let id = item_id(id);
            let Some(count) = cart.decrease(&id) else {
                bail!("item {id} is not in the cart");
            };
            save_cart(cart_path, &cart)?;
            println!("OK: {id} now x{count}");
            Ok(0)
        }
        CartCommand::Show => {
            print!("{}", render_cart(&cart));
            Ok(0)
        }
        CartCommand::Clear => {
            cart.clear();
            save_cart(cart_path, &cart)?;
            println!("OK: cart cleared");
            Ok(0)
        }
        CartCommand::Submit => {
            let (items, sink) = connect()?;
            cmd_submit(&items, sink, cart, cart_path).await
        }
    }
}

fn item_id(raw: &str) -> ItemId {
    ItemId::from_raw(raw.trim())
}

async fn cmd_add<R: ItemRepository, S: OrderSink>(
    items: &R,
    sink: S,
    cart: Cart,
    cart_path: &Path,
    id: &ItemId,
) -> Result<u8> {
    let mut shop = Storefront::with_cart(sink, cart);
    let catalog = items.list_items().await.context("failed to load catalog")?;
    shop.apply_catalog::<StoreError>(Ok(catalog));

    let Some(count) = shop.add(id) else {
        bail!("no item with id {id} in the catalog");
    };
    save_cart(cart_path, shop.cart())?;
    println!("OK: added {id} (x{count}); cart total ₹{}", shop.cart().total());
    Ok(0)
}

async fn cmd_submit<R: ItemRepository, S: OrderSink>(
    items: &R,
    sink: S,
    cart: Cart,
    cart_path: &Path,
) -> Result<u8> {
    let mut shop = Storefront::with_cart(sink, cart);
    let mut pruned = false;
    match items.list_items().await {
        Ok(catalog) => {
            if let Some(report) = shop.apply_catalog::<StoreError>(Ok(catalog)) {
                for line in &report.removed {
                    println!("Removed {} (no longer on the menu)", line.item.name);
                }
                pruned = !report.removed.is_empty();
            }
        }
        Err(e) => tracing::warn!(error = %e, "catalog unavailable; submitting cart as saved"),
    }

    match shop.submit().await {
        Ok(confirmation) => {
            save_cart(cart_path, shop.cart())?;
            match &confirmation.key {
                Some(key) => println!(
                    "OK: order {key} placed; total ₹{}",
                    confirmation.order.total
                ),
                None => println!("OK: order placed; total ₹{}", confirmation.order.total),
            }
            Ok(0)
        }
        Err(SubmitError::EmptyCart) => {
            if pruned {
                save_cart(cart_path, shop.cart())?;
            }
            println!("Cart is empty; nothing to submit.");
            Ok(1)
        }
        Err(e) => Err(e).context("order was not placed; cart kept"),
    }
}

/// Render the cart as a table with its total.
pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<24} {:>5} {:>10} {:>10}",
        "ID", "NAME", "QTY", "RATE", "AMOUNT"
    );
    for line in cart.lines() {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:>5} {:>10} {:>10}",
            line.item.id,
            line.item.name,
            line.count,
            format!("₹{}", line.item.amount),
            format!("₹{}", line.amount())
        );
    }
    let _ = writeln!(out, "Total: ₹{}", cart.total());
    out
}
