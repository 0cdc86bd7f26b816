//! # Catalog Subcommand
//!
//! Read-only views of the catalog feed.
//!
//! ## Subcommands
//!
//! - `list`: Print the current catalog once.
//! - `watch`: Keep printing the catalog as it changes, until Ctrl-C.
//!
//! Both take `--category` to show one menu category only. Records that fail
//! to decode are skipped and counted in the footer.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use kaimanam_client::{ItemRepository, Snapshot};
use kaimanam_core::{Category, Item};
use kaimanam_state::{CatalogView, ViewState};

use crate::parse_category;

/// Arguments for the `kaimanam catalog` subcommand.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Print the catalog once.
    List {
        /// Only show items in this category.
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },

    /// Follow the catalog live until interrupted.
    Watch {
        /// Only show items in this category.
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
}

/// Execute the catalog subcommand.
pub async fn run_catalog<R: ItemRepository>(args: &CatalogArgs, items: &R) -> Result<u8> {
    match &args.command {
        CatalogCommand::List { category } => cmd_list(items, *category).await,
        CatalogCommand::Watch { category } => cmd_watch(items, *category).await,
    }
}

async fn cmd_list<R: ItemRepository>(items: &R, category: Option<Category>) -> Result<u8> {
    let records = items.list_items().await.context("failed to load catalog")?;
    let mut view: ViewState<CatalogView> = ViewState::default();
    view.apply::<String>(Ok(records));
    print!("{}", render_view(&view, category, 0));
    Ok(0)
}

async fn cmd_watch<R: ItemRepository>(items: &R, category: Option<Category>) -> Result<u8> {
    let mut subscription = items
        .subscribe_items()
        .await
        .context("failed to subscribe to catalog")?;
    let mut view: ViewState<CatalogView> = ViewState::default();
    print!("{}", render_view(&view, category, 0));

    loop {
        tokio::select! {
            next = subscription.next() => {
                let Some(outcome) = next else {
                    tracing::info!("catalog feed closed");
                    return Ok(0);
                };
                let rejected = outcome.as_ref().map(|s| s.rejected.len()).unwrap_or(0);
                view.apply(outcome.map(Snapshot::into_records));
                print!("{}", render_view(&view, category, rejected));
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                return Ok(0);
            }
        }
    }
}

/// Render the catalog state as a table.
pub fn render_view(
    view: &ViewState<CatalogView>,
    category: Option<Category>,
    rejected: usize,
) -> String {
    match view {
        ViewState::Loading => "Loading catalog...\n".to_string(),
        ViewState::Failed(reason) => format!("Catalog unavailable: {reason}\n"),
        ViewState::Ready(catalog) => render_items(&catalog.filtered(category), category, rejected),
    }
}

fn render_items(items: &[&Item], category: Option<Category>, rejected: usize) -> String {
    let mut out = String::new();
    if items.is_empty() {
        match category {
            Some(c) => {
                let _ = writeln!(out, "No {c} items.");
            }
            None => out.push_str("The catalog is empty.\n"),
        }
    } else {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:>10} {:>6}  {:<10}",
            "ID", "NAME", "PRICE", "RATING", "CATEGORY"
        );
        for item in items {
            let _ = writeln!(
                out,
                "{:<8} {:<24} {:>10} {:>6.1}  {:<10}",
                item.id,
                item.name,
                format!("₹{}", item.amount),
                item.rating,
                item.category
            );
        }
    }
    if rejected > 0 {
        let _ = writeln!(out, "({rejected} malformed record(s) skipped)");
    }
    out
}
