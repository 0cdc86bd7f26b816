//! # Orders Subcommand
//!
//! The order desk.
//!
//! ## Subcommands
//!
//! - `list`: Print every placed order once.
//! - `watch`: Follow placed orders live until Ctrl-C.
//! - `delete`: Delete an order after confirmation (`--yes` skips it).
//! - `edit`: Change line counts or remove lines; the total is recomputed.
//! - `receipt`: Print a receipt as text, or write it as HTML.
//!
//! Line numbers on the command line are 1-based, as printed by `list`.
//! Record keys usually start with `-`, so the key must come right after
//! the subcommand name.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use kaimanam_client::{OrderRepository, Snapshot};
use kaimanam_console::{EditSession, OrderDesk, SaveOutcome, ShopProfile};
use kaimanam_core::{ItemId, Keyed, Order, RecordKey};
use kaimanam_state::{OrderBoard, ViewState};

use crate::confirm_on_terminal;

/// Arguments for the `kaimanam orders` subcommand.
#[derive(Args, Debug)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

/// Order desk subcommands.
#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    /// Print every placed order.
    List,

    /// Follow placed orders live until interrupted.
    Watch,

    /// Delete an order.
    Delete {
        /// Record key of the order.
        #[arg(allow_hyphen_values = true)]
        key: String,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Edit an order's lines.
    Edit {
        /// Record key of the order.
        #[arg(allow_hyphen_values = true)]
        key: String,
        /// Set a line's count, as LINE=COUNT (repeatable).
        #[arg(long = "set", value_name = "LINE=COUNT", value_parser = parse_line_count)]
        set: Vec<(usize, u32)>,
        /// Remove a line by number (repeatable).
        #[arg(long = "remove", value_name = "LINE")]
        remove: Vec<usize>,
        /// Remove every line for an item id (repeatable).
        #[arg(long = "remove-item", value_name = "ID")]
        remove_item: Vec<String>,
    },

    /// Print or save a receipt.
    Receipt {
        /// Record key of the order.
        #[arg(allow_hyphen_values = true)]
        key: String,
        /// Produce an HTML document instead of text.
        #[arg(long)]
        html: bool,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Parse `LINE=COUNT`.
fn parse_line_count(raw: &str) -> std::result::Result<(usize, u32), String> {
    let (line, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LINE=COUNT, got {raw:?}"))?;
    let line: usize = line
        .trim()
        .parse()
        .map_err(|_| format!("invalid line number {line:?}"))?;
    let count: u32 = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid count {count:?}"))?;
    Ok((line, count))
}

/// Execute the orders subcommand.
pub async fn run_orders<R: OrderRepository>(
    args: &OrdersArgs,
    orders: R,
    profile: ShopProfile,
) -> Result<u8> {
    let mut desk = OrderDesk::new(orders, profile);
    match &args.command {
        OrdersCommand::List => cmd_list(&mut desk).await,
        OrdersCommand::Watch => cmd_watch(&mut desk).await,
        OrdersCommand::Delete { key, yes } => cmd_delete(&mut desk, &record_key(key), *yes).await,
        OrdersCommand::Edit {
            key,
            set,
            remove,
            remove_item,
        } => cmd_edit(&desk, &record_key(key), set, remove, remove_item).await,
        OrdersCommand::Receipt { key, html, out } => {
            cmd_receipt(&desk, &record_key(key), *html, out.as_deref()).await
        }
    }
}

fn record_key(raw: &str) -> RecordKey {
    RecordKey::new(raw.trim())
}

async fn cmd_list<R: OrderRepository>(desk: &mut OrderDesk<R>) -> Result<u8> {
    desk.refresh().await.context("failed to load orders")?;
    print!("{}", render_board(desk.board()));
    Ok(0)
}

async fn cmd_watch<R: OrderRepository>(desk: &mut OrderDesk<R>) -> Result<u8> {
    let mut subscription = desk.subscribe().await.context("failed to subscribe to orders")?;
    print!("{}", render_board(desk.board()));
    loop {
        tokio::select! {
            next = subscription.next() => {
                let Some(outcome) = next else {
                    tracing::info!("order feed closed");
                    return Ok(0);
                };
                desk.apply(outcome.map(Snapshot::into_records));
                print!("{}", render_board(desk.board()));
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                return Ok(0);
            }
        }
    }
}

async fn cmd_delete<R: OrderRepository>(
    desk: &mut OrderDesk<R>,
    key: &RecordKey,
    yes: bool,
) -> Result<u8> {
    if !yes {
        if let Err(e) = desk.refresh().await {
            tracing::warn!(error = %e, "could not load the order for the prompt");
        }
    }
    let deleted = desk
        .delete(key, |key, order| {
            yes || confirm_on_terminal(&delete_prompt(key, order))
        })
        .await
        .with_context(|| format!("failed to delete order {key}"))?;
    if deleted {
        println!("OK: deleted order {key}");
        Ok(0)
    } else {
        println!("Cancelled; order {key} kept.");
        Ok(1)
    }
}

fn delete_prompt(key: &RecordKey, order: Option<&Order>) -> String {
    match order {
        Some(order) => format!(
            "Delete order {key} ({} line(s), total ₹{})?",
            order.items.len(),
            order.total
        ),
        None => format!("Delete order {key}?"),
    }
}

async fn cmd_edit<R: OrderRepository>(
    desk: &OrderDesk<R>,
    key: &RecordKey,
    set: &[(usize, u32)],
    remove: &[usize],
    remove_item: &[String],
) -> Result<u8> {
    if set.is_empty() && remove.is_empty() && remove_item.is_empty() {
        bail!("nothing to change; use --set, --remove or --remove-item");
    }
    let mut session = desk
        .begin_edit(key)
        .await
        .with_context(|| format!("failed to open order {key}"))?;
    apply_edits(&mut session, set, remove, remove_item)?;

    match desk.save(session).await.context("failed to save order")? {
        SaveOutcome::Saved { order, .. } => {
            println!(
                "OK: order {key} saved; {} line(s), total ₹{}",
                order.items.len(),
                order.total
            );
        }
        SaveOutcome::Unchanged => println!("Order {key} unchanged."),
    }
    Ok(0)
}

/// Apply count changes, then line removals, then item removals.
///
/// Line numbers refer to the order as read, so removals run from the last
/// line back.
fn apply_edits(
    session: &mut EditSession,
    set: &[(usize, u32)],
    remove: &[usize],
    remove_item: &[String],
) -> Result<()> {
    let editor = session.editor_mut();
    for &(line, count) in set {
        editor
            .set_count(line_index(line)?, count)
            .with_context(|| format!("cannot set line {line}"))?;
    }

    let mut indices = remove
        .iter()
        .map(|&line| line_index(line))
        .collect::<Result<Vec<_>>>()?;
    indices.sort_unstable();
    indices.dedup();
    for index in indices.into_iter().rev() {
        editor
            .remove_line(index)
            .with_context(|| format!("cannot remove line {}", index + 1))?;
    }

    for id in remove_item {
        let id = ItemId::from_raw(id.trim());
        if editor.remove_item(&id) == 0 {
            bail!("order has no line for item {id}");
        }
    }
    Ok(())
}

fn line_index(line: usize) -> Result<usize> {
    match line.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("line numbers start at 1"),
    }
}

async fn cmd_receipt<R: OrderRepository>(
    desk: &OrderDesk<R>,
    key: &RecordKey,
    html: bool,
    out: Option<&std::path::Path>,
) -> Result<u8> {
    let rendered = desk
        .receipt(key, |r| if html { r.to_html() } else { r.to_text() })
        .await
        .with_context(|| format!("failed to load order {key}"))?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write receipt: {}", path.display()))?;
            println!("OK: receipt written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(0)
}

/// Render the order board.
pub fn render_board(board: &ViewState<OrderBoard>) -> String {
    match board {
        ViewState::Loading => "Loading orders...\n".to_string(),
        ViewState::Failed(reason) => format!("Orders unavailable: {reason}\n"),
        ViewState::Ready(board) if board.is_empty() => "No orders.\n".to_string(),
        ViewState::Ready(board) => {
            let mut out = String::new();
            for order in board.orders() {
                render_order(&mut out, order);
            }
            out
        }
    }
}

fn render_order(out: &mut String, record: &Keyed<Order>) {
    let order = &record.value;
    let date = order
        .created_at
        .as_ref()
        .map(|t| t.to_receipt_string())
        .unwrap_or_else(|| "date unknown".to_string());
    let flag = if order.is_consistent() { "" } else { "  [total mismatch]" };
    let _ = writeln!(out, "{}  {date}  total ₹{}{flag}", record.key, order.total);
    for (i, line) in order.items.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<24} x{:<3} ₹{} = ₹{}",
            i + 1,
            line.name,
            line.count,
            line.rate,
            line.amount()
        );
    }
}
