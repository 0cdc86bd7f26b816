//! # kaimanam CLI entry point
//!
//! Parses command-line arguments, sets up logging, and dispatches to the
//! subcommand handlers in the library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kaimanam_cli::cart::{run_cart, CartArgs};
use kaimanam_cli::cart_file::DEFAULT_CART_FILE;
use kaimanam_cli::catalog::{run_catalog, CatalogArgs};
use kaimanam_cli::items::{run_items, ItemsArgs};
use kaimanam_cli::orders::{run_orders, OrdersArgs};
use kaimanam_cli::{connect, load_profile};

/// Kaimanam home foods
///
/// Browse the menu, keep a cart and place orders; manage placed orders and
/// the catalog. Service locations and credentials come from `KAIMANAM_*`
/// environment variables.
#[derive(Parser, Debug)]
#[command(name = "kaimanam", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Cart file.
    #[arg(long, global = true, default_value = DEFAULT_CART_FILE)]
    cart: PathBuf,

    /// JSON file with the shop details printed on receipts.
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the catalog.
    Catalog(CatalogArgs),

    /// Keep a cart and place it as an order.
    Cart(CartArgs),

    /// Order desk: list, watch, delete, edit, and print receipts.
    Orders(OrdersArgs),

    /// Catalog administration: add, show, update, and delete items.
    Items(ItemsArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG, when set, wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("kaimanam CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = dispatch(cli).await;

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    match cli.command {
        Commands::Catalog(args) => {
            let client = connect()?;
            run_catalog(&args, client.items()).await
        }
        Commands::Cart(args) => {
            run_cart(&args, &cli.cart, || {
                let client = connect()?;
                Ok((client.items().clone(), client.ingest().clone()))
            })
            .await
        }
        Commands::Orders(args) => {
            let profile = load_profile(cli.profile.as_deref())?;
            let client = connect()?;
            run_orders(&args, client.orders().clone(), profile).await
        }
        Commands::Items(args) => {
            let client = connect()?;
            run_items(&args, client.items().clone(), client.blobs().clone()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaimanam_cli::cart::CartCommand;
    use kaimanam_cli::catalog::CatalogCommand;
    use kaimanam_cli::items::ItemsCommand;
    use kaimanam_cli::orders::OrdersCommand;
    use kaimanam_core::Category;

    #[test]
    fn cli_parse_catalog_with_category() {
        let cli = Cli::try_parse_from(["kaimanam", "catalog", "list", "--category", "Lunch"]).unwrap();
        let Commands::Catalog(args) = cli.command else {
            panic!("expected catalog");
        };
        assert!(matches!(
            args.command,
            CatalogCommand::List {
                category: Some(Category::Lunch)
            }
        ));
    }

    #[test]
    fn cli_parse_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["kaimanam", "catalog", "watch", "--category", "brunch"]).is_err());
    }

    #[test]
    fn cli_parse_cart_defaults() {
        let cli = Cli::try_parse_from(["kaimanam", "cart", "add", "7"]).unwrap();
        assert_eq!(cli.cart, PathBuf::from(DEFAULT_CART_FILE));
        assert_eq!(cli.verbose, 0);
        let Commands::Cart(args) = cli.command else {
            panic!("expected cart");
        };
        assert!(matches!(args.command, CartCommand::Add { ref id } if id == "7"));
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kaimanam", "cart", "submit", "--cart", "/tmp/c.json", "-vv", "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.cart, PathBuf::from("/tmp/c.json"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
    }

    #[test]
    fn cli_parse_order_edit() {
        let cli = Cli::try_parse_from([
            "kaimanam", "orders", "edit", "-NX1", "--set", "1=3", "--set", "2=1", "--remove", "3",
        ])
        .unwrap();
        let Commands::Orders(args) = cli.command else {
            panic!("expected orders");
        };
        let OrdersCommand::Edit { key, set, remove, remove_item } = args.command else {
            panic!("expected edit");
        };
        assert_eq!(key, "-NX1");
        assert_eq!(set, vec![(1, 3), (2, 1)]);
        assert_eq!(remove, vec![3]);
        assert!(remove_item.is_empty());
    }

    #[test]
    fn cli_parse_items_add_fields() {
        let cli = Cli::try_parse_from([
            "kaimanam", "items", "add", "--id", "101", "--name", "Dosa", "--amount", "70",
            "--image", "dosa.png",
        ])
        .unwrap();
        let Commands::Items(args) = cli.command else {
            panic!("expected items");
        };
        let ItemsCommand::Add { id, fields } = args.command else {
            panic!("expected add");
        };
        assert_eq!(id.as_deref(), Some("101"));
        assert_eq!(fields.name.as_deref(), Some("Dosa"));
        assert_eq!(fields.image, Some(PathBuf::from("dosa.png")));
        assert!(fields.rating.is_none());
    }

    #[test]
    fn cli_parse_receipt_flags() {
        let cli = Cli::try_parse_from([
            "kaimanam", "--profile", "shop.json", "orders", "receipt", "-A", "--html", "--out", "bill.html",
        ]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        assert_eq!(cli.profile, Some(PathBuf::from("shop.json")));
    }
}
