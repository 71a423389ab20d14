//! # Báscula Entry Point
//!
//! ```bash
//! bascula tare add "Caja plástica" 1.8
//! bascula weigh JIT-SAL 23.4 --tare "Caja plástica" --boxes 3
//! bascula weigh AGU-HAS 1.2345 --tare NO_TARE_PIECE_SALE
//! bascula order show
//! bascula order commit
//! BASCULA_ROLE=supervisor bascula stock move PAP-BLA merma 2.5 --reason "podrida"
//! bascula --json report margin --from 2026-10-01 --to 2026-10-17
//! ```

use anyhow::Context;
use bascula_core::pricing::PriceTierSet;
use bascula_core::report::MarginReport;
use bascula_core::validation::parse_decimal;
use bascula_core::{Client, Kilograms, Money, MovementKind, Order, PriceTier, Product, StockMovement, TareSpec};
use bascula_db::{NewClient, NewProduct};
use bascula_pos::commands::order::{DraftView, OrderView};
use bascula_pos::commands::weighing::{PreviewResponse, WeighRequest, WeighResponse};
use bascula_pos::commands::{catalog, inventory, order, report, tare, weighing};
use bascula_pos::{ApiError, ApiResult, AppConfig, AppState};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "bascula", version, about = "Weight-priced point of sale")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: bascula.toml in the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tare catalog
    #[command(subcommand)]
    Tare(TareCmd),
    /// Products and price tiers
    #[command(subcommand)]
    Product(ProductCmd),
    /// Clients
    #[command(subcommand)]
    Client(ClientCmd),
    /// Weigh a line into the open order
    Weigh {
        /// Product SKU or id
        product: String,
        /// Gross kilograms on the scale (kilograms to sell for piece sale)
        #[arg(allow_negative_numbers = true, value_parser = decimal_arg)]
        gross: Decimal,
        /// Tare name or id
        #[arg(long)]
        tare: Option<String>,
        /// Containers on the scale
        #[arg(long, default_value_t = 1)]
        boxes: u32,
        /// Show the result without adding the line
        #[arg(long)]
        preview: bool,
    },
    /// Open order and order history
    #[command(subcommand)]
    Order(OrderCmd),
    /// Inventory movements
    #[command(subcommand)]
    Stock(StockCmd),
    /// Reports
    #[command(subcommand)]
    Report(ReportCmd),
}

#[derive(Debug, Subcommand)]
enum TareCmd {
    List,
    Add {
        name: String,
        /// Empty container weight in kg
        #[arg(value_parser = decimal_arg)]
        unit_weight: Decimal,
    },
    Edit {
        /// Tare name or id
        tare: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = decimal_arg)]
        weight: Option<Decimal>,
    },
    Remove {
        tare: String,
    },
}

#[derive(Debug, Subcommand)]
enum ProductCmd {
    List,
    Add {
        #[arg(long)]
        sku: String,
        #[arg(long)]
        name: String,
        /// P1 price per kg
        #[arg(long, value_parser = decimal_arg)]
        price: Decimal,
        /// Purchase cost per kg
        #[arg(long, value_parser = decimal_arg)]
        cost: Option<Decimal>,
        /// Opening stock in kg
        #[arg(long, default_value_t = Decimal::ZERO, value_parser = decimal_arg)]
        stock: Decimal,
    },
    /// Set or clear a tier price
    Price {
        product: String,
        /// Tier 1..5
        tier: u8,
        /// Price per kg; omit with --clear
        #[arg(value_parser = decimal_arg)]
        price: Option<Decimal>,
        #[arg(long, conflicts_with = "price")]
        clear: bool,
    },
    /// Set or clear the purchase cost
    Cost {
        product: String,
        #[arg(value_parser = decimal_arg)]
        cost: Option<Decimal>,
    },
}

#[derive(Debug, Subcommand)]
enum ClientCmd {
    List,
    Add {
        name: String,
        /// Default price tier 1..5
        #[arg(long, default_value_t = 1)]
        tier: u8,
        #[arg(long, value_parser = decimal_arg)]
        credit_limit: Option<Decimal>,
    },
}

#[derive(Debug, Subcommand)]
enum OrderCmd {
    /// Show the open order
    Show,
    /// Assign a client (omit to remove)
    Client { client: Option<String> },
    /// Force a price tier for the next lines (omit to reset)
    Tier { tier: Option<u8> },
    RemoveLine { line_id: String },
    Clear,
    Commit,
    /// Cancel a completed order (needs stock-adjust permission)
    Cancel { order: String },
    /// Show a completed order by folio or id
    Get { order: String },
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Debug, Subcommand)]
enum StockCmd {
    /// Record entrada, salida, ajuste or merma
    Move {
        product: String,
        kind: MovementKind,
        /// Kilograms (signed for ajuste)
        #[arg(allow_negative_numbers = true, value_parser = decimal_arg)]
        quantity: Decimal,
        #[arg(long)]
        reason: Option<String>,
    },
    History {
        product: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Debug, Subcommand)]
enum ReportCmd {
    /// Margin per product (dates default to today, UTC)
    Margin {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bascula_pos::init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.clone()).context("loading configuration")?;
    info!(operator = %config.operator, role = %config.role, "Starting Báscula");

    let state = AppState::open(config).await.context("opening the database")?;
    let mut events = state.events.subscribe();

    let result = run(&state, cli.command, cli.json).await;

    while let Ok(event) = events.try_recv() {
        debug!(?event, "Event");
    }
    state.db().close().await;

    if let Err(err) = result {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&err)?);
        } else {
            eprintln!("error: {}", err.message);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(state: &AppState, command: Command, json: bool) -> ApiResult<()> {
    match command {
        Command::Tare(cmd) => match cmd {
            TareCmd::List => emit(json, &tare::list_tares(state).await?[..], print_tares),
            TareCmd::Add { name, unit_weight } => {
                let t = tare::add_tare(state, &name, Kilograms::new(unit_weight)).await?;
                emit(json, &[t][..], print_tares)
            }
            TareCmd::Edit { tare: key, name, weight } => {
                let t = tare::edit_tare(state, &key, name.as_deref(), weight.map(Kilograms::new)).await?;
                emit(json, &[t][..], print_tares)
            }
            TareCmd::Remove { tare: key } => {
                let t = tare::remove_tare(state, &key).await?;
                emit(json, &t, |t| println!("Removed tare {}", t.name))
            }
        },

        Command::Product(cmd) => match cmd {
            ProductCmd::List => emit(json, &catalog::list_products(state).await?[..], print_products),
            ProductCmd::Add { sku, name, price, cost, stock } => {
                let prices = PriceTierSet::new(Money::new(price))?;
                let p = catalog::add_product(
                    state,
                    NewProduct {
                        sku,
                        name,
                        cost_per_kg: cost.map(Money::new),
                        initial_stock: Kilograms::new(stock),
                        prices,
                    },
                )
                .await?;
                emit(json, &[p][..], print_products)
            }
            ProductCmd::Price { product, tier, price, clear } => {
                let tier = PriceTier::new(tier)?;
                let price = match (price, clear) {
                    (Some(p), false) => Some(Money::new(p)),
                    (None, true) => None,
                    _ => return Err(ApiError::validation("Give a price or --clear")),
                };
                let p = catalog::set_price(state, &product, tier, price).await?;
                emit(json, &[p][..], print_products)
            }
            ProductCmd::Cost { product, cost } => {
                let p = catalog::set_cost(state, &product, cost.map(Money::new)).await?;
                emit(json, &[p][..], print_products)
            }
        },

        Command::Client(cmd) => match cmd {
            ClientCmd::List => emit(json, &catalog::list_clients(state).await?[..], print_clients),
            ClientCmd::Add { name, tier, credit_limit } => {
                let c = catalog::add_client(
                    state,
                    NewClient {
                        name,
                        default_tier: PriceTier::new(tier)?,
                        credit_limit: credit_limit.map(Money::new),
                    },
                )
                .await?;
                emit(json, &[c][..], print_clients)
            }
        },

        Command::Weigh { product, gross, tare, boxes, preview } => {
            let request = WeighRequest {
                product,
                tare,
                gross_weight: Kilograms::new(gross),
                box_count: boxes,
            };
            if preview {
                emit(json, &weighing::preview(state, request).await?, print_preview)
            } else {
                emit(json, &weighing::weigh(state, request).await?, print_weighed)
            }
        }

        Command::Order(cmd) => match cmd {
            OrderCmd::Show => emit(json, &order::show_draft(state).await?, print_draft),
            OrderCmd::Client { client } => emit(json, &order::set_client(state, client.as_deref()).await?, print_draft),
            OrderCmd::Tier { tier } => {
                let tier = tier.map(PriceTier::new).transpose()?;
                emit(json, &order::set_tier(state, tier).await?, print_draft)
            }
            OrderCmd::RemoveLine { line_id } => emit(json, &order::remove_line(state, &line_id).await?, print_draft),
            OrderCmd::Clear => emit(json, &order::clear_draft(state).await?, print_draft),
            OrderCmd::Commit => emit(json, &order::commit(state).await?, print_order),
            OrderCmd::Cancel { order: key } => emit(json, &order::cancel(state, &key).await?, print_order),
            OrderCmd::Get { order: key } => emit(json, &order::get_order(state, &key).await?, print_order),
            OrderCmd::List { limit } => emit(json, &order::list_orders(state, limit).await?[..], print_orders),
        },

        Command::Stock(cmd) => match cmd {
            StockCmd::Move { product, kind, quantity, reason } => {
                let m = inventory::move_stock(
                    state,
                    inventory::StockMoveRequest {
                        product,
                        kind,
                        quantity: Kilograms::new(quantity),
                        reason,
                    },
                )
                .await?;
                emit(json, &[m][..], print_movements)
            }
            StockCmd::History { product, limit } => {
                emit(json, &inventory::stock_history(state, &product, limit).await?[..], print_movements)
            }
        },

        Command::Report(ReportCmd::Margin { from, to }) => {
            let today = Utc::now().date_naive();
            let from = from.unwrap_or(today);
            let to = to.unwrap_or(from.max(today));
            emit(json, &report::margin_report(state, from, to).await?, print_margin)
        }
    }
}

fn decimal_arg(raw: &str) -> Result<Decimal, String> {
    parse_decimal("value", raw).map_err(|e| e.to_string())
}

/// Prints `value` as JSON or with the human renderer.
fn emit<T: Serialize + ?Sized>(json: bool, value: &T, human: impl FnOnce(&T)) -> ApiResult<()> {
    if json {
        let text = serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))?;
        println!("{}", text);
    } else {
        human(value);
    }
    Ok(())
}

// =============================================================================
// Human output
// =============================================================================

fn print_tares(tares: &[TareSpec]) {
    for t in tares {
        if t.is_piece_sale() {
            println!("{:<30} (piece sale, no tare)", t.name);
        } else {
            println!("{:<30} {:>8} kg", t.name, t.unit_weight);
        }
    }
}

fn print_products(products: &[Product]) {
    for p in products {
        let prices: Vec<String> = p
            .prices
            .entries()
            .iter()
            .map(|e| format!("{}={}", e.tier, e.price))
            .collect();
        println!(
            "{:<10} {:<28} {:>10} kg  {}",
            p.sku,
            p.name,
            p.current_stock,
            prices.join(" ")
        );
    }
}

fn print_clients(clients: &[Client]) {
    for c in clients {
        let limit = c.credit_limit.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{:<30} {}  credit {}", c.name, c.default_tier, limit);
    }
}

fn print_preview(p: &PreviewResponse) {
    println!(
        "{} / {}: {} kg × {}/kg = {}",
        p.product, p.tare, p.result.final_quantity, p.result.unit_price, p.result.total_price
    );
}

fn print_weighed(w: &WeighResponse) {
    let l = &w.line;
    println!(
        "+ {} ({}): {} kg × {}/kg = {}",
        l.name_snapshot, l.tare_name_snapshot, l.quantity, l.unit_price, l.line_total
    );
    println!("  {} lines, {} kg, subtotal {}", w.totals.line_count, w.totals.total_quantity, w.totals.subtotal);
}

fn print_lines(lines: &[bascula_core::OrderLine]) {
    for (i, l) in lines.iter().enumerate() {
        let boxes = if l.box_count > 0 {
            format!("{} x {}", l.box_count, l.tare_name_snapshot)
        } else {
            "pieza".to_string()
        };
        println!(
            "{:>3}. {:<28} {:<22} {:>10} kg {:>10} {:<3} {:>10}  [{}]",
            i + 1,
            l.name_snapshot,
            boxes,
            l.quantity,
            l.unit_price,
            l.price_tier.to_string(),
            l.line_total,
            l.id
        );
    }
}

fn print_draft(d: &DraftView) {
    if d.lines.is_empty() {
        println!("Order is empty ({})", d.totals.price_tier);
        return;
    }
    print_lines(&d.lines);
    println!(
        "     {} lines, {} kg, {}  subtotal {}",
        d.totals.line_count, d.totals.total_quantity, d.totals.price_tier, d.totals.subtotal
    );
}

fn print_order(o: &OrderView) {
    println!(
        "Folio {}  {:?}  {}  operator {}",
        o.order.folio, o.order.status, o.order.price_tier, o.order.operator
    );
    print_lines(&o.lines);
    println!("     subtotal {}", o.order.subtotal);
}

fn print_orders(orders: &[Order]) {
    for o in orders {
        println!(
            "{:<15} {:<10} {:>12}  {}",
            o.folio,
            format!("{:?}", o.status),
            o.subtotal.to_string(),
            o.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_movements(movements: &[StockMovement]) {
    for m in movements {
        println!(
            "{}  {:<8} {:>10} kg → {:>10} kg  {}{}",
            m.created_at.format("%Y-%m-%d %H:%M"),
            m.kind,
            m.delta,
            m.resulting_stock,
            m.reason.as_deref().unwrap_or(""),
            m.authorized_by
                .as_deref()
                .map(|a| format!(" (authorized by {})", a))
                .unwrap_or_default()
        );
    }
}

fn print_margin(r: &MarginReport) {
    let dash = || "-".to_string();
    for l in &r.lines {
        println!(
            "{:<10} {:<28} {:>10} kg {:>12} {:>12} {:>12} {:>8}",
            l.sku,
            l.name,
            l.quantity_sold,
            l.revenue.to_string(),
            l.cost.map(|c| c.to_string()).unwrap_or_else(dash),
            l.margin.map(|m| m.to_string()).unwrap_or_else(dash),
            l.margin_percent.map(|p| format!("{}%", p)).unwrap_or_else(dash),
        );
    }
    println!(
        "Revenue {}  cost {}  margin {}",
        r.total_revenue, r.total_cost, r.total_margin
    );
}
