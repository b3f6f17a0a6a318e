use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::info;

use retail_admin_lib::diagnostics;
use retail_admin_lib::filters::{
    CancellationFilter, DATE_FORMAT, FIELD_BRANCH, FIELD_CANCELLATION, FIELD_DATE_FROM,
    FIELD_DATE_TO, FIELD_REGISTER, FIELD_STATUS,
};
use retail_admin_lib::render::{render_page, Column, Identified, RowActionKind};
use retail_admin_lib::resources::{daily_sales, sales_orders, sync_requests, Screen};
use retail_admin_lib::{AdminClient, AppConfig, ListController, RecordId, Viewport};

/// Character cell width assumed when converting terminal columns to pixels.
const PX_PER_COLUMN: u32 = 8;
const FALLBACK_WIDTH_PX: u32 = 1024;

#[derive(Parser)]
#[command(name = "retail-admin")]
#[command(about = "Filtered, paged listings over the branch admin dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON config file (defaults to $RETAIL_ADMIN_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Viewport width in pixels; below 768 rows are printed as cards
    #[arg(long, global = true)]
    pub width: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sales orders with their cancellation situation
    Pedidos(ListArgs),

    /// Branch sync requests
    Sync(ListArgs),

    /// Daily sales per branch and register
    Vendas(ListArgs),

    /// Reset a sync request to pending and reload the list
    SyncRetry {
        id: String,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Delete a sync request and reload the list
    SyncDelete {
        id: String,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Print version and build information
    About,
}

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub filial: Option<i64>,

    #[arg(long)]
    pub caixa: Option<i64>,

    #[arg(long = "data-inicio", value_parser = parse_date)]
    pub data_inicio: Option<NaiveDate>,

    #[arg(long = "data-fim", value_parser = parse_date)]
    pub data_fim: Option<NaiveDate>,

    /// Cancellation situation for pedidos, job status for sync
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long)]
    pub page_size: Option<u32>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got {raw:?}"))
}

fn viewport(width: Option<u32>) -> Viewport {
    let px = width.unwrap_or_else(|| {
        terminal_size::terminal_size()
            .map(|(terminal_size::Width(w), _)| u32::from(w) * PX_PER_COLUMN)
            .unwrap_or(FALLBACK_WIDTH_PX)
    });
    Viewport::new(px)
}

/// Copy CLI filters into the screen's filter store. Unset flags keep the
/// screen defaults.
fn apply_args<T>(ctl: &mut ListController<T>, screen: Screen, args: &ListArgs) -> Result<()> {
    let filters = ctl.filters_mut();
    if let Some(branch) = args.filial {
        filters.set(FIELD_BRANCH, branch);
    }
    if let Some(register) = args.caixa {
        filters.set(FIELD_REGISTER, register);
    }
    if let Some(from) = args.data_inicio {
        filters.set(FIELD_DATE_FROM, from);
    }
    if let Some(to) = args.data_fim {
        filters.set(FIELD_DATE_TO, to);
    }
    if let Some(status) = args.status.as_deref() {
        match screen {
            Screen::SalesOrders => {
                let Some(situation) = CancellationFilter::parse(status) else {
                    bail!(
                        "unknown --status {status:?} (todos, sem_cancelados, com_cancelados, apenas_cancelados)"
                    );
                };
                filters.set(FIELD_CANCELLATION, situation);
            }
            Screen::SyncRequests => filters.set(FIELD_STATUS, status),
            Screen::DailySales => bail!("--status is not available for {}", screen.resource()),
        }
    }
    Ok(())
}

/// Mount the screen directly at the requested page.
async fn load<T: DeserializeOwned>(
    client: &AdminClient,
    ctl: &mut ListController<T>,
    args: &ListArgs,
) -> Result<()> {
    let ticket = ctl.mount_at(args.page)?;
    ctl.run(client, ticket).await?;
    Ok(())
}

fn print_page<T: Identified>(
    screen: Screen,
    ctl: &ListController<T>,
    columns: &[Column<T>],
    actions: &[RowActionKind],
    viewport: Viewport,
) {
    println!("{}", screen.title());
    println!();
    if let Some(page) = ctl.page() {
        print!("{}", render_page(page, columns, actions, viewport).to_text());
    }
    if let Some(notice) = ctl.notice().filter(|n| n.is_user_visible()) {
        eprintln!("{notice}");
    }
}

fn record_id(raw: &str) -> Result<RecordId> {
    if raw.trim().is_empty() {
        bail!("a sync request id is required");
    }
    Ok(RecordId::new(raw))
}

fn page_size(config: &AppConfig, args: &ListArgs) -> u32 {
    args.page_size.unwrap_or(config.page_size)
}

pub async fn run(cli: Cli) -> Result<()> {
    if matches!(cli.command, Commands::About) {
        println!("{}", serde_json::to_string_pretty(&diagnostics::get_about_info())?);
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = diagnostics::init_logging(&config);
    info!(admin_url = %config.admin_url, "retail-admin starting");

    let client = AdminClient::from_config(&config)?;
    let viewport = viewport(cli.width);
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Pedidos(args) => {
            let screen = Screen::SalesOrders;
            let mut ctl = sales_orders::controller(today, page_size(&config, &args));
            apply_args(&mut ctl, screen, &args)?;
            load(&client, &mut ctl, &args).await?;
            print_page(screen, &ctl, &sales_orders::columns(), sales_orders::ROW_ACTIONS, viewport);
        }
        Commands::Vendas(args) => {
            let screen = Screen::DailySales;
            let mut ctl = daily_sales::controller(today, page_size(&config, &args));
            apply_args(&mut ctl, screen, &args)?;
            load(&client, &mut ctl, &args).await?;
            print_page(screen, &ctl, &daily_sales::columns(), daily_sales::ROW_ACTIONS, viewport);
            if !ctl.items().is_empty() {
                println!("{}", daily_sales::page_totals(ctl.items()).footer());
            }
        }
        Commands::Sync(args) => {
            let screen = Screen::SyncRequests;
            let mut ctl = sync_requests::controller(page_size(&config, &args));
            apply_args(&mut ctl, screen, &args)?;
            load(&client, &mut ctl, &args).await?;
            print_page(screen, &ctl, &sync_requests::columns(), sync_requests::ROW_ACTIONS, viewport);
        }
        Commands::SyncRetry { id, list } => {
            let screen = Screen::SyncRequests;
            let mut ctl = sync_requests::controller(page_size(&config, &list));
            apply_args(&mut ctl, screen, &list)?;
            load(&client, &mut ctl, &list).await?;
            let id = record_id(&id)?;
            let ticket = sync_requests::retry(&mut ctl, &client, &id).await?;
            ctl.run(&client, ticket).await?;
            println!("Requisição {id} reenviada");
            print_page(screen, &ctl, &sync_requests::columns(), sync_requests::ROW_ACTIONS, viewport);
        }
        Commands::SyncDelete { id, list } => {
            let screen = Screen::SyncRequests;
            let mut ctl = sync_requests::controller(page_size(&config, &list));
            apply_args(&mut ctl, screen, &list)?;
            load(&client, &mut ctl, &list).await?;
            let id = record_id(&id)?;
            let ticket = sync_requests::delete(&mut ctl, &client, &id).await?;
            ctl.run(&client, ticket).await?;
            println!("Requisição {id} excluída");
            print_page(screen, &ctl, &sync_requests::columns(), sync_requests::ROW_ACTIONS, viewport);
        }
        Commands::About => {}
    }
    Ok(())
}
