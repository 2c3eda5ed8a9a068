use anyhow::{Context, bail};
use api_client::{ApiClient, BinanceSpotClient};
use clap::{Parser, Subcommand};
use configuration::{Config, init_tracing, load_config};
use core_types::SystemClock;
use database::{CsvTradeRepository, TradeRepository};
use engine::{EngineParts, PositionManager, Scheduler};
use executor::{Executor, LiveExecutor, SimulatedExecutor};
use risk::SimpleRiskManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use strategies::{RuleBasedStrategy, Strategy};
use tokio::sync::watch;
use tracing::{info, warn};

mod report;

use report::{MarketReport, trades_table};

/// The main entry point for the spot trading bot.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys usually live in .env; a missing file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Run => handle_run(config, cli.paper).await,
        Commands::Analyze(args) => handle_analyze(config, args).await,
        Commands::Close(args) => handle_close(config, cli.paper, args).await,
        Commands::Trades(args) => handle_trades(config, cli.paper, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// An indicator-driven spot trading bot.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Simulate fills even when live trading is enabled in the configuration.
    #[arg(long, global = true)]
    paper: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the market and manage positions until Ctrl-C.
    Run,
    /// Print the current indicator readings and signal for a symbol.
    Analyze(AnalyzeArgs),
    /// Close the open position of a symbol at market.
    Close(CloseArgs),
    /// List recorded trades.
    Trades(TradesArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// The symbol to analyze (e.g., "SOLUSDC").
    #[arg(long)]
    symbol: String,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct CloseArgs {
    /// The symbol whose position should be closed.
    #[arg(long)]
    symbol: String,
}

#[derive(Parser)]
struct TradesArgs {
    /// Only list trades of this symbol.
    #[arg(long)]
    symbol: Option<String>,

    /// Only list trades that are still open.
    #[arg(long)]
    open: bool,
}

// ==============================================================================
// Wiring
// ==============================================================================

fn is_simulated(config: &Config, paper: bool) -> bool {
    paper || !config.exchange.live_trading_enabled
}

/// Simulated trades are kept apart from live ones.
fn trade_repository(config: &Config, paper: bool) -> CsvTradeRepository {
    let root = &config.storage.trades_dir;
    if is_simulated(config, paper) {
        CsvTradeRepository::new(root.join("paper"))
    } else {
        CsvTradeRepository::new(root)
    }
}

async fn build_manager(config: Config, paper: bool) -> anyhow::Result<Arc<PositionManager>> {
    let api_client: Arc<dyn ApiClient> = Arc::new(BinanceSpotClient::new(&config.exchange)?);

    let executor: Arc<dyn Executor> = if is_simulated(&config, paper) {
        info!("Paper trading: orders are filled by the simulator.");
        Arc::new(SimulatedExecutor::new())
    } else {
        warn!("LIVE TRADING ENABLED: orders will be sent to the exchange.");
        Arc::new(LiveExecutor::new(
            Arc::clone(&api_client),
            Duration::from_secs(config.system.order_timeout_secs),
        ))
    };

    let repository = Arc::new(trade_repository(&config, paper));
    let strategy = Arc::new(RuleBasedStrategy::new(config.indicators.clone())?);
    let mut symbols: Vec<String> = config.trading_pairs.keys().cloned().collect();
    symbols.sort();

    let manager = PositionManager::new(
        config,
        EngineParts {
            api_client,
            executor,
            repository,
            strategy,
            risk_manager: Arc::new(SimpleRiskManager::new()),
            clock: Arc::new(SystemClock),
        },
    );
    for symbol in &symbols {
        manager.add_trading_pair(symbol).await;
    }
    Ok(Arc::new(manager))
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_run(config: Config, paper: bool) -> anyhow::Result<()> {
    if config.trading_pairs.is_empty() {
        bail!("no trading pairs configured; add a [trading_pairs.<SYMBOL>] section");
    }

    let manager = build_manager(config, paper).await?;
    let restored = manager
        .restore_open_trades()
        .await
        .context("failed to restore open trades")?;
    info!(restored, symbols = ?manager.symbols().await, "Engine ready.");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = Scheduler::new(Arc::clone(&manager), &manager.config().system).spawn(shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested; waiting for running cycles to finish.");
    // Receivers may already be gone if every task ended on its own.
    let _ = shutdown_tx.send(true);

    for handle in handles {
        handle.await?;
    }

    let open = manager.open_trades().await;
    if !open.is_empty() {
        warn!(count = open.len(), "Positions remain open; they will be restored on the next run.");
    }
    Ok(())
}

async fn handle_analyze(config: Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    let symbol = args.symbol.to_uppercase();
    let client = BinanceSpotClient::new(&config.exchange)?;
    let klines = client
        .get_klines(&symbol, &config.system.kline_interval, config.system.kline_limit)
        .await
        .with_context(|| format!("failed to fetch klines for {symbol}"))?;

    let strategy = RuleBasedStrategy::new(config.indicators.clone())?;
    let signal = strategy.evaluate(&klines)?;

    let Some(report) = MarketReport::build(
        &symbol,
        &klines,
        &config.indicators,
        config.system.window_capacity,
        signal,
    )?
    else {
        bail!(
            "only {} candles available for {symbol}; not enough for an analysis",
            klines.len()
        );
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_table());
    }
    Ok(())
}

async fn handle_close(config: Config, paper: bool, args: CloseArgs) -> anyhow::Result<()> {
    let symbol = args.symbol.to_uppercase();
    let manager = build_manager(config, paper).await?;
    manager.add_trading_pair(&symbol).await;
    manager
        .restore_open_trades()
        .await
        .context("failed to load open trades")?;

    match manager.close_position(&symbol).await? {
        Some(trade) => println!("{}", trades_table(&[trade])),
        None => println!("No position was closed for {symbol}."),
    }
    Ok(())
}

async fn handle_trades(config: Config, paper: bool, args: TradesArgs) -> anyhow::Result<()> {
    let repository = trade_repository(&config, paper);
    let symbol = args.symbol.map(|s| s.to_uppercase());

    let mut trades = repository
        .load_trades(&config.exchange.name, symbol.as_deref())
        .await
        .context("failed to read the trade store")?;
    if args.open {
        trades.retain(|t| t.is_open());
    }

    if trades.is_empty() {
        println!("No trades recorded.");
    } else {
        println!("{}", trades_table(&trades));
    }
    Ok(())
}
