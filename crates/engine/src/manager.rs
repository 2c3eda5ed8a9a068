use crate::error::EngineError;
use crate::state::TradingPairState;
use api_client::ApiClient;
use chrono::{DateTime, TimeDelta, Utc};
use configuration::Config;
use core_types::{
    Clock, Decision, Direction, Execution, ExitReason, OrderRequest, Signal, Trade, TradeStatus,
};
use database::TradeRepository;
use executor::Executor;
use futures::future::join_all;
use risk::RiskManager;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strategies::Strategy;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// The collaborators a `PositionManager` drives.
pub struct EngineParts {
    pub api_client: Arc<dyn ApiClient>,
    pub executor: Arc<dyn Executor>,
    pub repository: Arc<dyn TradeRepository>,
    pub strategy: Arc<dyn Strategy>,
    pub risk_manager: Arc<dyn RiskManager>,
    pub clock: Arc<dyn Clock>,
}

/// Everything the manager knows about one symbol. Guarded by the symbol's own
/// lock, which is held across every open/close transition.
struct SymbolSlot {
    state: TradingPairState,
    open_trade: Option<Trade>,
    last_trade_at: Option<DateTime<Utc>>,
}

/// Owns the per-symbol trade state machine: admission control, opening on BUY,
/// closing on SELL, risk exits and manual closes.
///
/// Exchange and order failures never escape as errors. They are logged and
/// reported as `Ok(None)` with the symbol's state untouched.
pub struct PositionManager {
    config: Config,
    api_client: Arc<dyn ApiClient>,
    executor: Arc<dyn Executor>,
    repository: Arc<dyn TradeRepository>,
    strategy: Arc<dyn Strategy>,
    risk_manager: Arc<dyn RiskManager>,
    clock: Arc<dyn Clock>,
    slots: RwLock<HashMap<String, Arc<Mutex<SymbolSlot>>>>,
    last_monitor_at: Mutex<Option<DateTime<Utc>>>,
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

impl PositionManager {
    pub fn new(config: Config, parts: EngineParts) -> Self {
        Self {
            config,
            api_client: parts.api_client,
            executor: parts.executor,
            repository: parts.repository,
            strategy: parts.strategy,
            risk_manager: parts.risk_manager,
            clock: parts.clock,
            slots: RwLock::new(HashMap::new()),
            last_monitor_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn exchange(&self) -> &str {
        &self.config.exchange.name
    }

    /// Starts tracking `symbol`. Returns `false` if it was already tracked.
    pub async fn add_trading_pair(&self, symbol: &str) -> bool {
        let mut slots = self.slots.write().await;
        if slots.contains_key(symbol) {
            return false;
        }

        let state = TradingPairState::new(
            symbol,
            self.exchange(),
            self.config.system.window_capacity,
        );
        slots.insert(
            symbol.to_string(),
            Arc::new(Mutex::new(SymbolSlot {
                state,
                open_trade: None,
                last_trade_at: None,
            })),
        );
        info!(%symbol, "Tracking trading pair.");
        true
    }

    pub async fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.slots.read().await.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub async fn open_trade(&self, symbol: &str) -> Option<Trade> {
        let handle = self.slot(symbol).await.ok()?;
        let slot = handle.lock().await;
        slot.open_trade.clone()
    }

    pub async fn open_trades(&self) -> Vec<Trade> {
        let mut trades = Vec::new();
        for (_, handle) in self.slot_handles().await {
            if let Some(trade) = &handle.lock().await.open_trade {
                trades.push(trade.clone());
            }
        }
        trades
    }

    /// A copy of the symbol's rolling market state.
    pub async fn pair_state(&self, symbol: &str) -> Option<TradingPairState> {
        let handle = self.slot(symbol).await.ok()?;
        let slot = handle.lock().await;
        Some(slot.state.clone())
    }

    async fn slot(&self, symbol: &str) -> Result<Arc<Mutex<SymbolSlot>>, EngineError> {
        self.slots
            .read()
            .await
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    async fn slot_handles(&self) -> Vec<(String, Arc<Mutex<SymbolSlot>>)> {
        let mut handles: Vec<_> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(symbol, handle)| (symbol.clone(), Arc::clone(handle)))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        handles
    }

    /// Time left before the symbol may trade again, if any.
    fn cooldown_remaining(&self, slot: &SymbolSlot, now: DateTime<Utc>) -> Option<TimeDelta> {
        let cooldown = to_delta(Duration::from_secs(self.config.system.min_trade_interval_secs));
        let elapsed = now - slot.last_trade_at?;
        (elapsed < cooldown).then(|| cooldown - elapsed)
    }

    async fn fetch_price(&self, symbol: &str) -> Option<Decimal> {
        match self.api_client.get_ticker(symbol).await {
            Ok(ticker) if ticker.last_price > Decimal::ZERO => Some(ticker.last_price),
            Ok(ticker) => {
                warn!(%symbol, price = %ticker.last_price, "Ignoring non-positive ticker price.");
                None
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Failed to fetch ticker.");
                None
            }
        }
    }

    async fn execute(&self, order: &OrderRequest, price: Decimal) -> Option<Execution> {
        match self.executor.execute(order, price).await {
            Ok(execution) => Some(execution),
            Err(e) => {
                warn!(
                    symbol = %order.symbol,
                    side = ?order.side,
                    quantity = %order.quantity,
                    error = %e,
                    "Order failed; position state unchanged."
                );
                None
            }
        }
    }

    /// Appends the latest tick to the symbol's rolling window.
    pub async fn on_market_data(
        &self,
        symbol: &str,
        price: Decimal,
        volume: Decimal,
    ) -> Result<(), EngineError> {
        let handle = self.slot(symbol).await?;
        let mut slot = handle.lock().await;
        slot.state.record_tick(price, volume, self.clock.now());
        Ok(())
    }

    /// Acts on a signal: BUY opens, SELL closes an open position, HOLD does nothing.
    pub async fn handle_signal(
        &self,
        symbol: &str,
        signal: &Signal,
    ) -> Result<Option<Trade>, EngineError> {
        match signal.decision {
            Decision::Hold => {
                debug!(%symbol, reasoning = %signal.reasoning, "Holding.");
                Ok(None)
            }
            Decision::Buy => self.open_position(symbol, signal).await,
            Decision::Sell => self.close_on_signal(symbol).await,
        }
    }

    /// Opens a long position for `symbol` if admission control allows it.
    pub async fn open_position(
        &self,
        symbol: &str,
        signal: &Signal,
    ) -> Result<Option<Trade>, EngineError> {
        let handle = self.slot(symbol).await?;
        let mut slot = handle.lock().await;

        if let Some(trade) = &slot.open_trade {
            info!(%symbol, trade_id = %trade.id, "Position already open; ignoring BUY.");
            return Ok(None);
        }
        if let Some(remaining) = self.cooldown_remaining(&slot, self.clock.now()) {
            info!(
                %symbol,
                remaining_secs = remaining.num_seconds(),
                "Symbol is cooling down; ignoring BUY."
            );
            return Ok(None);
        }

        let quantity = match self.risk_manager.entry_quantity(self.config.pair(symbol)) {
            Ok(quantity) => quantity,
            Err(e) => {
                warn!(%symbol, error = %e, "Entry rejected by the risk manager.");
                return Ok(None);
            }
        };
        let Some(price) = self.fetch_price(symbol).await else {
            return Ok(None);
        };

        let direction = Direction::Long;
        let order = OrderRequest::market(symbol, direction.entry_side(), quantity)?;
        let Some(execution) = self.execute(&order, price).await else {
            return Ok(None);
        };

        let opened_at = self.clock.now();
        let trade = Trade {
            id: execution.client_order_id.to_string(),
            symbol: symbol.to_string(),
            exchange: self.exchange().to_string(),
            direction,
            entry_price: price,
            amount: execution.quantity,
            status: TradeStatus::Open,
            open_time: opened_at,
            close_time: None,
            reason: signal.reasoning.clone(),
            order_status: execution.status.clone(),
            exit_price: None,
            exit_reason: None,
            pnl_percent: None,
            pnl_amount: None,
        };
        slot.open_trade = Some(trade.clone());
        slot.last_trade_at = Some(opened_at);

        info!(
            %symbol,
            trade_id = %trade.id,
            order_id = %execution.order_id,
            entry_price = %trade.entry_price,
            amount = %trade.amount,
            confidence = signal.confidence,
            "Opened position."
        );

        match self.repository.record_trade(&trade).await {
            Ok(true) => {}
            Ok(false) => warn!(trade_id = %trade.id, "Trade store already held this trade."),
            Err(e) => error!(trade_id = %trade.id, error = %e, "Failed to persist opened trade."),
        }
        Ok(Some(trade))
    }

    async fn close_on_signal(&self, symbol: &str) -> Result<Option<Trade>, EngineError> {
        let handle = self.slot(symbol).await?;
        let mut slot = handle.lock().await;

        if slot.open_trade.is_none() {
            debug!(%symbol, "SELL signal without an open position; nothing to close.");
            return Ok(None);
        }
        if let Some(remaining) = self.cooldown_remaining(&slot, self.clock.now()) {
            info!(
                %symbol,
                remaining_secs = remaining.num_seconds(),
                "Symbol is cooling down; ignoring SELL."
            );
            return Ok(None);
        }

        let Some(price) = self.fetch_price(symbol).await else {
            return Ok(None);
        };
        self.close_locked(&mut slot, price, ExitReason::Signal).await
    }

    /// Closes the symbol's open position at market, ignoring the cooldown.
    pub async fn close_position(&self, symbol: &str) -> Result<Option<Trade>, EngineError> {
        let handle = self.slot(symbol).await?;
        let mut slot = handle.lock().await;

        if slot.open_trade.is_none() {
            warn!(%symbol, "Close requested but no position is open.");
            return Ok(None);
        }
        let Some(price) = self.fetch_price(symbol).await else {
            return Ok(None);
        };
        self.close_locked(&mut slot, price, ExitReason::Manual).await
    }

    async fn close_locked(
        &self,
        slot: &mut SymbolSlot,
        price: Decimal,
        reason: ExitReason,
    ) -> Result<Option<Trade>, EngineError> {
        let Some(trade) = slot.open_trade.as_ref() else {
            warn!(symbol = %slot.state.symbol, %reason, "No open trade to close.");
            return Ok(None);
        };

        trade.pnl_at(price)?;
        let order = OrderRequest::market(&trade.symbol, trade.direction.exit_side(), trade.amount)?;
        let Some(execution) = self.execute(&order, price).await else {
            return Ok(None);
        };

        let closed_at = self.clock.now();
        let patch = trade.close_patch(price, reason, closed_at)?;
        let mut closed = trade.clone();
        closed.apply(&patch);
        slot.open_trade = None;
        slot.last_trade_at = Some(closed_at);

        info!(
            symbol = %closed.symbol,
            trade_id = %closed.id,
            order_id = %execution.order_id,
            exit_price = %patch.exit_price,
            %reason,
            pnl_percent = %patch.pnl_percent,
            pnl_amount = %patch.pnl_amount,
            "Closed position."
        );

        if let Err(e) = self
            .repository
            .update_trade(&closed.symbol, &closed.exchange, &closed.id, &patch)
            .await
        {
            error!(trade_id = %closed.id, error = %e, "Failed to persist closed trade.");
        }
        Ok(Some(closed))
    }

    /// Checks every open trade against its take-profit and stop-loss and
    /// closes those that crossed a threshold.
    pub async fn monitor_open_trades(&self) -> Result<Vec<Trade>, EngineError> {
        let mut closed = Vec::new();

        for (symbol, handle) in self.slot_handles().await {
            let mut slot = handle.lock().await;
            let Some(trade) = slot.open_trade.clone() else {
                continue;
            };
            let Some(price) = self.fetch_price(&symbol).await else {
                continue;
            };

            let exit = match self
                .risk_manager
                .assess_exit(&trade, price, self.config.pair(&symbol))
            {
                Ok(exit) => exit,
                Err(e) => {
                    warn!(%symbol, trade_id = %trade.id, error = %e, "Exit check failed.");
                    continue;
                }
            };

            if let Some(exit) = exit {
                info!(
                    %symbol,
                    trade_id = %trade.id,
                    reason = %exit.reason,
                    pnl_percent = %exit.pnl.percent.round_dp(2),
                    "Exit threshold crossed."
                );
                match self.close_locked(&mut slot, price, exit.reason).await {
                    Ok(Some(trade)) => closed.push(trade),
                    Ok(None) => {}
                    Err(e) => warn!(
                        %symbol,
                        trade_id = %trade.id,
                        error = %e,
                        "Exit close failed; position left open."
                    ),
                }
            }
        }

        Ok(closed)
    }

    /// Runs `monitor_open_trades` unless a sweep already ran within
    /// `analysis_interval_secs`.
    pub async fn maybe_monitor(&self) -> Result<Vec<Trade>, EngineError> {
        let now = self.clock.now();
        let spacing = to_delta(Duration::from_secs(self.config.system.analysis_interval_secs));
        // Timer jitter would otherwise skip every other tick when both intervals match.
        let slack = TimeDelta::milliseconds(500);

        {
            let mut last = self.last_monitor_at.lock().await;
            if let Some(previous) = *last {
                if now - previous + slack < spacing {
                    debug!("Skipping exit sweep; the last one is too recent.");
                    return Ok(Vec::new());
                }
            }
            *last = Some(now);
        }

        self.monitor_open_trades().await
    }

    /// Fetches fresh klines, evaluates the strategy on them, records the tick
    /// and acts on the resulting signal.
    pub async fn poll_symbol(&self, symbol: &str) -> Result<Option<Trade>, EngineError> {
        let system = &self.config.system;
        let klines = match self
            .api_client
            .get_klines(symbol, &system.kline_interval, system.kline_limit)
            .await
        {
            Ok(klines) => klines,
            Err(e) => {
                warn!(%symbol, error = %e, "Failed to fetch klines.");
                return Ok(None);
            }
        };

        let signal = self.strategy.evaluate(&klines)?;
        let Some(price) = self.fetch_price(symbol).await else {
            return Ok(None);
        };
        let volume = klines.last().map_or(Decimal::ZERO, |k| k.volume);
        self.on_market_data(symbol, price, volume).await?;

        info!(
            %symbol,
            %price,
            decision = %signal.decision,
            confidence = signal.confidence,
            conditions = ?signal.triggered_conditions,
            "Evaluated market."
        );
        self.handle_signal(symbol, &signal).await
    }

    /// Polls every tracked symbol concurrently. Per-symbol failures are logged.
    pub async fn poll_all(&self) -> Vec<Trade> {
        let symbols = self.symbols().await;
        let results = join_all(symbols.iter().map(|symbol| self.poll_symbol(symbol))).await;

        let mut changed = Vec::new();
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(Some(trade)) => changed.push(trade),
                Ok(None) => {}
                Err(e) => error!(%symbol, error = %e, "Polling cycle failed."),
            }
        }
        changed
    }

    /// Recomputes every pair's volatility-scaled parameters from its window.
    pub async fn refresh_dynamic_params(&self) {
        for (symbol, handle) in self.slot_handles().await {
            let mut slot = handle.lock().await;
            let params = slot.state.refresh_dynamic_params();
            debug!(
                %symbol,
                rsi_lower = params.rsi_lower_threshold,
                rsi_upper = params.rsi_upper_threshold,
                stop_loss = params.stop_loss_pct,
                take_profit = params.take_profit_pct,
                "Refreshed dynamic parameters."
            );
        }
    }

    /// Loads persisted open trades into memory. Meant to run once before the
    /// scheduler starts; a storage failure here is fatal.
    pub async fn restore_open_trades(&self) -> Result<usize, EngineError> {
        let trades = self.repository.load_open_trades(self.exchange()).await?;

        let mut newest: HashMap<String, Trade> = HashMap::new();
        for trade in trades {
            if trade.amount <= Decimal::ZERO || trade.entry_price <= Decimal::ZERO {
                warn!(
                    symbol = %trade.symbol,
                    trade_id = %trade.id,
                    amount = %trade.amount,
                    entry_price = %trade.entry_price,
                    "Skipping stored open trade with a non-positive amount or entry price."
                );
                continue;
            }
            if let Some(kept) = newest.get(&trade.symbol) {
                warn!(
                    symbol = %trade.symbol,
                    first = %kept.id,
                    second = %trade.id,
                    "Several open trades stored for one symbol; keeping the newest."
                );
                if kept.open_time >= trade.open_time {
                    continue;
                }
            }
            newest.insert(trade.symbol.clone(), trade);
        }

        let restored = newest.len();
        for (symbol, trade) in newest {
            self.add_trading_pair(&symbol).await;
            let handle = self.slot(&symbol).await?;
            let mut slot = handle.lock().await;
            info!(%symbol, trade_id = %trade.id, entry_price = %trade.entry_price, "Restored open trade.");
            slot.last_trade_at = Some(trade.open_time);
            slot.open_trade = Some(trade);
        }
        Ok(restored)
    }
}
