#![allow(dead_code)]

use api_client::error::ApiError;
use api_client::{ApiClient, OrderResponse, Ticker};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use configuration::{Config, ExchangeConfig, PairConfig};
use core_types::{Kline, ManualClock, OrderRequest, Signal, Trade, TradePatch};
use database::{DbError, TradeRepository};
use engine::{EngineParts, PositionManager};
use executor::LiveExecutor;
use risk::SimpleRiskManager;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strategies::{Strategy, StrategyError};

pub const SYMBOL: &str = "SOLUSDC";

/// An exchange whose price, klines and order outcome are set by the test.
pub struct FakeExchange {
    price: Mutex<Decimal>,
    klines: Mutex<Vec<Kline>>,
    order_status: Mutex<&'static str>,
    reject_orders: AtomicBool,
    orders: Mutex<Vec<OrderRequest>>,
    kline_requests: AtomicUsize,
    next_id: AtomicI64,
}

impl FakeExchange {
    pub fn new(price: Decimal) -> Self {
        Self {
            price: Mutex::new(price),
            klines: Mutex::new(Vec::new()),
            order_status: Mutex::new("FILLED"),
            reject_orders: AtomicBool::new(false),
            orders: Mutex::new(Vec::new()),
            kline_requests: AtomicUsize::new(0),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn set_price(&self, price: Decimal) {
        *self.price.lock().unwrap() = price;
    }

    pub fn set_klines(&self, klines: Vec<Kline>) {
        *self.klines.lock().unwrap() = klines;
    }

    pub fn set_order_status(&self, status: &'static str) {
        *self.order_status.lock().unwrap() = status;
    }

    pub fn reject_orders(&self, reject: bool) {
        self.reject_orders.store(reject, Ordering::SeqCst);
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn kline_requests(&self) -> usize {
        self.kline_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiClient for FakeExchange {
    async fn get_ticker(&self, symbol: &str) -> Result<Ticker, ApiError> {
        Ok(Ticker {
            symbol: symbol.to_string(),
            last_price: *self.price.lock().unwrap(),
        })
    }

    async fn get_klines(
        &self,
        _symbol: &str,
        _interval: &str,
        _limit: u16,
    ) -> Result<Vec<Kline>, ApiError> {
        self.kline_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.klines.lock().unwrap().clone())
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError> {
        // Gives a concurrent caller the chance to interleave.
        tokio::task::yield_now().await;
        self.orders.lock().unwrap().push(order.clone());

        if self.reject_orders.load(Ordering::SeqCst) {
            return Err(ApiError::Exchange {
                code: -2010,
                msg: "Account has insufficient balance for requested action.".to_string(),
            });
        }

        let price = *self.price.lock().unwrap();
        Ok(OrderResponse {
            symbol: order.symbol.clone(),
            order_id: self.next_id.fetch_add(1, Ordering::SeqCst),
            client_order_id: order.client_order_id.to_string(),
            transact_time: Utc::now().timestamp_millis(),
            orig_qty: order.quantity,
            executed_qty: order.quantity,
            cumulative_quote_qty: order.quantity * price,
            status: self.order_status.lock().unwrap().to_string(),
            order_type: "MARKET".to_string(),
            side: format!("{:?}", order.side).to_uppercase(),
            fills: Vec::new(),
        })
    }
}

/// Trade store kept in memory.
#[derive(Default)]
pub struct MemoryRepository {
    trades: Mutex<Vec<Trade>>,
    fail_loads: AtomicBool,
}

impl MemoryRepository {
    pub fn with_trades(trades: Vec<Trade>) -> Self {
        Self {
            trades: Mutex::new(trades),
            fail_loads: AtomicBool::new(false),
        }
    }

    pub fn fail_loads(&self) {
        self.fail_loads.store(true, Ordering::SeqCst);
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.trades.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeRepository for MemoryRepository {
    async fn record_trade(&self, trade: &Trade) -> Result<bool, DbError> {
        let mut trades = self.trades.lock().unwrap();
        if trades.iter().any(|t| t.id == trade.id) {
            return Ok(false);
        }
        trades.push(trade.clone());
        Ok(true)
    }

    async fn update_trade(
        &self,
        symbol: &str,
        exchange: &str,
        id: &str,
        patch: &TradePatch,
    ) -> Result<(), DbError> {
        let mut trades = self.trades.lock().unwrap();
        let trade = trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DbError::NotFound {
                exchange: exchange.to_string(),
                symbol: symbol.to_string(),
                id: id.to_string(),
            })?;
        trade.apply(patch);
        Ok(())
    }

    async fn load_open_trades(&self, exchange: &str) -> Result<Vec<Trade>, DbError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(DbError::Io(std::io::Error::other("disk unavailable")));
        }
        Ok(self
            .trades()
            .into_iter()
            .filter(|t| t.exchange == exchange && t.is_open())
            .collect())
    }

    async fn load_trades(
        &self,
        exchange: &str,
        symbol: Option<&str>,
    ) -> Result<Vec<Trade>, DbError> {
        Ok(self
            .trades()
            .into_iter()
            .filter(|t| t.exchange == exchange && symbol.is_none_or(|s| t.symbol == s))
            .collect())
    }
}

/// Always answers with the signal the test put in.
pub struct StubStrategy {
    signal: Mutex<Signal>,
}

impl StubStrategy {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal: Mutex::new(signal),
        }
    }

    pub fn set(&self, signal: Signal) {
        *self.signal.lock().unwrap() = signal;
    }
}

impl Strategy for StubStrategy {
    fn evaluate(&self, _klines: &[Kline]) -> Result<Signal, StrategyError> {
        Ok(self.signal.lock().unwrap().clone())
    }
}

pub struct Harness {
    pub manager: Arc<PositionManager>,
    pub exchange: Arc<FakeExchange>,
    pub repository: Arc<MemoryRepository>,
    pub clock: Arc<ManualClock>,
    pub strategy: Arc<StubStrategy>,
}

pub fn config() -> Config {
    Config {
        exchange: ExchangeConfig {
            name: "binance".to_string(),
            base_url: "https://api.binance.com".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            live_trading_enabled: false,
        },
        system: Default::default(),
        indicators: Default::default(),
        trading_pairs: HashMap::from([(
            SYMBOL.to_string(),
            PairConfig {
                trade_amount: dec!(0.1),
                max_position_size: dec!(1),
                stop_loss_pct: dec!(5),
                take_profit_pct: dec!(5),
            },
        )]),
        default_pair: PairConfig::default(),
        storage: Default::default(),
        logging: Default::default(),
    }
}

pub async fn harness() -> Harness {
    harness_with(config(), MemoryRepository::default()).await
}

pub async fn harness_with(config: Config, repository: MemoryRepository) -> Harness {
    let exchange = Arc::new(FakeExchange::new(dec!(100)));
    let repository = Arc::new(repository);
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    ));
    let strategy = Arc::new(StubStrategy::new(Signal::hold("no signal")));

    let manager = PositionManager::new(
        config,
        EngineParts {
            api_client: exchange.clone(),
            executor: Arc::new(LiveExecutor::new(exchange.clone(), Duration::from_secs(10))),
            repository: repository.clone(),
            strategy: strategy.clone(),
            risk_manager: Arc::new(SimpleRiskManager::new()),
            clock: clock.clone(),
        },
    );
    manager.add_trading_pair(SYMBOL).await;

    Harness {
        manager: Arc::new(manager),
        exchange,
        repository,
        clock,
        strategy,
    }
}

pub fn buy_signal() -> Signal {
    Signal {
        decision: core_types::Decision::Buy,
        confidence: 0.3,
        reasoning: "Triggered 1 buy condition(s): RSI oversold with MACD turning positive".to_string(),
        triggered_conditions: vec!["RSI oversold with MACD turning positive".to_string()],
    }
}

pub fn sell_signal() -> Signal {
    Signal {
        decision: core_types::Decision::Sell,
        confidence: 0.1,
        reasoning: "Triggered 1 sell condition(s): RSI overbought with MACD turning negative"
            .to_string(),
        triggered_conditions: vec!["RSI overbought with MACD turning negative".to_string()],
    }
}
