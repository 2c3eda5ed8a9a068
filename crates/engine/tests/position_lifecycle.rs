mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{MemoryRepository, SYMBOL, buy_signal, config, harness, harness_with, sell_signal};
use configuration::PairConfig;
use core_types::{Direction, ExitReason, Kline, OrderSide, Signal, Trade, TradeStatus};
use engine::EngineError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn stored_open_trade(id: &str, minute: u32) -> Trade {
    Trade {
        id: id.to_string(),
        symbol: SYMBOL.to_string(),
        exchange: "binance".to_string(),
        direction: Direction::Long,
        entry_price: dec!(100),
        amount: dec!(0.1),
        status: TradeStatus::Open,
        open_time: Utc.with_ymd_and_hms(2024, 5, 1, 11, minute, 0).unwrap(),
        close_time: None,
        reason: "restored".to_string(),
        order_status: "FILLED".to_string(),
        exit_price: None,
        exit_reason: None,
        pnl_percent: None,
        pnl_amount: None,
    }
}

#[tokio::test]
async fn buy_opens_long_at_ticker_price() {
    let h = harness().await;

    let trade = h
        .manager
        .handle_signal(SYMBOL, &buy_signal())
        .await
        .unwrap()
        .expect("a trade should open");

    assert_eq!(trade.status, TradeStatus::Open);
    assert_eq!(trade.direction, Direction::Long);
    assert_eq!(trade.entry_price, dec!(100));
    assert_eq!(trade.amount, dec!(0.1));
    assert_eq!(trade.reason, buy_signal().reasoning);
    assert_eq!(h.exchange.orders()[0].side, OrderSide::Buy);
    assert_eq!(h.repository.trades(), vec![trade.clone()]);
    assert_eq!(h.manager.open_trade(SYMBOL).await, Some(trade));
}

#[tokio::test]
async fn second_buy_is_rejected_while_position_is_open() {
    let h = harness().await;

    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_some());
    h.clock.advance(Duration::hours(1));
    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_none());

    assert_eq!(h.exchange.orders().len(), 1);
    assert_eq!(h.manager.open_trades().await.len(), 1);
}

#[tokio::test]
async fn overlapping_buys_open_a_single_trade() {
    let h = harness().await;
    let signal = buy_signal();

    let (first, second) = tokio::join!(
        h.manager.open_position(SYMBOL, &signal),
        h.manager.open_position(SYMBOL, &signal),
    );

    let opened = [first.unwrap(), second.unwrap()]
        .into_iter()
        .flatten()
        .count();
    assert_eq!(opened, 1);
    assert_eq!(h.exchange.orders().len(), 1);
}

#[tokio::test]
async fn take_profit_closes_at_five_percent() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    h.exchange.set_price(dec!(105));
    let closed = h.manager.monitor_open_trades().await.unwrap();

    assert_eq!(closed.len(), 1);
    let trade = &closed[0];
    assert_eq!(trade.status, TradeStatus::Closed);
    assert_eq!(trade.exit_reason, Some(ExitReason::TakeProfit));
    assert_eq!(trade.exit_price, Some(dec!(105)));
    assert_eq!(trade.pnl_percent, Some(dec!(5.00)));
    assert_eq!(trade.pnl_amount, Some(dec!(0.5)));
    assert_eq!(h.exchange.orders()[1].side, OrderSide::Sell);
    assert_eq!(h.repository.trades()[0].status, TradeStatus::Closed);
    assert!(h.manager.open_trade(SYMBOL).await.is_none());
}

#[tokio::test]
async fn stop_loss_closes_at_minus_five_percent() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    h.exchange.set_price(dec!(95));
    let closed = h.manager.monitor_open_trades().await.unwrap();

    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].exit_reason, Some(ExitReason::StopLoss));
    assert_eq!(closed[0].pnl_percent, Some(dec!(-5.00)));
    assert_eq!(closed[0].pnl_amount, Some(dec!(-0.5)));
}

#[tokio::test]
async fn price_between_thresholds_keeps_trade_open() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    h.exchange.set_price(dec!(102));
    assert!(h.manager.monitor_open_trades().await.unwrap().is_empty());
    assert!(h.manager.open_trade(SYMBOL).await.is_some());
}

#[tokio::test]
async fn cancelled_order_leaves_state_untouched() {
    let h = harness().await;
    h.exchange.set_order_status("CANCELED");

    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_none());
    assert!(h.manager.open_trade(SYMBOL).await.is_none());
    assert!(h.repository.trades().is_empty());

    // A failed attempt does not start the cooldown.
    h.exchange.set_order_status("FILLED");
    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_some());
}

#[tokio::test]
async fn rejected_close_keeps_position_open() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    h.exchange.reject_orders(true);
    h.exchange.set_price(dec!(110));
    assert!(h.manager.monitor_open_trades().await.unwrap().is_empty());

    let trade = h.manager.open_trade(SYMBOL).await.expect("still open");
    assert_eq!(trade.status, TradeStatus::Open);
    assert_eq!(h.repository.trades()[0].status, TradeStatus::Open);
}

#[tokio::test]
async fn cooldown_blocks_reentry_until_it_expires() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();
    h.manager.close_position(SYMBOL).await.unwrap().expect("manual close");

    h.clock.advance(Duration::seconds(299));
    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_none());

    h.clock.advance(Duration::seconds(1));
    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_some());
}

#[tokio::test]
async fn sell_signal_closes_after_cooldown() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    assert!(h.manager.handle_signal(SYMBOL, &sell_signal()).await.unwrap().is_none());
    assert!(h.manager.open_trade(SYMBOL).await.is_some());

    h.clock.advance(Duration::minutes(5));
    h.exchange.set_price(dec!(101));
    let closed = h
        .manager
        .handle_signal(SYMBOL, &sell_signal())
        .await
        .unwrap()
        .expect("sell closes the position");
    assert_eq!(closed.exit_reason, Some(ExitReason::Signal));
    assert_eq!(closed.pnl_percent, Some(dec!(1.00)));
}

#[tokio::test]
async fn sell_without_position_places_no_order() {
    let h = harness().await;
    assert!(h.manager.handle_signal(SYMBOL, &sell_signal()).await.unwrap().is_none());
    assert!(h.exchange.orders().is_empty());
}

#[tokio::test]
async fn hold_does_nothing() {
    let h = harness().await;
    let outcome = h
        .manager
        .handle_signal(SYMBOL, &Signal::hold("no signal"))
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(h.exchange.orders().is_empty());
}

#[tokio::test]
async fn manual_close_ignores_cooldown() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    let closed = h.manager.close_position(SYMBOL).await.unwrap().expect("closed");
    assert_eq!(closed.exit_reason, Some(ExitReason::Manual));
    assert!(h.manager.close_position(SYMBOL).await.unwrap().is_none());
}

#[tokio::test]
async fn oversize_trade_amount_is_rejected_before_ordering() {
    let mut cfg = config();
    cfg.trading_pairs.insert(
        SYMBOL.to_string(),
        PairConfig {
            trade_amount: dec!(2),
            max_position_size: dec!(1),
            stop_loss_pct: dec!(5),
            take_profit_pct: dec!(5),
        },
    );
    let h = harness_with(cfg, MemoryRepository::default()).await;

    assert!(h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap().is_none());
    assert!(h.exchange.orders().is_empty());
}

#[tokio::test]
async fn unknown_symbol_is_an_error() {
    let h = harness().await;
    let outcome = h.manager.handle_signal("DOGEUSDC", &buy_signal()).await;
    assert!(matches!(outcome, Err(EngineError::UnknownSymbol(_))));
}

#[tokio::test]
async fn window_holds_at_most_24_ticks() {
    let h = harness().await;
    for i in 0..25 {
        h.manager
            .on_market_data(SYMBOL, Decimal::from(100 + i), dec!(1))
            .await
            .unwrap();
        h.clock.advance(Duration::minutes(1));
    }

    let state = h.manager.pair_state(SYMBOL).await.unwrap();
    assert_eq!(state.window().len(), 24);
    assert_eq!(state.window()[0].close, dec!(101));
}

#[tokio::test]
async fn exit_sweeps_are_rate_limited() {
    let h = harness().await;
    h.manager.handle_signal(SYMBOL, &buy_signal()).await.unwrap();

    h.exchange.set_price(dec!(101));
    assert!(h.manager.maybe_monitor().await.unwrap().is_empty());

    h.exchange.set_price(dec!(105));
    h.clock.advance(Duration::seconds(10));
    assert!(h.manager.maybe_monitor().await.unwrap().is_empty());

    h.clock.advance(Duration::seconds(50));
    assert_eq!(h.manager.maybe_monitor().await.unwrap().len(), 1);
}

#[tokio::test]
async fn poll_evaluates_fetched_klines_and_acts() {
    let h = harness().await;
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
    h.exchange.set_klines(
        (0..30)
            .map(|i| Kline::synthetic(dec!(100), dec!(7), start + Duration::minutes(i)))
            .collect(),
    );
    h.strategy.set(buy_signal());

    let trade = h.manager.poll_symbol(SYMBOL).await.unwrap().expect("opened");
    assert_eq!(trade.entry_price, dec!(100));
    assert_eq!(h.exchange.kline_requests(), 1);

    let state = h.manager.pair_state(SYMBOL).await.unwrap();
    assert_eq!(state.window().len(), 1);
    assert_eq!(state.window()[0].volume, dec!(7));
    assert_eq!(state.last_price, Some(dec!(100)));
}

#[tokio::test]
async fn restore_keeps_newest_open_trade_per_symbol() {
    let repository = MemoryRepository::with_trades(vec![
        stored_open_trade("older", 0),
        stored_open_trade("newer", 30),
    ]);
    let h = harness_with(config(), repository).await;

    assert_eq!(h.manager.restore_open_trades().await.unwrap(), 1);
    assert_eq!(h.manager.open_trade(SYMBOL).await.unwrap().id, "newer");

    // Restored trades are still subject to risk exits.
    h.exchange.set_price(dec!(95));
    let closed = h.manager.monitor_open_trades().await.unwrap();
    assert_eq!(closed[0].id, "newer");
}

#[tokio::test]
async fn restore_failure_is_fatal() {
    let repository = MemoryRepository::default();
    repository.fail_loads();
    let h = harness_with(config(), repository).await;

    let outcome = h.manager.restore_open_trades().await;
    assert!(matches!(outcome, Err(EngineError::Database(_))));
}

#[tokio::test]
async fn restore_skips_unusable_trades_and_sweep_still_closes_the_rest() {
    let mut empty = stored_open_trade("empty", 0);
    empty.symbol = "AAAUSDC".to_string();
    empty.amount = Decimal::ZERO;
    let repository = MemoryRepository::with_trades(vec![empty, stored_open_trade("good", 5)]);
    let h = harness_with(config(), repository).await;

    assert_eq!(h.manager.restore_open_trades().await.unwrap(), 1);
    assert_eq!(h.manager.open_trade("AAAUSDC").await, None);

    h.exchange.set_price(dec!(150));
    let closed = h.manager.monitor_open_trades().await.unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, "good");
    assert_eq!(closed[0].exit_reason, Some(ExitReason::TakeProfit));
    assert_eq!(h.manager.open_trade(SYMBOL).await, None);
}
