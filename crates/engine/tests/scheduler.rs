mod common;

use common::{SYMBOL, buy_signal, harness};
use engine::Scheduler;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test(start_paused = true)]
async fn scheduler_polls_until_shutdown() {
    let h = harness().await;
    h.strategy.set(buy_signal());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = Scheduler::new(h.manager.clone(), &h.manager.config().system).spawn(shutdown_rx);

    // The first tick of every timer fires immediately.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.exchange.kline_requests(), 1);
    assert!(h.manager.open_trade(SYMBOL).await.is_some());

    // The next poll is due after the configured 300 s.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(h.exchange.kline_requests(), 2);

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task stops on shutdown")
            .unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_sender_stops_the_scheduler() {
    let h = harness().await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = Scheduler::new(h.manager.clone(), &h.manager.config().system).spawn(shutdown_rx);

    drop(shutdown_tx);
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task stops when the sender is gone")
            .unwrap();
    }
}
