use crate::manager::PositionManager;
use configuration::SystemConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

/// Drives the `PositionManager` on three independent timers: market polling,
/// risk-exit monitoring and dynamic-parameter refresh.
pub struct Scheduler {
    manager: Arc<PositionManager>,
    poll_every: Duration,
    monitor_every: Duration,
    refresh_every: Duration,
}

impl Scheduler {
    pub fn new(manager: Arc<PositionManager>, system: &SystemConfig) -> Self {
        Self {
            manager,
            poll_every: Duration::from_secs(system.polling_interval_secs),
            monitor_every: Duration::from_secs(system.monitor_interval_secs),
            refresh_every: Duration::from_secs(system.param_refresh_interval_secs),
        }
    }

    /// Spawns the three tasks. They all stop once `shutdown` flips to `true`
    /// or its sender is dropped.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        info!(
            poll_secs = self.poll_every.as_secs(),
            monitor_secs = self.monitor_every.as_secs(),
            refresh_secs = self.refresh_every.as_secs(),
            "Starting scheduler."
        );

        let poll_manager = Arc::clone(&self.manager);
        let monitor_manager = Arc::clone(&self.manager);
        let refresh_manager = Arc::clone(&self.manager);

        vec![
            tokio::spawn(every(self.poll_every, shutdown.clone(), "poll", move || {
                let manager = Arc::clone(&poll_manager);
                async move {
                    let changed = manager.poll_all().await;
                    if !changed.is_empty() {
                        info!(count = changed.len(), "Polling cycle changed positions.");
                    }
                    if let Err(e) = manager.maybe_monitor().await {
                        error!(error = %e, "Exit sweep failed.");
                    }
                }
            })),
            tokio::spawn(every(self.monitor_every, shutdown.clone(), "monitor", move || {
                let manager = Arc::clone(&monitor_manager);
                async move {
                    if let Err(e) = manager.maybe_monitor().await {
                        error!(error = %e, "Exit sweep failed.");
                    }
                }
            })),
            tokio::spawn(every(self.refresh_every, shutdown, "refresh", move || {
                let manager = Arc::clone(&refresh_manager);
                async move { manager.refresh_dynamic_params().await }
            })),
        ]
    }
}

/// Runs `job` on every tick of a timer with period `period`. Late ticks are
/// delayed rather than bursted.
async fn every<F, Fut>(period: Duration, mut shutdown: watch::Receiver<bool>, name: &'static str, job: F)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let mut ticker = interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => job().await,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    info!(task = name, "Scheduler task stopped.");
}
