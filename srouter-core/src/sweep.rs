use crate::{Router, Transmit};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// How often the ARP cache is swept for retries and expired entries
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns a task on the current tokio runtime that sweeps the router's ARP cache every
/// `SWEEP_INTERVAL` for as long as the router lives. The first sweep happens one interval after
/// the task starts.
pub fn spawn_arp_sweeper<T>(router: Arc<Router<T>>) -> JoinHandle<()>
where
    T: Transmit + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        debug!(interval = ?SWEEP_INTERVAL, "ARP sweeper started");
        loop {
            ticker.tick().await;
            router.sweep_arp(Instant::now());
        }
    })
}
