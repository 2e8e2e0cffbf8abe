//! Background expiry. Two independent loops poll the store and clear
//! state the foreground request path never does on its own: leases
//! whose visibility timeout has elapsed, and messages past retention.
//!
//! Mirrors the original service's two periodic callbacks rather than
//! a single merged loop, so the two periods can keep differing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tqs_store::Store;

use crate::clock::Clock;

#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    pub lease_sweep_period: Duration,
    pub message_sweep_period: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            lease_sweep_period: Duration::from_millis(2_500),
            message_sweep_period: Duration::from_millis(15_000),
        }
    }
}

/// Owns the two background sweeper tasks. Dropping it signals both
/// loops to stop; it does not block waiting for them to exit.
pub struct SweeperHandle {
    shutdown_tx: broadcast::Sender<()>,
    lease_task: JoinHandle<()>,
    message_task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
        self.lease_task.abort();
        self.message_task.abort();
    }
}

pub fn spawn<C: Clock + 'static>(store: Arc<Store>, clock: Arc<C>, config: SweeperConfig) -> SweeperHandle {
    let (shutdown_tx, _) = broadcast::channel(4);

    let lease_task = tokio::spawn(sweep_loop(
        "lease",
        Arc::clone(&store),
        Arc::clone(&clock),
        config.lease_sweep_period,
        shutdown_tx.subscribe(),
        |store, now| store.sweep_expired_leases(now),
    ));

    let message_task = tokio::spawn(sweep_loop(
        "message",
        store,
        clock,
        config.message_sweep_period,
        shutdown_tx.subscribe(),
        |store, now| store.sweep_expired_messages(now),
    ));

    SweeperHandle { shutdown_tx, lease_task, message_task }
}

async fn sweep_loop<C, F>(
    name: &'static str,
    store: Arc<Store>,
    clock: Arc<C>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    sweep: F,
) where
    C: Clock,
    F: Fn(&Store, f64) -> Result<usize, tqs_store::StoreError>,
{
    loop {
        tokio::select! {
            _ = tokio::time::sleep(period) => {
                match sweep(&store, clock.now()) {
                    Ok(0) => debug!(sweeper = name, "nothing to sweep"),
                    Ok(count) => info!(sweeper = name, count, "swept expired state"),
                    Err(error) => tracing::warn!(sweeper = name, %error, "sweep failed"),
                }
            }
            _ = shutdown_rx.recv() => {
                debug!(sweeper = name, "shutting down");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    #[tokio::test(start_paused = true)]
    async fn sweeper_clears_expired_leases_on_its_own_schedule() {
        let clock = Arc::new(FakeClock::new(1_000.0));
        let store = Arc::new(Store::open(":memory:", clock.now()).unwrap());
        store.create_queue("jobs", clock.now()).unwrap();
        let queue = store.get_queue_by_name("jobs").unwrap().unwrap();
        store
            .enqueue(
                queue.id,
                &[tqs_store::NewMessage {
                    create_date: clock.now(),
                    visible_date: clock.now(),
                    expire_date: clock.now() + 1_000.0,
                    body: "hi".into(),
                    media_type: tqs_common::model::MediaType::TextPlain,
                    priority: 50,
                }],
            )
            .unwrap();
        store.lease_candidates(queue.id, clock.now(), 1, 1).unwrap();

        let config = SweeperConfig {
            lease_sweep_period: Duration::from_millis(10),
            message_sweep_period: Duration::from_secs(3600),
        };
        let handle = spawn(Arc::clone(&store), Arc::clone(&clock), config);

        clock.advance(2.0);
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        let stats = store.stats(queue.id, clock.now()).unwrap();
        assert_eq!(stats.leased, 0);
        assert_eq!(stats.visible, 1);

        drop(handle);
    }
}
