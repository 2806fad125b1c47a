use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::reconcile::Reconciler;

/// Single per-process reconciliation loop.
///
/// Ticks run back to back at most once per `interval`; a slow tick delays
/// the next one instead of piling up. Cancelling the token stops the loop
/// between ticks or abandons the tick in flight.
pub struct ReconcileWorker {
    reconciler: Arc<Reconciler>,
    interval: Duration,
}

impl ReconcileWorker {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Long-running loop. Returns when `cancel` is cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        info!(interval = ?self.interval, "Reconciliation worker started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Reconciliation tick abandoned on shutdown");
                    break;
                }
                reports = self.reconciler.tick_all() => {
                    let failed = reports.iter().filter(|r| !r.is_clean()).count();
                    if failed > 0 {
                        warn!(tenants = reports.len(), failed, "Reconciliation tick had failing passes");
                    } else {
                        debug!(tenants = reports.len(), "Reconciliation tick complete");
                    }
                }
            }
        }

        info!("Reconciliation worker stopped");
        Ok(())
    }

    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<anyhow::Result<()>> {
        tokio::spawn(self.run(cancel))
    }
}
