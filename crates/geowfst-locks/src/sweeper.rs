//! Background expiry sweeping.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::LockSessionStore;

/// Interval between expiry sweeps when the caller does not choose one.
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Periodically deletes expired lock sessions until shut down.
///
/// The task waits a full period before the first sweep, then repeats.
/// Dropping the handle without calling [`SweepTask::shutdown`] leaves the
/// loop running for the lifetime of the runtime.
pub struct SweepTask {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl SweepTask {
    /// Spawns the sweep loop on the current runtime.
    #[must_use]
    pub fn spawn(store: Arc<LockSessionStore>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(period) => {
                        match store.sweep().await {
                            Ok(0) => {},
                            Ok(removed) => log::info!("swept {removed} expired lock sessions"),
                            Err(err) => log::warn!("lock sweep failed: {err}"),
                        }
                    },
                }
            }
        });
        Self { handle, cancel }
    }

    /// Stops scheduling further sweeps and waits for the loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}
