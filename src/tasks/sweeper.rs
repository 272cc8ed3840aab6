//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from a
//! [`LocalAreaCache`].

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Clock, LocalAreaCache};

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval` between passes and reads the time from
/// `clock`, the same clock the engine uses, so both agree on what is
/// expired.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(LocalAreaCache::<String, String>::new());
/// let handle = spawn_sweep_task(store.clone(), Arc::new(SystemClock), Duration::from_secs(1));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task<N, V>(
    store: Arc<LocalAreaCache<N, V>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> JoinHandle<()>
where
    N: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.sweep_expired(clock.now_millis());

            if removed > 0 {
                info!("Expiry sweep: removed {} entries", removed);
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}
