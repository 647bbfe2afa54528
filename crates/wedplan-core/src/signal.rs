//! Named "something changed" flags that force a cache refresh.
//!
//! One part of the application raises a flag in local storage (say, after
//! adding a vendor from another window) and a watcher polls for it and
//! reloads the provider. Taking a flag is read-then-clear, so two watchers
//! can race for the same flag.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::DataProvider;
use crate::local::LocalStorage;

pub const VENDOR_ADDED: &str = "vendorAdded";
pub const BOOKING_ADDED: &str = "bookingAdded";
pub const CLIENT_ADDED: &str = "clientAdded";

/// Flags watched when the caller does not pick its own
pub const DEFAULT_FLAGS: [&str; 3] = [VENDOR_ADDED, BOOKING_ADDED, CLIENT_ADDED];

#[derive(Clone)]
pub struct RefreshSignal {
    storage: Arc<LocalStorage>,
}

impl RefreshSignal {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn raise(&self, name: &str) -> Result<()> {
        self.storage.set(name, &Utc::now().to_rfc3339())?;
        debug!(flag = name, "Refresh flag raised");
        Ok(())
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self, name: &str) -> Result<bool> {
        self.storage.remove(name)
    }

    /// Take every flag in `names`; true if any was set. Errors are logged
    /// and count as "not set".
    pub fn take_any(&self, names: &[String]) -> bool {
        let mut raised = false;
        for name in names {
            match self.take(name) {
                Ok(true) => {
                    debug!(flag = %name, "Refresh flag taken");
                    raised = true;
                }
                Ok(false) => {}
                Err(e) => warn!(flag = %name, error = %e, "Failed to read refresh flag"),
            }
        }
        raised
    }
}

/// Poll `names` every `every` and force a provider refresh when any of them
/// was raised. Stops once the provider is dropped.
pub fn spawn_signal_watcher(
    provider: &Arc<DataProvider>,
    signal: RefreshSignal,
    names: Vec<String>,
    every: Duration,
) -> JoinHandle<()> {
    let provider = Arc::downgrade(provider);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(provider) = provider.upgrade() else {
                debug!("Provider dropped, stopping signal watcher");
                break;
            };
            if signal.take_any(&names) {
                info!("Refresh flag seen, reloading data");
                provider.refresh(true).await;
            }
        }
    })
}
