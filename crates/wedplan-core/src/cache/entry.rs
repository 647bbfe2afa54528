use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// A cached value together with when it was loaded.
///
/// Freshness is measured on the tokio clock so it follows paused time in
/// tests; `cached_at` is wall-clock time for display.
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: Arc<T>,
    pub cached_at: DateTime<Utc>,
    loaded_at: Instant,
    stale: bool,
}

impl<T> CachedData<T> {
    pub fn new(data: Arc<T>) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            loaded_at: Instant::now(),
            stale: false,
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    /// Force the next non-forced refresh to go to storage.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Not marked stale and loaded within `validity`
    pub fn is_fresh(&self, validity: Duration) -> bool {
        !self.stale && self.loaded_at.elapsed() <= validity
    }
}
