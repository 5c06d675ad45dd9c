use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Back-off before retrying after a failed sync
pub const FAILED_SYNC_RETRY: Duration = Duration::from_secs(5);

/// Body of the exchange's server-time route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: i64,
}

/// Local wall clock in epoch milliseconds
pub fn local_time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Local-to-server clock offset shared by every signed call of a client.
///
/// The offset starts at zero and is written only by a sync; when disabled it
/// stays zero for the lifetime of the client.
#[derive(Debug)]
pub struct TimeSync {
    disabled: bool,
    resync_interval: Duration,
    offset_ms: AtomicI64,
    /// Local time at which the next sync is due; 0 means now
    next_sync_ms: AtomicI64,
    synced: AtomicBool,
    sync_lock: Mutex<()>,
}

impl TimeSync {
    pub fn new(disabled: bool, resync_interval: Duration) -> Self {
        Self {
            disabled,
            resync_interval,
            offset_ms: AtomicI64::new(0),
            next_sync_ms: AtomicI64::new(0),
            synced: AtomicBool::new(false),
            sync_lock: Mutex::new(()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(true, Duration::ZERO)
    }

    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Cached drift in milliseconds (`server - local`)
    pub fn offset(&self) -> i64 {
        self.offset_ms.load(Ordering::Acquire)
    }

    /// Whether at least one sync succeeded
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// A sync is due when none succeeded yet, the last one is stale, or the
    /// back-off after a failure has elapsed
    pub fn needs_sync(&self, now_ms: i64) -> bool {
        if self.disabled {
            return false;
        }
        let next = self.next_sync_ms.load(Ordering::Acquire);
        next == 0 || now_ms >= next
    }

    /// Store `server_time - local_time` as the new offset
    pub fn apply(&self, server_time_ms: i64, local_time_ms: i64) -> i64 {
        if self.disabled {
            return 0;
        }
        let offset = server_time_ms - local_time_ms;
        self.offset_ms.store(offset, Ordering::Release);
        let next = local_time_ms.saturating_add(duration_ms(self.resync_interval));
        self.next_sync_ms.store(next, Ordering::Release);
        self.synced.store(true, Ordering::Release);
        debug!(offset_ms = offset, "clock offset updated");
        offset
    }

    /// Fall back to local time after a failed sync; the next signed call
    /// after a short back-off tries again
    pub fn reset(&self, now_ms: i64) {
        let retry = FAILED_SYNC_RETRY.min(self.resync_interval);
        self.offset_ms.store(0, Ordering::Release);
        let next = now_ms.saturating_add(duration_ms(retry));
        self.next_sync_ms.store(next, Ordering::Release);
        self.synced.store(false, Ordering::Release);
    }

    /// Timestamp to stamp on a signed request sent at `local_ms`
    pub fn timestamp_at(&self, local_ms: i64) -> i64 {
        local_ms + self.offset()
    }

    /// Serializes concurrent syncs so only one reaches the network
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.sync_lock.lock().await
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
