use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// Receives the "all snapshot bytes are on disk" notification.
pub trait DiskWriteListener: Send + Sync {
    fn on_disk_write_complete(&self);
}

/// Listener that counts completions and lets async callers wait for one.
#[derive(Debug, Default)]
pub struct DiskWriteSignal {
    completions: AtomicU64,
    notify: Notify,
}

impl DiskWriteSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn completions(&self) -> u64 {
        self.completions.load(Ordering::Acquire)
    }

    /// Resolves on the next completion, or immediately if one arrived since
    /// the last wait.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl DiskWriteListener for DiskWriteSignal {
    fn on_disk_write_complete(&self) {
        self.completions.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_one();
    }
}
