//! Background file writer.
//!
//! Writes accumulate in memory on the calling thread. Whenever the buffer
//! fills, the chunk is handed to a tokio task that appends it to the file,
//! so the caller never waits on disk I/O. Position queries stay exact because
//! they only depend on bytes accepted, not bytes flushed.

use super::writer::GenericWriter;
use crate::core::{Result, SaveError};
use crate::persistence::DiskWriteListener;
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

// ============================================================================
// Flush Tracker
// ============================================================================

const ABANDONED: usize = 1 << (usize::BITS - 1);

/// Counts background writers whose bytes have not yet landed on disk and
/// notifies the listener when the count drops to zero, unless the save that
/// opened them was abandoned.
pub struct FlushTracker {
    /// Writer count in the low bits, `ABANDONED` in the top bit.
    pending: AtomicUsize,
    listener: Arc<dyn DiskWriteListener>,
    errors: Mutex<Vec<SaveError>>,
}

impl FlushTracker {
    pub fn new(listener: Arc<dyn DiskWriteListener>) -> Arc<Self> {
        Arc::new(Self {
            pending: AtomicUsize::new(0),
            listener,
            errors: Mutex::new(Vec::new()),
        })
    }

    /// Keeps completion from firing until the returned guard is dropped, even
    /// if every writer opened so far has already finished.
    pub fn hold(self: &Arc<Self>) -> FlushHold {
        self.acquire();
        FlushHold {
            tracker: Arc::clone(self),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire) & !ABANDONED
    }

    /// Drains the flush failures recorded since the last call.
    pub fn take_errors(&self) -> Result<Vec<SaveError>> {
        let mut errors = self.errors.lock()?;
        Ok(std::mem::take(&mut *errors))
    }

    fn acquire(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        // The flag is cleared in the same step that empties the count, so the
        // next batch starts clean.
        let previous = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                Some(if state & !ABANDONED == 1 { 0 } else { state - 1 })
            })
            .unwrap_or_else(|state| state);
        if previous & !ABANDONED != 1 {
            return;
        }
        if previous & ABANDONED != 0 {
            debug!("Background writers of an abandoned save finished; not notifying");
        } else {
            self.listener.on_disk_write_complete();
        }
    }

    fn record_error(&self, err: SaveError) {
        match self.errors.lock() {
            Ok(mut errors) => errors.push(err),
            Err(poisoned) => poisoned.into_inner().push(err),
        }
    }
}

pub struct FlushHold {
    tracker: Arc<FlushTracker>,
}

impl FlushHold {
    /// Releases the hold for a save that failed. Writers already opened still
    /// drain, but the listener is not told the write completed.
    pub fn abandon(self) {
        self.tracker.pending.fetch_or(ABANDONED, Ordering::AcqRel);
    }
}

impl Drop for FlushHold {
    fn drop(&mut self) {
        self.tracker.release();
    }
}

/// Everything a background writer needs to spawn its flush task.
#[derive(Clone)]
pub struct FlushContext {
    pub handle: Handle,
    pub tracker: Arc<FlushTracker>,
    pub buffer_size: usize,
}

// ============================================================================
// Async Writer
// ============================================================================

pub struct AsyncWriter {
    path: PathBuf,
    buffer: Vec<u8>,
    handed_off: u64,
    buffer_size: usize,
    prefix_strings: bool,
    sender: Option<UnboundedSender<Vec<u8>>>,
}

impl AsyncWriter {
    /// Creates (or truncates) the file synchronously so open failures reach
    /// the caller, then starts the flush task on `context.handle`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        prefix_strings: bool,
        context: &FlushContext,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::create(&path).map_err(|e| {
            SaveError::Io(format!("Failed to create '{}': {}", path.display(), e))
        })?;

        let (sender, receiver) = mpsc::unbounded_channel::<Vec<u8>>();
        let tracker = Arc::clone(&context.tracker);
        let task_path = path.clone();

        tracker.acquire();
        context.handle.spawn(async move {
            let file = tokio::fs::File::from_std(file);
            if let Err(err) = drain_chunks(file, receiver, &task_path).await {
                error!("Background flush of '{}' failed: {}", task_path.display(), err);
                tracker.record_error(err);
            }
            tracker.release();
        });

        let buffer_size = context.buffer_size.max(1);
        Ok(Self {
            path,
            buffer: Vec::with_capacity(buffer_size),
            handed_off: 0,
            buffer_size,
            prefix_strings,
            sender: Some(sender),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn hand_off(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| SaveError::WriterClosed(self.path.display().to_string()))?;

        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.buffer_size));
        let len = chunk.len();
        sender.send(chunk).map_err(|_| {
            SaveError::Io(format!(
                "Flush task for '{}' stopped before accepting all data",
                self.path.display()
            ))
        })?;
        self.handed_off += len as u64;
        debug!("Handed {} bytes of '{}' to flush task", len, self.path.display());
        Ok(())
    }
}

impl GenericWriter for AsyncWriter {
    fn position(&self) -> u64 {
        self.handed_off + self.buffer.len() as u64
    }

    fn prefix_strings(&self) -> bool {
        self.prefix_strings
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.sender.is_none() {
            return Err(SaveError::WriterClosed(self.path.display().to_string()));
        }
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() >= self.buffer_size {
            self.hand_off()?;
        }
        Ok(())
    }

    /// Hands off the tail of the buffer and returns without waiting for it
    /// to reach the disk.
    fn close(&mut self) -> Result<()> {
        if self.sender.is_none() {
            return Ok(());
        }
        self.hand_off()?;
        self.sender = None;
        Ok(())
    }
}

async fn drain_chunks(
    mut file: tokio::fs::File,
    mut receiver: UnboundedReceiver<Vec<u8>>,
    path: &Path,
) -> Result<()> {
    while let Some(chunk) = receiver.recv().await {
        file.write_all(&chunk).await.map_err(|e| {
            SaveError::Io(format!("Failed to write '{}': {}", path.display(), e))
        })?;
    }
    file.flush()
        .await
        .map_err(|e| SaveError::Io(format!("Failed to flush '{}': {}", path.display(), e)))?;
    file.sync_all()
        .await
        .map_err(|e| SaveError::Io(format!("Failed to sync '{}': {}", path.display(), e)))?;
    Ok(())
}
