use crate::core::{MapId, Result, Serial};
use crate::world::{EntityRegistry, ItemEntity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{Level, event};

/// Whether an item has sat unmoved, uncontained and in the live world for
/// longer than its decay time as of `now`.
pub fn is_decay_candidate(item: &dyn ItemEntity, internal_map: MapId, now: DateTime<Utc>) -> bool {
    if !item.decays() || item.parent().is_some() || item.map() == internal_map {
        return false;
    }
    match item.last_moved().checked_add_signed(item.decay_time()) {
        Some(expires_at) => expires_at <= now,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecayReport {
    /// Hooks invoked.
    pub processed: usize,
    pub deleted: usize,
    pub retained: usize,
    /// Queued items already gone from the registry when their turn came.
    pub missing: usize,
}

/// FIFO of item serials found decay-eligible during the last item pass.
#[derive(Debug, Default)]
pub struct DecayQueue {
    queue: VecDeque<Serial>,
}

impl DecayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, serial: Serial) {
        self.queue.push_back(serial);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Serial> + '_ {
        self.queue.iter().copied()
    }

    /// Runs each queued item's decay hook in discovery order and deletes the
    /// ones that ask for it.
    ///
    /// A failing hook stops the sweep. The remaining entries are dropped; the
    /// next item pass finds them again if they are still eligible.
    pub fn process(&mut self, registry: &mut dyn EntityRegistry) -> Result<DecayReport> {
        let mut report = DecayReport::default();

        while let Some(serial) = self.queue.pop_front() {
            let Some(item) = registry.item_mut(serial) else {
                report.missing += 1;
                continue;
            };

            report.processed += 1;
            let remove = match item.on_decay() {
                Ok(remove) => remove,
                Err(err) => {
                    event!(Level::ERROR, serial = %serial, error = %err, "decay hook failed");
                    self.queue.clear();
                    return Err(err);
                }
            };

            if remove {
                if let Err(err) = registry.delete_item(serial) {
                    self.queue.clear();
                    return Err(err);
                }
                report.deleted += 1;
            } else {
                report.retained += 1;
            }
        }

        Ok(report)
    }
}
