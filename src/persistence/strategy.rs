//! Snapshot orchestration.
//!
//! A save writes three triads in a fixed order (mobiles, items, guilds). Each
//! triad is an index file of `(type, serial, offset, length)` records, a type
//! table (mobiles and items only) and a data file holding the entities'
//! serialized bytes back to back.

use super::config::{SaveConfig, SaveOption};
use super::decay::{DecayQueue, DecayReport, is_decay_candidate};
use super::metrics::SaveMetrics;
use super::signal::DiskWriteListener;
use crate::core::{EntityCategory, Result, SaveError, TypeRef};
use crate::storage::{FlushContext, FlushTracker, IndexRecord, SavePaths, TriadPaths, WriterMode};
use crate::world::{EntityRegistry, Persistable, TypeTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{Level, event, info_span};

pub trait SaveStrategy {
    fn name(&self) -> &'static str;

    fn save(
        &mut self,
        registry: &dyn EntityRegistry,
        metrics: Option<&dyn SaveMetrics>,
        permit_background_write: bool,
    ) -> Result<SaveSummary>;

    /// Runs the decay sweep for items found during the last save.
    fn process_decay(&mut self, registry: &mut dyn EntityRegistry) -> Result<DecayReport>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub entities: usize,
    pub data_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub mobiles: CategorySummary,
    pub items: CategorySummary,
    pub guilds: CategorySummary,
    /// Whether background writers were used; if so their bytes may still be
    /// in flight.
    pub background: bool,
    pub decay_queued: usize,
}

pub struct StandardSaveStrategy {
    config: SaveConfig,
    paths: SavePaths,
    listener: Arc<dyn DiskWriteListener>,
    tracker: Arc<FlushTracker>,
    runtime: Option<Handle>,
    decay_queue: DecayQueue,
}

impl StandardSaveStrategy {
    pub fn new(config: SaveConfig, listener: Arc<dyn DiskWriteListener>) -> Self {
        Self {
            paths: config.paths(),
            tracker: FlushTracker::new(Arc::clone(&listener)),
            config,
            listener,
            runtime: None,
            decay_queue: DecayQueue::new(),
        }
    }

    /// Runtime that background flush tasks are spawned on. Without one, the
    /// ambient runtime is used if there is one.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn paths(&self) -> &SavePaths {
        &self.paths
    }

    pub fn decay_queue(&self) -> &DecayQueue {
        &self.decay_queue
    }

    /// Tracks background flushes; also holds flush errors that happened
    /// after `save` returned.
    pub fn flush_tracker(&self) -> &Arc<FlushTracker> {
        &self.tracker
    }

    /// Saves with `now` as the reference time for decay eligibility.
    pub fn save_at(
        &mut self,
        registry: &dyn EntityRegistry,
        metrics: Option<&dyn SaveMetrics>,
        permit_background_write: bool,
        now: DateTime<Utc>,
    ) -> Result<SaveSummary> {
        let span = info_span!("world_save", strategy = self.name(), permit_background_write);
        let _enter = span.enter();

        // Earlier flush tasks still hold these files open; truncating them now
        // would let old bytes land on top of the new snapshot.
        let in_flight = self.tracker.pending();
        if in_flight > 0 {
            event!(Level::WARN, in_flight, "previous background save has not reached the disk");
            return Err(SaveError::FlushPending(in_flight));
        }

        let mode = self.resolve_mode(permit_background_write);
        let hold = match &mode {
            WriterMode::Background(context) => Some(context.tracker.hold()),
            WriterMode::Sequential => None,
        };

        let written = self.write_triads(registry, metrics, &mode, now);
        match hold {
            Some(hold) if written.is_err() => hold.abandon(),
            hold => drop(hold),
        }
        let (mobiles, items, guilds) = written?;

        let background = mode.is_background();
        if permit_background_write && !background {
            // Nothing is in flight, so callers waiting for the flush would never hear of it.
            event!(Level::DEBUG, "sequential save complete, notifying listener");
            self.listener.on_disk_write_complete();
        }

        event!(
            Level::INFO,
            mobiles = mobiles.entities,
            items = items.entities,
            guilds = guilds.entities,
            decay_queued = self.decay_queue.len(),
            background,
            "world saved"
        );

        Ok(SaveSummary {
            mobiles,
            items,
            guilds,
            background,
            decay_queued: self.decay_queue.len(),
        })
    }

    fn write_triads(
        &mut self,
        registry: &dyn EntityRegistry,
        metrics: Option<&dyn SaveMetrics>,
        mode: &WriterMode,
        now: DateTime<Utc>,
    ) -> Result<(CategorySummary, CategorySummary, CategorySummary)> {
        let mobiles = save_category(
            EntityCategory::Mobile,
            &self.paths.triad(EntityCategory::Mobile),
            mode,
            registry.mobiles(),
            Some(registry.mobile_types()),
            metrics,
            |_| {},
        )?;

        let internal_map = self.config.internal_map;
        let queue = &mut self.decay_queue;
        queue.clear();
        let items = save_category(
            EntityCategory::Item,
            &self.paths.triad(EntityCategory::Item),
            mode,
            registry.items(),
            Some(registry.item_types()),
            metrics,
            |item| {
                if is_decay_candidate(item, internal_map, now) {
                    queue.push(item.serial());
                }
            },
        )?;

        let guilds = save_category(
            EntityCategory::Guild,
            &self.paths.triad(EntityCategory::Guild),
            mode,
            registry.guilds().map(|guild| (TypeRef::NONE, guild)),
            None,
            metrics,
            |_| {},
        )?;

        Ok((mobiles, items, guilds))
    }

    fn resolve_mode(&self, permit_background_write: bool) -> WriterMode {
        if !permit_background_write || self.config.save_option == SaveOption::Normal {
            return WriterMode::Sequential;
        }

        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => WriterMode::Background(FlushContext {
                handle,
                tracker: Arc::clone(&self.tracker),
                buffer_size: self.config.async_buffer_size,
            }),
            None => {
                event!(
                    Level::WARN,
                    "background write requested but no tokio runtime is available; writing sequentially"
                );
                WriterMode::Sequential
            }
        }
    }
}

impl SaveStrategy for StandardSaveStrategy {
    fn name(&self) -> &'static str {
        "Standard"
    }

    fn save(
        &mut self,
        registry: &dyn EntityRegistry,
        metrics: Option<&dyn SaveMetrics>,
        permit_background_write: bool,
    ) -> Result<SaveSummary> {
        self.save_at(registry, metrics, permit_background_write, Utc::now())
    }

    fn process_decay(&mut self, registry: &mut dyn EntityRegistry) -> Result<DecayReport> {
        let span = info_span!("process_decay", queued = self.decay_queue.len());
        let _enter = span.enter();

        let report = self.decay_queue.process(registry)?;
        event!(
            Level::DEBUG,
            processed = report.processed,
            deleted = report.deleted,
            retained = report.retained,
            missing = report.missing,
            "decay sweep finished"
        );
        Ok(report)
    }
}

/// Writes one category's triad. `inspect` sees every entity before it is
/// serialized.
fn save_category<'a, E, I, F>(
    category: EntityCategory,
    triad: &TriadPaths,
    mode: &WriterMode,
    entries: I,
    types: Option<&TypeTable>,
    metrics: Option<&dyn SaveMetrics>,
    mut inspect: F,
) -> Result<CategorySummary>
where
    E: Persistable + ?Sized + 'a,
    I: ExactSizeIterator<Item = (TypeRef, &'a E)>,
    F: FnMut(&E),
{
    let count = entries.len();
    let span = info_span!("save_category", category = %category, entities = count);
    let _enter = span.enter();

    triad.ensure_dir()?;
    let mut idx = mode.open(&triad.index, false)?;
    let mut tdb = match (&triad.types, types) {
        (Some(path), Some(_)) => Some(mode.open(path, false)?),
        _ => None,
    };
    let mut bin = mode.open(&triad.data, true)?;

    idx.write_i32(checked_i32(count, || format!("{} count", category))?)?;

    for (type_ref, entity) in entries {
        inspect(entity);

        let start = bin.position();
        IndexRecord::write_head(idx.as_mut(), type_ref, entity.serial(), start)?;

        entity.serialize(bin.as_mut())?;

        let length = bin.position() - start;
        idx.write_i32(checked_i32(length, || {
            format!("{} {} serialized length", category, entity.serial())
        })?)?;

        if let Some(metrics) = metrics {
            metrics.on_entity_saved(category, length);
        }

        entity.free_cache();
    }

    if let (Some(tdb), Some(types)) = (tdb.as_mut(), types) {
        tdb.write_i32(checked_i32(types.len(), || format!("{} type count", category))?)?;
        for name in types.iter() {
            tdb.write_string(Some(name))?;
        }
    }

    idx.close()?;
    if let Some(tdb) = tdb.as_mut() {
        tdb.close()?;
    }
    bin.close()?;

    let data_bytes = bin.position();
    event!(Level::DEBUG, data_bytes, "category saved");

    Ok(CategorySummary {
        entities: count,
        data_bytes,
    })
}

fn checked_i32<T, D>(value: T, describe: D) -> Result<i32>
where
    T: TryInto<i32> + Copy + std::fmt::Display,
    D: FnOnce() -> String,
{
    value.try_into().map_err(|_| {
        SaveError::Serialization(format!("{} of {} does not fit the index format", describe(), value))
    })
}
