use crate::core::EntityCategory;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observer of per-entity save sizes.
pub trait SaveMetrics: Sync {
    fn on_entity_saved(&self, category: EntityCategory, bytes: u64);
}

#[derive(Debug, Default)]
struct CategoryCounters {
    entities: AtomicU64,
    bytes: AtomicU64,
}

impl CategoryCounters {
    fn snapshot(&self) -> CategoryMetrics {
        CategoryMetrics {
            entities: self.entities.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMetrics {
    pub entities: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveMetricsReport {
    pub mobiles: CategoryMetrics,
    pub items: CategoryMetrics,
    pub guilds: CategoryMetrics,
}

impl SaveMetricsReport {
    pub fn get(&self, category: EntityCategory) -> CategoryMetrics {
        match category {
            EntityCategory::Mobile => self.mobiles,
            EntityCategory::Item => self.items,
            EntityCategory::Guild => self.guilds,
        }
    }
}

/// Accumulates entity counts and byte totals across saves.
#[derive(Debug, Default)]
pub struct SaveMetricsCollector {
    mobiles: CategoryCounters,
    items: CategoryCounters,
    guilds: CategoryCounters,
}

impl SaveMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> SaveMetricsReport {
        SaveMetricsReport {
            mobiles: self.mobiles.snapshot(),
            items: self.items.snapshot(),
            guilds: self.guilds.snapshot(),
        }
    }

    fn counters(&self, category: EntityCategory) -> &CategoryCounters {
        match category {
            EntityCategory::Mobile => &self.mobiles,
            EntityCategory::Item => &self.items,
            EntityCategory::Guild => &self.guilds,
        }
    }
}

impl SaveMetrics for SaveMetricsCollector {
    fn on_entity_saved(&self, category: EntityCategory, bytes: u64) {
        let counters = self.counters(category);
        counters.entities.fetch_add(1, Ordering::Relaxed);
        counters.bytes.fetch_add(bytes, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_partitions_by_category() {
        let collector = SaveMetricsCollector::new();
        collector.on_entity_saved(EntityCategory::Mobile, 10);
        collector.on_entity_saved(EntityCategory::Mobile, 5);
        collector.on_entity_saved(EntityCategory::Guild, 3);

        let report = collector.report();
        assert_eq!(report.mobiles, CategoryMetrics { entities: 2, bytes: 15 });
        assert_eq!(report.items, CategoryMetrics::default());
        assert_eq!(report.get(EntityCategory::Guild).bytes, 3);
    }
}
