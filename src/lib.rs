// ============================================================================
// worldsave Library
// ============================================================================

pub mod core;
pub mod persistence;
pub mod storage;
pub mod world;

// Re-export main types for convenience
pub use self::core::{EntityCategory, MapId, Result, SaveError, Serial, TypeRef};
pub use persistence::{
    DecayReport, DiskWriteListener, DiskWriteSignal, SaveConfig, SaveMetrics,
    SaveMetricsCollector, SaveOption, SaveStrategy, SaveSummary, StandardSaveStrategy,
};
pub use storage::{GenericWriter, IndexRecord, MemoryWriter, SavePaths, TriadSummary};
pub use world::{EntityRegistry, GuildEntity, ItemEntity, MobileEntity, Persistable, TypeTable, World};
