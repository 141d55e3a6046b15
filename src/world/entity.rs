use crate::core::{MapId, Result, Serial};
use crate::storage::GenericWriter;
use chrono::{DateTime, Duration, Utc};

/// Anything that can be written into a data file.
pub trait Persistable {
    fn serial(&self) -> Serial;

    /// Writes the entity's persisted form. The number of bytes written is
    /// recorded in the index, so the routine may emit any layout it likes.
    fn serialize(&self, writer: &mut dyn GenericWriter) -> Result<()>;

    /// Drops transient state rebuilt on demand. Called once the entity has
    /// been written.
    fn free_cache(&self) {}
}

pub trait MobileEntity: Persistable {
    /// Fully-qualified type name recorded in the mobile type table.
    fn type_name(&self) -> &str;
}

pub trait ItemEntity: Persistable {
    fn type_name(&self) -> &str;

    fn decays(&self) -> bool;

    /// Containing item or mobile, if any.
    fn parent(&self) -> Option<Serial>;

    fn map(&self) -> MapId;

    fn last_moved(&self) -> DateTime<Utc>;

    fn decay_time(&self) -> Duration;

    /// Returns `true` if the item should be deleted.
    fn on_decay(&mut self) -> Result<bool> {
        Ok(true)
    }
}

pub trait GuildEntity: Persistable {}
