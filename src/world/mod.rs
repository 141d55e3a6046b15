pub mod entity;
pub mod registry;
pub mod type_table;

pub use entity::{GuildEntity, ItemEntity, MobileEntity, Persistable};
pub use registry::{EntityRegistry, TypedEntries, World};
pub use type_table::TypeTable;
