use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a persisted entity.
///
/// Mobiles, items and guilds all use a signed 32-bit identity, which is the
/// width written to the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Serial(pub i32);

impl Serial {
    pub const ZERO: Serial = Serial(0);

    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<i32> for Serial {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Index of an entity's type name inside its category's type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef(pub i32);

impl TypeRef {
    /// Written in place of a type index for categories without a type table.
    pub const NONE: TypeRef = TypeRef(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Spatial realm an item is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub u8);

impl MapId {
    /// Holding realm for entities that are not part of the live world.
    pub const INTERNAL: MapId = MapId(0x7F);
}

impl Default for MapId {
    fn default() -> Self {
        Self::INTERNAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    Mobile,
    Item,
    Guild,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 3] = [
        EntityCategory::Mobile,
        EntityCategory::Item,
        EntityCategory::Guild,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityCategory::Mobile => "Mobiles",
            EntityCategory::Item => "Items",
            EntityCategory::Guild => "Guilds",
        }
    }

    /// Guilds are untyped and therefore have no type file.
    pub fn has_type_table(self) -> bool {
        !matches!(self, EntityCategory::Guild)
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_display_is_hex() {
        assert_eq!(Serial(0x40000001).to_string(), "0x40000001");
        assert_eq!(Serial(26).to_string(), "0x0000001A");
    }

    #[test]
    fn test_only_guilds_lack_type_table() {
        assert!(EntityCategory::Mobile.has_type_table());
        assert!(EntityCategory::Item.has_type_table());
        assert!(!EntityCategory::Guild.has_type_table());
    }
}
