use super::entity::{GuildEntity, ItemEntity, MobileEntity, Persistable};
use super::type_table::TypeTable;
use crate::core::{Result, Serial, TypeRef};
use std::collections::BTreeMap;

pub type TypedEntries<'a, E> = Box<dyn ExactSizeIterator<Item = (TypeRef, &'a E)> + 'a>;

/// Live collections read by a save pass and mutated by the decay sweep.
///
/// Callers are expected to keep the world still for the duration of a save.
pub trait EntityRegistry {
    fn mobiles(&self) -> TypedEntries<'_, dyn MobileEntity>;

    fn items(&self) -> TypedEntries<'_, dyn ItemEntity>;

    fn guilds(&self) -> Box<dyn ExactSizeIterator<Item = &dyn GuildEntity> + '_>;

    fn mobile_types(&self) -> &TypeTable;

    fn item_types(&self) -> &TypeTable;

    fn item_mut(&mut self, serial: Serial) -> Option<&mut (dyn ItemEntity + 'static)>;

    /// Removes the item and everything it contains. Returns `false` if the
    /// item was not present.
    fn delete_item(&mut self, serial: Serial) -> Result<bool>;
}

// ============================================================================
// In-memory World
// ============================================================================

struct Typed<E: ?Sized> {
    type_ref: TypeRef,
    entity: Box<E>,
}

/// Registry keeping each collection ordered by serial.
#[derive(Default)]
pub struct World {
    mobiles: BTreeMap<Serial, Typed<dyn MobileEntity>>,
    items: BTreeMap<Serial, Typed<dyn ItemEntity>>,
    guilds: BTreeMap<Serial, Box<dyn GuildEntity>>,
    mobile_types: TypeTable,
    item_types: TypeTable,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a mobile, recording its type.
    pub fn add_mobile<M: MobileEntity + 'static>(&mut self, mobile: M) -> TypeRef {
        let type_ref = self.mobile_types.intern(mobile.type_name());
        self.mobiles.insert(
            mobile.serial(),
            Typed {
                type_ref,
                entity: Box::new(mobile),
            },
        );
        type_ref
    }

    pub fn add_item<I: ItemEntity + 'static>(&mut self, item: I) -> TypeRef {
        let type_ref = self.item_types.intern(item.type_name());
        self.items.insert(
            item.serial(),
            Typed {
                type_ref,
                entity: Box::new(item),
            },
        );
        type_ref
    }

    pub fn add_guild<G: GuildEntity + 'static>(&mut self, guild: G) {
        self.guilds.insert(guild.serial(), Box::new(guild));
    }

    pub fn remove_mobile(&mut self, serial: Serial) -> bool {
        self.mobiles.remove(&serial).is_some()
    }

    pub fn remove_guild(&mut self, serial: Serial) -> bool {
        self.guilds.remove(&serial).is_some()
    }

    pub fn item(&self, serial: Serial) -> Option<&dyn ItemEntity> {
        self.items.get(&serial).map(|typed| typed.entity.as_ref())
    }

    pub fn contains_item(&self, serial: Serial) -> bool {
        self.items.contains_key(&serial)
    }

    pub fn mobile_count(&self) -> usize {
        self.mobiles.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }
}

impl EntityRegistry for World {
    fn mobiles(&self) -> TypedEntries<'_, dyn MobileEntity> {
        Box::new(
            self.mobiles
                .values()
                .map(|typed| (typed.type_ref, typed.entity.as_ref())),
        )
    }

    fn items(&self) -> TypedEntries<'_, dyn ItemEntity> {
        Box::new(
            self.items
                .values()
                .map(|typed| (typed.type_ref, typed.entity.as_ref())),
        )
    }

    fn guilds(&self) -> Box<dyn ExactSizeIterator<Item = &dyn GuildEntity> + '_> {
        Box::new(self.guilds.values().map(|guild| guild.as_ref() as &dyn GuildEntity))
    }

    fn mobile_types(&self) -> &TypeTable {
        &self.mobile_types
    }

    fn item_types(&self) -> &TypeTable {
        &self.item_types
    }

    fn item_mut(&mut self, serial: Serial) -> Option<&mut (dyn ItemEntity + 'static)> {
        self.items.get_mut(&serial).map(|typed| typed.entity.as_mut())
    }

    fn delete_item(&mut self, serial: Serial) -> Result<bool> {
        if self.items.remove(&serial).is_none() {
            return Ok(false);
        }

        let mut pending = vec![serial];
        while let Some(container) = pending.pop() {
            let children: Vec<Serial> = self
                .items
                .iter()
                .filter(|(_, typed)| typed.entity.parent() == Some(container))
                .map(|(child, _)| *child)
                .collect();
            for child in children {
                self.items.remove(&child);
                pending.push(child);
            }
        }
        Ok(true)
    }
}
