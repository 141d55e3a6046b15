use crate::core::TypeRef;
use std::collections::HashMap;

/// Append-only, de-duplicated list of type names.
///
/// A name keeps the index it was first given for the lifetime of the table.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    names: Vec<String>,
    lookup: HashMap<String, TypeRef>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> TypeRef {
        if let Some(type_ref) = self.lookup.get(name) {
            return *type_ref;
        }
        let type_ref = TypeRef(self.names.len() as i32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), type_ref);
        type_ref
    }

    pub fn get(&self, type_ref: TypeRef) -> Option<&str> {
        self.names.get(type_ref.index()).map(String::as_str)
    }

    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        self.lookup.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_reuses_existing_index() {
        let mut table = TypeTable::new();
        let gold = table.intern("Items.Gold");
        let sword = table.intern("Items.Longsword");
        assert_eq!(table.intern("Items.Gold"), gold);
        assert_eq!(gold, TypeRef(0));
        assert_eq!(sword, TypeRef(1));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(sword), Some("Items.Longsword"));
        assert_eq!(table.iter().collect::<Vec<_>>(), vec!["Items.Gold", "Items.Longsword"]);
    }
}
