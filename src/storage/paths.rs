use crate::core::{EntityCategory, Result, SaveError};
use std::fs;
use std::path::{Path, PathBuf};

/// File locations of one category's triad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriadPaths {
    pub index: PathBuf,
    /// Absent for untyped categories.
    pub types: Option<PathBuf>,
    pub data: PathBuf,
}

impl TriadPaths {
    pub fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.index.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SaveError::Io(format!(
                    "Failed to create save directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// Layout of a save directory:
///
/// ```text
/// <root>/Mobiles/Mobiles.{idx,tdb,bin}
/// <root>/Items/Items.{idx,tdb,bin}
/// <root>/Guilds/Guilds.{idx,bin}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePaths {
    root: PathBuf,
}

impl SavePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn triad(&self, category: EntityCategory) -> TriadPaths {
        let name = category.name();
        let dir = self.root.join(name);
        TriadPaths {
            index: dir.join(format!("{}.idx", name)),
            types: category
                .has_type_table()
                .then(|| dir.join(format!("{}.tdb", name))),
            data: dir.join(format!("{}.bin", name)),
        }
    }
}
