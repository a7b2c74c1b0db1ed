pub mod memory;
pub mod stores;

use crate::prelude::{AppError, Contact};
use std::fs;
use std::path::Path;

pub use memory::MemStorage;
pub use stores::JsonStorage;

pub const DEFAULT_STORAGE_PATH: &str = "./.instance/addressbook.json";

/// Persistence backend for the full contact snapshot.
pub trait ContactStore {
    /// Reads the snapshot. A store that was never saved loads as empty.
    fn load(&self) -> Result<Vec<Contact>, AppError>;

    /// Replaces the persisted snapshot with `contacts`.
    fn save(&self, contacts: &[Contact]) -> Result<(), AppError>;

    fn get_medium(&self) -> &str;
}

pub fn create_file_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Persistence(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    Ok(())
}
