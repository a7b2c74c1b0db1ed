use super::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    contacts: &'a [Contact],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    contacts: Vec<Contact>,
}

/// Snapshot stored as a single JSON document.
pub struct JsonStorage {
    pub medium: String,
    pub path: PathBuf,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            medium: "json".to_string(),
            path: path.into(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn persistence_error(&self, action: &str, err: impl std::fmt::Display) -> AppError {
        AppError::Persistence(format!(
            "cannot {} {}: {}",
            action,
            self.path.display(),
            err
        ))
    }
}

impl ContactStore for JsonStorage {
    fn load(&self) -> Result<Vec<Contact>, AppError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.persistence_error("read", e)),
        };

        // serde_json will give an error if data is empty
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value =
            serde_json::from_str(&data).map_err(|e| self.persistence_error("decode", e))?;

        let contacts = if value.is_object() {
            let snapshot: Snapshot =
                serde_json::from_value(value).map_err(|e| self.persistence_error("decode", e))?;
            if snapshot.version > SNAPSHOT_VERSION {
                return Err(self.persistence_error(
                    "decode",
                    format!("unsupported snapshot version {}", snapshot.version),
                ));
            }
            snapshot.contacts
        } else if value.is_array() {
            // Bare list of contacts, written before the versioned envelope
            serde_json::from_value(value).map_err(|e| self.persistence_error("decode", e))?
        } else {
            return Err(self.persistence_error(
                "decode",
                "invalid JSON structure: expected object or array",
            ));
        };

        tracing::debug!(count = contacts.len(), path = %self.path.display(), "snapshot loaded");
        Ok(contacts)
    }

    fn save(&self, contacts: &[Contact]) -> Result<(), AppError> {
        create_file_parent(&self.path)?;

        let json = serde_json::to_string_pretty(&SnapshotRef {
            version: SNAPSHOT_VERSION,
            contacts,
        })
        .map_err(|e| self.persistence_error("encode", e))?;

        // Write beside the target then rename so a crash never leaves half a snapshot
        let temp_path = self.temp_path();
        let mut file =
            fs::File::create(&temp_path).map_err(|e| self.persistence_error("write", e))?;
        let written = file.write_all(json.as_bytes()).and_then(|_| file.sync_all());
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persistence_error("write", e));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persistence_error("replace", e));
        }

        tracing::debug!(count = contacts.len(), path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    fn get_medium(&self) -> &str {
        &self.medium
    }
}
