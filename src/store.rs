//! JSON-file-backed assignment store.
//!
//! Every operation is a full read-modify-write of the JSON object, so two
//! concurrent writers follow last-write-wins with no merging. With a handful
//! of users that is an accepted, documented limitation rather than something
//! the store papers over with locking.

use crate::errors::{Error, Result};
use crate::models::Assignment;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// User id -> slot assignment, as persisted in the data file.
pub type Assignments = HashMap<String, Assignment>;

#[derive(Debug, Clone)]
pub struct AssignmentStore {
    path: PathBuf,
}

impl AssignmentStore {
    /// Opens the store, writing an empty `{}` object when the file is
    /// missing or zero-length so later loads never trip over a half-created
    /// file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let needs_init = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if needs_init {
            fs::write(&path, "{}")?;
        }
        Ok(Self { path })
    }

    /// Current contents of the store. A missing or empty file is an empty
    /// store; corrupt JSON is logged and treated as empty rather than
    /// propagated.
    pub fn assignments(&self) -> Assignments {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read assignment store {:?}: {}", self.path, e);
                return Assignments::new();
            }
        };
        if content.trim().is_empty() {
            return Assignments::new();
        }
        match serde_json::from_str(&content) {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(
                    "Corrupt assignment store {:?}, treating as empty: {}",
                    self.path, e
                );
                Assignments::new()
            }
        }
    }

    /// Assigns (or reassigns) a slot to a user; booking starts unconfirmed.
    pub fn assign_slot(&self, user_id: &str, time: &str) -> Result<()> {
        let mut assignments = self.assignments();
        assignments.insert(
            user_id.to_string(),
            Assignment {
                time: time.to_string(),
                booked: false,
            },
        );
        self.save(&assignments)
    }

    /// Marks a user's assignment as booked, leaving the slot time untouched.
    /// Returns whether the user had an assignment; an unknown user is a
    /// no-op.
    pub fn mark_booked(&self, user_id: &str) -> Result<bool> {
        let mut assignments = self.assignments();
        match assignments.get_mut(user_id) {
            Some(assignment) => {
                assignment.booked = true;
                self.save(&assignments)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn save(&self, assignments: &Assignments) -> Result<()> {
        let content = serde_json::to_string_pretty(assignments)
            .map_err(|e| Error::DataFile(format!("Failed to serialize assignments: {}", e)))?;
        fs::write(&self.path, content)
            .map_err(|e| Error::DataFile(format!("Failed to write {:?}: {}", self.path, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fresh_store() -> (AssignmentStore, PathBuf, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        (AssignmentStore::new(&path).unwrap(), path, dir)
    }

    #[test]
    fn test_new_initializes_missing_file() {
        let (_store, path, _dir) = fresh_store();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_missing_file_loads_as_empty() {
        let (store, path, _dir) = fresh_store();
        std::fs::remove_file(&path).unwrap();
        assert!(store.assignments().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let (store, path, _dir) = fresh_store();
        std::fs::write(&path, "{not json at all").unwrap();
        assert!(store.assignments().is_empty());
    }

    #[test]
    fn test_assign_slot_round_trip() {
        let (store, _path, _dir) = fresh_store();
        store.assign_slot("123456789", "8:30 am").unwrap();

        let assignments = store.assignments();
        assert_eq!(
            assignments.get("123456789"),
            Some(&Assignment {
                time: "8:30 am".to_string(),
                booked: false,
            })
        );
    }

    #[test]
    fn test_mark_booked_flips_only_the_flag() {
        let (store, _path, _dir) = fresh_store();
        store.assign_slot("123456789", "8:30 am").unwrap();

        assert!(store.mark_booked("123456789").unwrap());
        let assignments = store.assignments();
        let assignment = assignments.get("123456789").unwrap();
        assert_eq!(assignment.time, "8:30 am");
        assert!(assignment.booked);
    }

    #[test]
    fn test_mark_booked_unknown_user_is_a_noop() {
        let (store, path, _dir) = fresh_store();
        store.assign_slot("123456789", "8:30 am").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(!store.mark_booked("987654321").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_reassigning_resets_booked_flag() {
        let (store, _path, _dir) = fresh_store();
        store.assign_slot("123456789", "8:30 am").unwrap();
        store.mark_booked("123456789").unwrap();

        store.assign_slot("123456789", "9:00 am").unwrap();
        let assignments = store.assignments();
        let assignment = assignments.get("123456789").unwrap();
        assert_eq!(assignment.time, "9:00 am");
        assert!(!assignment.booked);
    }

    #[test]
    fn test_file_shape_matches_store_format() {
        let (store, path, _dir) = fresh_store();
        store.assign_slot("123456789", "8:30 am").unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            serde_json::json!({
                "123456789": { "time": "8:30 am", "booked": false }
            })
        );
    }
}
