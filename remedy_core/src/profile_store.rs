//! Per-user medical profile persistence with file locking.
//!
//! Each user has one JSON file under the store root holding their medical
//! profile and active medication set. Writes are atomic, and `update` holds
//! an exclusive lock on a sidecar `<user_id>.lock` file for the whole
//! load-modify-save so concurrent CLI invocations cannot lose each other's changes.

use crate::{ActiveMedications, Error, Result, UserMedicalProfile};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Everything stored for one user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Absent until the user fills in the profile for the first time
    pub profile: Option<UserMedicalProfile>,
    #[serde(default)]
    pub active_medications: ActiveMedications,
}

impl UserRecord {
    pub fn empty(user_id: &str) -> Self {
        Self {
            profile: None,
            active_medications: ActiveMedications {
                user_id: user_id.to_string(),
                medication_ids: Vec::new(),
            },
        }
    }

    /// The profile, created with defaults on first use
    pub fn profile_mut(&mut self) -> &mut UserMedicalProfile {
        let user_id = self.active_medications.user_id.clone();
        self.profile
            .get_or_insert_with(|| UserMedicalProfile::new(user_id))
    }
}

/// Directory of per-user JSON records
#[derive(Clone, Debug)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !user_id.starts_with('.');
        if !valid {
            return Err(Error::Other(format!("Invalid user id '{}'", user_id)));
        }
        Ok(self.root.join(format!("{}.json", user_id)))
    }

    /// Load a user's record with shared locking
    ///
    /// Returns an empty record if the file doesn't exist. A file that cannot
    /// be parsed is logged and treated as absent; IO failures propagate.
    pub fn load(&self, user_id: &str) -> Result<UserRecord> {
        let path = self.path_for(user_id)?;
        if !path.exists() {
            tracing::debug!("No record for user {}, using empty record", user_id);
            return Ok(UserRecord::empty(user_id));
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<UserRecord>(&contents) {
            Ok(mut record) => {
                // The file name is authoritative for identity
                record.active_medications.user_id = user_id.to_string();
                if let Some(profile) = record.profile.as_mut() {
                    profile.user_id = user_id.to_string();
                }
                tracing::debug!("Loaded user record from {:?}", path);
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse user record {:?}: {}. Treating as empty.",
                    path,
                    e
                );
                Ok(UserRecord::empty(user_id))
            }
        }
    }

    /// Save a user's record with exclusive locking
    ///
    /// Writes to a temp file in the same directory, syncs, then renames over
    /// the original.
    pub fn save(&self, record: &UserRecord) -> Result<()> {
        let path = self.path_for(&record.active_medications.user_id)?;
        std::fs::create_dir_all(&self.root)?;

        let temp = NamedTempFile::new_in(&self.root)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(record)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user record to {:?}", path);
        Ok(())
    }

    /// Exclusive lock on `<user_id>.lock`, held until the returned file is dropped
    fn lock_record(&self, user_id: &str) -> Result<File> {
        let path = self.path_for(user_id)?.with_extension("lock");
        std::fs::create_dir_all(&self.root)?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// Load a record, modify it, and save it back
    ///
    /// The whole load-modify-save holds the user's lock file, so concurrent
    /// updates from other threads or processes are applied one after another.
    pub fn update<F>(&self, user_id: &str, f: F) -> Result<UserRecord>
    where
        F: FnOnce(&mut UserRecord) -> Result<()>,
    {
        let _lock = self.lock_record(user_id)?;

        let mut record = self.load(user_id)?;
        f(&mut record)?;
        if let Some(profile) = record.profile.as_mut() {
            profile.updated_at = Some(chrono::Utc::now());
        }
        self.save(&record)?;
        Ok(record)
    }
}
