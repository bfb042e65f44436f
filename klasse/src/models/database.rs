use super::{EventAttendanceBundle, EventId, User, UserId};
use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use file_lock::{FileLock, FileOptions};
use ron::ser::PrettyConfig;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, create_dir_all},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Start time in unix seconds -> events starting then.
type EventIndex = BTreeMap<i64, Vec<EventId>>;

const INDEX_FILE: &str = "event_index.ron";
const LOCK_FILE: &str = "index.lock";

// fcntl locks do not exclude threads of the same process
static INDEX_GUARD: Mutex<()> = Mutex::new(());

/// Offline copy of backend payloads, one RON file per user and per event.
///
/// ```text
/// <base>/db/users/<user id>.ron
/// <base>/db/events/<event id>.ron
/// <base>/db/event_index.ron
/// <base>/db/index.lock
/// ```
///
/// Every file is replaced whole: the new content goes to a temporary file in the same
/// folder which is then renamed over the old one, so a reader sees either version but never
/// a partial one. Updates of the index hold an exclusive lock on `index.lock` from reading
/// the index until the new one is in place.
pub struct Database {
    base_path: PathBuf,
}
impl Database {
    pub fn new<P>(base_path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let base_path = base_path.as_ref().join("db");
        create_dir_all(base_path.join("users"))?;
        create_dir_all(base_path.join("events"))?;
        let db = Self { base_path };
        {
            let _lock = db.lock_index()?;
            if !db.index_path().exists() {
                write_replacing(&db.index_path(), &EventIndex::new())?;
            }
        }
        debug!("opened snapshot store at {}", db.base_path.display());
        Ok(db)
    }

    pub fn add_user(&self, user: &User) -> Result<()> {
        write_replacing(&self.record_path("users", user.id.as_str()), user)
    }
    pub fn fetch_user(&self, id: &UserId) -> Result<User> {
        let path = self.record_path("users", id.as_str());
        if !path.is_file() {
            return Err(StoreError::not_found("user", id));
        }
        read_record(&path)
    }

    /// Writes the bundle and (re)indexes it under its start time.
    pub fn add_event(&self, bundle: &EventAttendanceBundle) -> Result<()> {
        let id = &bundle.event.id;
        let _lock = self.lock_index()?;
        write_replacing(&self.record_path("events", id.as_str()), bundle)?;

        let mut index: EventIndex = read_record(&self.index_path())?;
        for ids in index.values_mut() {
            ids.retain(|e| e != id);
        }
        index.retain(|_, ids| !ids.is_empty());
        if let Some(start) = bundle.event.start {
            index.entry(start.timestamp()).or_default().push(id.clone());
        }
        write_replacing(&self.index_path(), &index)
    }
    pub fn fetch_event(&self, id: &EventId) -> Result<EventAttendanceBundle> {
        let path = self.record_path("events", id.as_str());
        if !path.is_file() {
            return Err(StoreError::not_found("event", id));
        }
        Self::read_event_file(&path)
    }

    /// Events starting at or after `now`, earliest first.
    pub fn upcoming_events(&self, now: DateTime<Utc>) -> Result<Vec<EventId>> {
        let index: EventIndex = read_record(&self.index_path())?;
        Ok(index
            .range(now.timestamp()..)
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect())
    }

    /// Rebuilds the start time index from the files in `events/`.
    pub fn rebuild_index(&self) -> Result<()> {
        let _lock = self.lock_index()?;
        let mut index = EventIndex::new();
        for entry in fs::read_dir(self.events_dir())? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |e| e != "ron") {
                continue;
            }
            match Self::read_event_file(&path) {
                Ok(bundle) => {
                    if let Some(start) = bundle.event.start {
                        index
                            .entry(start.timestamp())
                            .or_default()
                            .push(bundle.event.id);
                    }
                }
                Err(e) => warn!("not indexing {}: {e}", path.display()),
            }
        }
        info!("indexed {} start times", index.len());
        write_replacing(&self.index_path(), &index)
    }

    pub fn events_dir(&self) -> PathBuf {
        self.base_path.join("events")
    }
    pub fn read_event_file(path: &Path) -> Result<EventAttendanceBundle> {
        read_record(path)
    }

    fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }
    /// Held for the whole read-modify-write of the index, by this process and by others.
    fn lock_index(&self) -> Result<IndexLock> {
        let guard = INDEX_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
        let options = FileOptions::new().write(true).create(true);
        let file = FileLock::lock(self.base_path.join(LOCK_FILE), true, options)?;
        Ok(IndexLock {
            _file: file,
            _guard: guard,
        })
    }
    fn record_path(&self, folder: &str, id: &str) -> PathBuf {
        [
            &self.base_path,
            &PathBuf::from(folder),
            &PathBuf::from(format!("{id}.ron")),
        ]
        .iter()
        .collect()
    }
}

/// Releases the file lock before the in-process guard.
struct IndexLock {
    _file: FileLock,
    _guard: MutexGuard<'static, ()>,
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    ron::de::from_bytes(&bytes).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_replacing<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        ron::ser::to_writer_pretty(&mut writer, value, PrettyConfig::default())?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
