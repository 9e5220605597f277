use crate::domain::model::{EmailJob, ItemVersion, ListableItem};
use crate::domain::ports::{DocumentStore, EmailQueue};
use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// A JSON object on disk keyed by record id. Every write replaces the file
/// through a temporary sibling so a crash never leaves it half-written.
///
/// Read-modify-write cycles hold an advisory lock on `<file>.lock`, so separate
/// store instances and separate processes sharing one file serialize their
/// conditional writes.
#[derive(Debug)]
struct JsonFile {
    path: PathBuf,
    local: Mutex<()>,
}

/// Proof that the caller holds both the in-process mutex and the file lock.
struct WriteGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _file: std::fs::File,
}

impl JsonFile {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            local: Mutex::new(()),
        }
    }

    async fn lock(&self) -> Result<WriteGuard<'_>> {
        let local = self.local.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let lock_path = sibling(&self.path, ".lock");
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            file.lock()?;
            Ok(file)
        })
        .await
        .map_err(|e| MarketError::StorageError {
            message: format!("waiting for lock on {}: {}", self.path.display(), e),
        })??;

        Ok(WriteGuard {
            _local: local,
            _file: file,
        })
    }

    async fn load<T: DeserializeOwned>(&self) -> Result<BTreeMap<String, T>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist<T: Serialize>(
        &self,
        _guard: &WriteGuard<'_>,
        records: &BTreeMap<String, T>,
    ) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = sibling(&self.path, &format!(".{}.{}.tmp", std::process::id(), seq));
        tokio::fs::write(&tmp, data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Items kept in a single JSON file shared by every CLI process on the host.
#[derive(Debug)]
pub struct JsonFileStore {
    file: JsonFile,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl DocumentStore for JsonFileStore {
    async fn get(&self, id: &str) -> Result<Option<ListableItem>> {
        let mut items = self.file.load::<ListableItem>().await?;
        Ok(items.remove(id))
    }

    async fn list(&self) -> Result<Vec<ListableItem>> {
        let items = self.file.load::<ListableItem>().await?;
        Ok(items.into_values().collect())
    }

    async fn insert(&self, item: &ListableItem) -> Result<()> {
        let guard = self.file.lock().await?;
        let mut items = self.file.load::<ListableItem>().await?;
        if items.contains_key(&item.id) {
            return Err(MarketError::AlreadyExists(item.id.clone()));
        }
        items.insert(item.id.clone(), item.clone());
        self.file.persist(&guard, &items).await
    }

    async fn update_if(&self, item: &ListableItem, expected: ItemVersion) -> Result<bool> {
        let guard = self.file.lock().await?;
        let mut items = self.file.load::<ListableItem>().await?;
        match items.get(&item.id) {
            Some(current) if expected.matches(current) => {}
            Some(_) => return Ok(false),
            None => return Err(MarketError::NotFound(item.id.clone())),
        }
        items.insert(item.id.clone(), item.clone());
        self.file.persist(&guard, &items).await?;
        Ok(true)
    }

    async fn delete_if(&self, id: &str, expected: ItemVersion) -> Result<bool> {
        let guard = self.file.lock().await?;
        let mut items = self.file.load::<ListableItem>().await?;
        match items.get(id) {
            Some(current) if expected.matches(current) => {}
            _ => return Ok(false),
        }
        items.remove(id);
        self.file.persist(&guard, &items).await?;
        Ok(true)
    }
}

#[derive(Debug)]
pub struct JsonFileEmailQueue {
    file: JsonFile,
}

impl JsonFileEmailQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub async fn all(&self) -> Result<Vec<EmailJob>> {
        let jobs = self.file.load::<EmailJob>().await?;
        Ok(jobs.into_values().collect())
    }
}

impl EmailQueue for JsonFileEmailQueue {
    async fn enqueue(&self, job: &EmailJob) -> Result<()> {
        let guard = self.file.lock().await?;
        let mut jobs = self.file.load::<EmailJob>().await?;
        if jobs.contains_key(&job.id) {
            return Err(MarketError::AlreadyExists(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job.clone());
        self.file.persist(&guard, &jobs).await
    }

    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<EmailJob>> {
        let jobs = self.file.load::<EmailJob>().await?;
        Ok(jobs.into_values().filter(|job| job.is_due(now)).collect())
    }

    async fn save(&self, job: &EmailJob) -> Result<()> {
        let guard = self.file.lock().await?;
        let mut jobs = self.file.load::<EmailJob>().await?;
        jobs.insert(job.id.clone(), job.clone());
        self.file.persist(&guard, &jobs).await
    }
}
