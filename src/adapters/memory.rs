use crate::domain::model::{EmailJob, ItemVersion, ListableItem};
use crate::domain::ports::{DocumentStore, EmailQueue};
use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process document store. Conditional writes are checked under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, ListableItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = ListableItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|i| (i.id.clone(), i)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<ListableItem>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ListableItem>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn insert(&self, item: &ListableItem) -> Result<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(MarketError::AlreadyExists(item.id.clone()));
        }
        items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn update_if(&self, item: &ListableItem, expected: ItemVersion) -> Result<bool> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id) {
            Some(current) if expected.matches(current) => {
                *current = item.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(MarketError::NotFound(item.id.clone())),
        }
    }

    async fn delete_if(&self, id: &str, expected: ItemVersion) -> Result<bool> {
        let mut items = self.items.write().await;
        match items.get(id) {
            Some(current) if expected.matches(current) => {
                items.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryEmailQueue {
    jobs: RwLock<BTreeMap<String, EmailJob>>,
}

impl MemoryEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<EmailJob> {
        self.jobs.read().await.get(id).cloned()
    }
}

impl EmailQueue for MemoryEmailQueue {
    async fn enqueue(&self, job: &EmailJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(MarketError::AlreadyExists(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<EmailJob>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.is_due(now))
            .cloned()
            .collect())
    }

    async fn save(&self, job: &EmailJob) -> Result<()> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(())
    }
}
