use crate::domain::model::{EmailJob, GeoPoint, ItemVersion, ListableItem};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Document store holding listings and sale items.
///
/// `update_if` and `delete_if` are conditional: they only apply when the stored
/// record still matches `expected`, and report `false` otherwise.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ListableItem>>> + Send;
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<ListableItem>>> + Send;
    fn insert(&self, item: &ListableItem) -> impl std::future::Future<Output = Result<()>> + Send;
    fn update_if(
        &self,
        item: &ListableItem,
        expected: ItemVersion,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
    fn delete_if(
        &self,
        id: &str,
        expected: ItemVersion,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

pub trait EmailQueue: Send + Sync {
    fn enqueue(&self, job: &EmailJob) -> impl std::future::Future<Output = Result<()>> + Send;
    fn due(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<EmailJob>>> + Send;
    fn save(&self, job: &EmailJob) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Turns a free-text address into coordinates.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<GeoPoint>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, job: &EmailJob) -> Result<()>;
}
