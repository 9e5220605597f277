use crate::core::lifecycle::{can_reactivate, days_remaining, transition};
use crate::domain::model::{ItemKind, ItemStatus, LifecycleAction, ListableItem, TransitionOutcome};
use crate::domain::ports::{Clock, DocumentStore};
use crate::utils::error::{MarketError, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatusReport {
    pub id: String,
    pub status: ItemStatus,
    pub days_remaining: i64,
    pub can_reactivate: bool,
}

/// Applies owner actions to stored items.
///
/// Every write is conditional on the version that was read, so an owner
/// reactivating an item while the sweep deletes it can only have one winner.
pub struct ListingService<S: DocumentStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: DocumentStore, C: Clock> ListingService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create(
        &self,
        id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: ItemKind,
    ) -> Result<ListableItem> {
        let item = ListableItem::new(id, owner_id, kind, self.clock.now());
        self.store.insert(&item).await?;
        tracing::info!("Created {:?} {} for owner {}", item.kind, item.id, item.owner_id);
        Ok(item)
    }

    pub async fn get(&self, id: &str) -> Result<ListableItem> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| MarketError::NotFound(id.to_string()))
    }

    pub async fn status(&self, id: &str) -> Result<ItemStatusReport> {
        let item = self.get(id).await?;
        let now = self.clock.now();
        Ok(ItemStatusReport {
            id: item.id,
            status: item.status,
            days_remaining: days_remaining(item.deactivated_at, now),
            can_reactivate: item.status == ItemStatus::Unavailable
                && can_reactivate(item.deactivated_at, now),
        })
    }

    pub async fn apply(&self, id: &str, action: LifecycleAction) -> Result<TransitionOutcome> {
        let current = self.get(id).await?;
        let expected = current.version();
        let outcome = transition(&current, action, self.clock.now())?;

        let applied = match &outcome {
            TransitionOutcome::Updated(item) => self.store.update_if(item, expected).await?,
            TransitionOutcome::Delete(id) => self.store.delete_if(id, expected).await?,
        };

        if !applied {
            tracing::warn!("Lost a concurrent update on {} while applying {}", id, action);
            return Err(MarketError::Conflict { id: id.to_string() });
        }

        match &outcome {
            TransitionOutcome::Updated(item) => {
                tracing::info!("Applied {} to {}: {} -> {}", action, id, current.status, item.status)
            }
            TransitionOutcome::Delete(_) => tracing::info!("Permanently deleted {}", id),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::utils::error::LifecycleError;
    use crate::utils::time::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap()
    }

    fn service() -> ListingService<MemoryStore, FixedClock> {
        ListingService::new(MemoryStore::new(), FixedClock::new(t0()))
    }

    #[tokio::test]
    async fn test_deactivate_then_reactivate() {
        let svc = service();
        svc.create("loft", "ana", ItemKind::Listing).await.unwrap();

        svc.apply("loft", LifecycleAction::Deactivate).await.unwrap();
        let report = svc.status("loft").await.unwrap();
        assert_eq!(report.status, ItemStatus::Unavailable);
        assert_eq!(report.days_remaining, 5);
        assert!(report.can_reactivate);

        svc.clock.advance(Duration::days(3));
        svc.apply("loft", LifecycleAction::Reactivate).await.unwrap();
        let item = svc.get("loft").await.unwrap();
        assert_eq!(item.status, ItemStatus::Active);
        assert_eq!(item.deactivated_at, None);
        assert_eq!(item.updated_at, t0() + Duration::days(3));
    }

    #[tokio::test]
    async fn test_expired_item_can_only_be_deleted() {
        let svc = service();
        svc.create("desk", "ben", ItemKind::SaleItem).await.unwrap();
        svc.apply("desk", LifecycleAction::Deactivate).await.unwrap();

        assert!(matches!(
            svc.apply("desk", LifecycleAction::HardDelete).await,
            Err(MarketError::Lifecycle(LifecycleError::GracePeriodStillActive))
        ));

        svc.clock.advance(Duration::days(5));
        assert!(matches!(
            svc.apply("desk", LifecycleAction::Reactivate).await,
            Err(MarketError::Lifecycle(LifecycleError::GracePeriodExpired))
        ));
        let outcome = svc.apply("desk", LifecycleAction::HardDelete).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Delete("desk".to_string()));
        assert!(matches!(svc.get("desk").await, Err(MarketError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let svc = service();
        assert!(matches!(
            svc.apply("missing", LifecycleAction::Complete).await,
            Err(MarketError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_of_active_item() {
        let svc = service();
        svc.create("bike", "cy", ItemKind::SaleItem).await.unwrap();
        let report = svc.status("bike").await.unwrap();
        assert_eq!(report.days_remaining, 0);
        assert!(!report.can_reactivate);
    }
}
