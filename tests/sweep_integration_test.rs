use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use sublease_core::core::{DocumentStore, ItemKind, ItemStatus, ItemVersion, LifecycleAction, ListableItem};
use sublease_core::{FixedClock, JsonFileStore, ListingService, MarketError, SweepEngine};
use tempfile::TempDir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn test_owner_actions_then_sweep_on_file_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("items.json");
    let clock = Arc::new(FixedClock::new(t0()));

    let service = ListingService::new(JsonFileStore::new(&path), clock.clone());
    service.create("loft-2b", "maya", ItemKind::Listing).await?;
    service.create("futon", "maya", ItemKind::SaleItem).await?;
    service.create("bike", "leo", ItemKind::SaleItem).await?;

    service.apply("loft-2b", LifecycleAction::Deactivate).await?;
    service.apply("bike", LifecycleAction::Complete).await?;
    clock.advance(Duration::days(3));
    service.apply("futon", LifecycleAction::Deactivate).await?;

    // Day 5 after the loft was deactivated: only the loft is past its grace period.
    clock.advance(Duration::days(2));
    let engine = SweepEngine::new(JsonFileStore::new(&path), clock.clone());

    let preview = engine.run(true).await?;
    assert_eq!(preview.expired, vec!["loft-2b".to_string()]);
    assert_eq!(engine.store().list().await?.len(), 3);

    let report = engine.run(false).await?;
    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 0);

    let rerun = engine.run(false).await?;
    assert_eq!(rerun.scanned, 2);
    assert!(rerun.expired.is_empty());

    let futon = service.status("futon").await?;
    assert_eq!(futon.status, ItemStatus::Unavailable);
    assert_eq!(futon.days_remaining, 3);
    assert!(futon.can_reactivate);

    assert!(matches!(
        service.get("loft-2b").await,
        Err(MarketError::NotFound(_))
    ));
    Ok(())
}

/// File store whose owner relists one item right after the sweep has listed it.
struct RelistDuringSweep {
    inner: JsonFileStore,
    target: &'static str,
}

impl DocumentStore for RelistDuringSweep {
    async fn get(&self, id: &str) -> sublease_core::Result<Option<ListableItem>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> sublease_core::Result<Vec<ListableItem>> {
        let items = self.inner.list().await?;
        if let Some(seen) = items.iter().find(|item| item.id == self.target) {
            let mut relisted = seen.clone();
            relisted.status = ItemStatus::Active;
            relisted.deactivated_at = None;
            self.inner.update_if(&relisted, seen.version()).await?;
        }
        Ok(items)
    }

    async fn insert(&self, item: &ListableItem) -> sublease_core::Result<()> {
        self.inner.insert(item).await
    }

    async fn update_if(&self, item: &ListableItem, expected: ItemVersion) -> sublease_core::Result<bool> {
        self.inner.update_if(item, expected).await
    }

    async fn delete_if(&self, id: &str, expected: ItemVersion) -> sublease_core::Result<bool> {
        self.inner.delete_if(id, expected).await
    }
}

#[tokio::test]
async fn test_sweep_skips_item_reactivated_after_scan() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("items.json");
    let clock = Arc::new(FixedClock::new(t0()));
    let service = ListingService::new(JsonFileStore::new(&path), clock.clone());

    service.create("sofa", "ira", ItemKind::SaleItem).await?;
    service.create("desk", "ira", ItemKind::SaleItem).await?;
    service.apply("sofa", LifecycleAction::Deactivate).await?;
    service.apply("desk", LifecycleAction::Deactivate).await?;
    clock.advance(Duration::days(5));

    let store = RelistDuringSweep {
        inner: JsonFileStore::new(&path),
        target: "sofa",
    };
    let report = SweepEngine::new(store, clock.clone()).run(false).await?;

    assert_eq!(report.expired, vec!["desk".to_string(), "sofa".to_string()]);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(service.get("sofa").await?.status, ItemStatus::Active);
    assert!(matches!(service.get("desk").await, Err(MarketError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_reactivating_swept_item_reports_not_found() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("items.json");
    let clock = Arc::new(FixedClock::new(t0()));
    let service = ListingService::new(JsonFileStore::new(&path), clock.clone());
    service.create("room", "jo", ItemKind::Listing).await?;
    service.apply("room", LifecycleAction::Deactivate).await?;

    clock.advance(Duration::days(6));
    let engine = SweepEngine::new(JsonFileStore::new(&path), clock.clone());
    engine.run(false).await?;

    let err = service
        .apply("room", LifecycleAction::Reactivate)
        .await
        .expect_err("item is gone");
    assert!(matches!(err, MarketError::NotFound(_)));
    Ok(())
}
