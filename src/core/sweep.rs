use crate::core::lifecycle::sweep_expired;
use crate::domain::ports::{Clock, DocumentStore};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: Vec<String>,
    pub deleted: usize,
    /// Candidates that changed between the scan and the delete.
    pub skipped: usize,
    pub failed: usize,
}

/// Permanently removes items whose grace period has run out.
///
/// Running it again with the same clock is harmless: already deleted items are
/// gone and anything reactivated in the meantime no longer matches.
pub struct SweepEngine<S: DocumentStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: DocumentStore, C: Clock> SweepEngine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, dry_run: bool) -> Result<SweepReport> {
        let now = self.clock.now();
        tracing::info!("Starting expired-item sweep at {}", now);

        let items = self.store.list().await?;
        let expired = sweep_expired(&items, now);
        let versions: HashMap<&str, _> = items.iter().map(|i| (i.id.as_str(), i.version())).collect();

        let mut report = SweepReport {
            scanned: items.len(),
            expired: expired.clone(),
            ..SweepReport::default()
        };
        tracing::info!("Scanned {} items, {} past their grace period", report.scanned, expired.len());

        if dry_run {
            tracing::info!("Dry run, nothing deleted");
            return Ok(report);
        }

        for id in &expired {
            let Some(version) = versions.get(id.as_str()).copied() else {
                continue;
            };
            match self.store.delete_if(id, version).await {
                Ok(true) => {
                    tracing::debug!("Deleted expired item {}", id);
                    report.deleted += 1;
                }
                Ok(false) => {
                    tracing::info!("Item {} changed since the scan, leaving it", id);
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to delete expired item {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "✅ Sweep finished: {} deleted, {} skipped, {} failed",
            report.deleted,
            report.skipped,
            report.failed
        );
        Ok(report)
    }
}
