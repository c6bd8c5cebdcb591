use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::files::models::{transition, LifecycleEvent};
use crate::features::files::repositories::FileRepository;
use crate::modules::storage::BlobStore;
use crate::shared::constants::MAX_CONCURRENT_PURGES;

/// Tally of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Soft-deleted files found at the start of the sweep
    pub candidates: usize,
    pub purged: usize,
    /// Restored or already gone by the time they were reached
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PurgeOutcome {
    Purged,
    Skipped,
    Failed,
}

/// Background worker that permanently removes files sitting in the trash.
///
/// Runs without a caller identity. Purging releases the blob first and then removes
/// the record; both steps tolerate being repeated on the next sweep.
pub struct RetentionSweeper {
    files: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(
        files: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
        interval: Duration,
    ) -> Self {
        Self {
            files,
            blob_store,
            interval,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting retention sweeper (interval: {}s)",
            self.interval.as_secs()
        );

        let mut interval = self.ticker();

        loop {
            interval.tick().await;

            match self.sweep_expired().await {
                Ok(report) if report.candidates > 0 => {
                    tracing::info!(
                        "Retention sweep finished: candidates={}, purged={}, skipped={}, failed={}",
                        report.candidates,
                        report.purged,
                        report.skipped,
                        report.failed
                    );
                }
                Ok(_) => tracing::debug!("Retention sweep found nothing to purge"),
                Err(e) => tracing::error!("Retention sweep failed: {:?}", e),
            }
        }
    }

    /// A sweep that overruns pushes the next one back instead of bursting
    fn ticker(&self) -> Interval {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Purge every soft-deleted file independently, a bounded number at a time
    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        let candidates = self.files.list_marked_as_deleted().await?;

        let purges: Vec<_> = candidates.iter().map(|file| self.purge(file.id)).collect();
        let outcomes: Vec<PurgeOutcome> =
            stream::iter(purges)
                .buffer_unordered(MAX_CONCURRENT_PURGES)
                .collect()
                .await;

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                PurgeOutcome::Purged => report.purged += 1,
                PurgeOutcome::Skipped => report.skipped += 1,
                PurgeOutcome::Failed => report.failed += 1,
            }
        }

        Ok(report)
    }

    async fn purge(&self, file_id: Uuid) -> PurgeOutcome {
        // Re-read: the file may have been restored or purged since the listing
        let file = match self.files.get(file_id).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                tracing::debug!("File {} already gone, skipping", file_id);
                return PurgeOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("Failed to load file {} for purge: {:?}", file_id, e);
                return PurgeOutcome::Failed;
            }
        };

        if let Err(e) = transition(file.state(), LifecycleEvent::Purge) {
            tracing::debug!("Skipping purge of file {}: {}", file_id, e);
            return PurgeOutcome::Skipped;
        }

        if let Err(e) = self.blob_store.delete(&file.blob_ref).await {
            tracing::error!(
                "Failed to release blob '{}' of file {}: {}",
                file.blob_ref,
                file_id,
                e
            );
            return PurgeOutcome::Failed;
        }

        match self.files.delete_if_marked(file_id).await {
            Ok(true) => {
                tracing::info!(
                    "Purged file {} (org={}, blob={})",
                    file_id,
                    file.org_id,
                    file.blob_ref
                );
                PurgeOutcome::Purged
            }
            Ok(false) => {
                tracing::warn!(
                    "File {} left the trash after its blob was released",
                    file_id
                );
                PurgeOutcome::Skipped
            }
            Err(e) => {
                tracing::error!("Failed to delete record of file {}: {:?}", file_id, e);
                PurgeOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::{AccessGuard, IdentityResolver};
    use crate::features::files::dtos::{CreateFileDto, ListFilesQuery};
    use crate::features::files::models::FileType;
    use crate::features::files::services::{FileQueryService, FileService};
    use crate::shared::test_helpers::{InMemoryBlobStore, InMemoryStore};

    fn sweeper(store: &Arc<InMemoryStore>, blobs: &Arc<InMemoryBlobStore>) -> RetentionSweeper {
        RetentionSweeper::new(store.clone(), blobs.clone(), Duration::from_secs(1800))
    }

    #[tokio::test]
    async fn test_personal_scope_scenario_ends_in_purge() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        store.provision_user("issuer|u1").await;
        let guard = Arc::new(AccessGuard::new(
            IdentityResolver::new(store.clone()),
            store.clone(),
        ));
        let files = FileService::new(guard.clone(), store.clone(), blobs.clone());
        let queries = FileQueryService::new(guard, store.clone(), store.clone(), blobs.clone());
        let token = Some("issuer|u1");
        let trash = ListFilesQuery {
            trash: true,
            ..Default::default()
        };

        let upload = files.generate_upload_url(token).await.unwrap();
        let f1 = files
            .create_file(
                token,
                CreateFileDto {
                    name: "F1".to_string(),
                    blob_ref: upload.blob_ref.clone(),
                    org_id: "u1".to_string(),
                    file_type: None,
                    content_type: Some("text/plain".to_string()),
                },
            )
            .await
            .unwrap();

        let listed = queries
            .list_files(token, "u1", &ListFilesQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, f1.id);

        files.delete_file(token, f1.id).await.unwrap();
        assert!(queries
            .list_files(token, "u1", &ListFilesQuery::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(queries.list_files(token, "u1", &trash).await.unwrap().len(), 1);

        let report = sweeper(&store, &blobs).sweep_expired().await.unwrap();
        assert_eq!(report.purged, 1);
        assert!(queries.list_files(token, "u1", &trash).await.unwrap().is_empty());
        assert!(blobs.deleted().await.contains(&upload.blob_ref));
    }

    #[tokio::test]
    async fn test_active_files_are_never_purged() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let active = store.seed_file(&user, "u1", "keep.txt", FileType::Txt).await;

        let report = sweeper(&store, &blobs).sweep_expired().await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(store.file(active.id).await.is_some());
    }

    #[tokio::test]
    async fn test_blob_failure_is_isolated_and_retried() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let ok = store.seed_file(&user, "u1", "ok.txt", FileType::Txt).await;
        let stuck = store.seed_file(&user, "u1", "stuck.txt", FileType::Txt).await;
        store.mark_deleted(ok.id).await;
        store.mark_deleted(stuck.id).await;
        blobs.fail_on(&stuck.blob_ref).await;
        let sweeper = sweeper(&store, &blobs);

        let first = sweeper.sweep_expired().await.unwrap();
        assert_eq!(first.candidates, 2);
        assert_eq!(first.purged, 1);
        assert_eq!(first.failed, 1);
        assert!(store.file(ok.id).await.is_none());
        assert!(store.file(stuck.id).await.is_some());

        blobs.clear_failures().await;

        let second = sweeper.sweep_expired().await.unwrap();
        assert_eq!(second.candidates, 1);
        assert_eq!(second.purged, 1);
        assert!(store.file(stuck.id).await.is_none());
    }

    #[tokio::test]
    async fn test_purge_is_safe_to_repeat() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&user, "u1", "x.txt", FileType::Txt).await;
        store.mark_deleted(file.id).await;
        let sweeper = sweeper(&store, &blobs);

        // Blob released on an earlier, interrupted sweep
        blobs.delete(&file.blob_ref).await.unwrap();

        assert_eq!(sweeper.purge(file.id).await, PurgeOutcome::Purged);
        assert_eq!(sweeper.purge(file.id).await, PurgeOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_restored_file_is_skipped() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&user, "u1", "x.txt", FileType::Txt).await;
        store.mark_deleted(file.id).await;
        let sweeper = sweeper(&store, &blobs);

        store.restore(file.id).await;

        assert_eq!(sweeper.purge(file.id).await, PurgeOutcome::Skipped);
        assert!(blobs.deleted().await.is_empty());
        assert!(store.file(file.id).await.is_some());
    }

    #[tokio::test]
    async fn test_purge_removes_favorites_of_the_file() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let file = store.seed_file(&user, "u1", "x.txt", FileType::Txt).await;
        store.seed_favorite(&user, &file).await;
        store.mark_deleted(file.id).await;

        sweeper(&store, &blobs).sweep_expired().await.unwrap();

        assert_eq!(store.favorite_count().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_purges_a_bounded_number_at_a_time() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let user = store.provision_user("issuer|u1").await;
        let count = MAX_CONCURRENT_PURGES * 3;
        for i in 0..count {
            let file = store
                .seed_file(&user, "u1", &format!("old{}.txt", i), FileType::Txt)
                .await;
            store.mark_deleted(file.id).await;
        }

        let report = sweeper(&store, &blobs).sweep_expired().await.unwrap();

        assert_eq!(report.purged, count);
        assert!(blobs.peak_in_flight() > 1);
        assert!(blobs.peak_in_flight() <= MAX_CONCURRENT_PURGES);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_sweep_does_not_trigger_a_burst() {
        let store = InMemoryStore::new();
        let blobs = InMemoryBlobStore::new();
        let sweeper = sweeper(&store, &blobs);
        let mut ticker = sweeper.ticker();
        ticker.tick().await;

        // A sweep that takes three intervals
        tokio::time::advance(sweeper.interval * 3).await;
        ticker.tick().await;

        let started = tokio::time::Instant::now();
        ticker.tick().await;
        assert_eq!(started.elapsed(), sweeper.interval);
    }

}
