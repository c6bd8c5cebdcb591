use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::AccessGuard;
use crate::features::favorites::repositories::FavoriteRepository;
use crate::features::files::dtos::{FileResponseDto, ListFilesQuery};
use crate::features::files::models::File;
use crate::features::files::repositories::FileRepository;
use crate::modules::storage::BlobStore;
use crate::shared::constants::MAX_CONCURRENT_URL_LOOKUPS;

/// Read path for an organization's files
pub struct FileQueryService {
    guard: Arc<AccessGuard>,
    files: Arc<dyn FileRepository>,
    favorites: Arc<dyn FavoriteRepository>,
    blob_store: Arc<dyn BlobStore>,
}

impl FileQueryService {
    pub fn new(
        guard: Arc<AccessGuard>,
        files: Arc<dyn FileRepository>,
        favorites: Arc<dyn FavoriteRepository>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            guard,
            files,
            favorites,
            blob_store,
        }
    }

    /// List the org's files visible to the caller.
    ///
    /// Filters apply in a fixed order: name query, type, favorites, then trash vs
    /// active. A caller without access gets an empty list rather than an error.
    pub async fn list_files(
        &self,
        token: Option<&str>,
        org_id: &str,
        query: &ListFilesQuery,
    ) -> Result<Vec<FileResponseDto>> {
        let access = match self.guard.check_org_access(token, org_id).await {
            Ok(access) => access,
            Err(e) if e.is_denial() => {
                debug!("Listing org '{}' denied: {}", org_id, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = self.files.list_by_org(org_id).await?;

        if let Some(text) = query.query.as_deref().filter(|q| !q.is_empty()) {
            let needle = text.to_lowercase();
            files.retain(|file| file.name.to_lowercase().contains(&needle));
        }

        if let Some(file_type) = query.file_type {
            files.retain(|file| file.file_type == file_type);
        }

        let favorited: HashSet<Uuid> = self
            .favorites
            .list_for_user_in_org(access.user.id, org_id)
            .await?
            .into_iter()
            .map(|favorite| favorite.file_id)
            .collect();

        // Ordered so each URL lines up with its file below
        let lookups: Vec<_> = files.iter().map(|file| self.resolve_url(file)).collect();
        let urls: Vec<Option<String>> =
            stream::iter(lookups)
                .buffered(MAX_CONCURRENT_URL_LOOKUPS)
                .collect()
                .await;

        let mut listed: Vec<FileResponseDto> = files
            .into_iter()
            .zip(urls)
            .map(|(file, url)| {
                let is_favorited = favorited.contains(&file.id);
                FileResponseDto::from_file(file, url, is_favorited)
            })
            .collect();

        if query.favorites {
            listed.retain(|file| file.is_favorited);
        }

        if query.trash {
            listed.retain(|file| file.marked_as_deleted);
        } else {
            listed.retain(|file| !file.marked_as_deleted);
        }

        Ok(listed)
    }

    /// Per-file URL; storage failures degrade to `None` for that file only
    async fn resolve_url(&self, file: &File) -> Option<String> {
        match self.blob_store.get_url(&file.blob_ref).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to resolve URL for file {}: {}", file.id, e);
                None
            }
        }
    }
}
