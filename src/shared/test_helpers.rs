#![cfg(test)]

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::Utc;
use fake::faker::name::en::Name;
use fake::Fake;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Mutex};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::favorites::models::{Favorite, FavoriteKey};
use crate::features::favorites::repositories::FavoriteRepository;
use crate::features::files::models::{File, FileType, NewFile};
use crate::features::files::repositories::FileRepository;
use crate::features::users::models::{MembershipRelation, NewUser, OrgRole, User};
use crate::features::users::repositories::UserRepository;
use crate::modules::storage::blob_store::BlobStoreError;
use crate::modules::storage::{BlobStore, UploadTarget};

/// User record that lives outside any store
pub fn test_user(token_identifier: &str) -> User {
    User {
        id: Uuid::new_v4(),
        token_identifier: token_identifier.to_string(),
        name: Some(Name().fake()),
        image: None,
        memberships: MembershipRelation::default(),
        created_at: Utc::now(),
    }
}

impl User {
    pub fn with_org(mut self, org_id: &str, role: OrgRole) -> Self {
        self.memberships = self.memberships.with_membership(org_id, role);
        self
    }
}

#[derive(Default)]
struct StoreState {
    users: HashMap<Uuid, User>,
    files: HashMap<Uuid, File>,
    favorites: Vec<Favorite>,
}

/// In-memory users, files and favorites with the same semantics as the Postgres
/// repositories (unique favorite key, conditional flag updates, cascading deletes).
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    favorite_gate: Mutex<Option<Arc<Barrier>>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn provision_user(&self, token_identifier: &str) -> User {
        let user = test_user(token_identifier);
        self.state
            .lock()
            .await
            .users
            .insert(user.id, user.clone());
        user
    }

    pub async fn provision_member(
        &self,
        token_identifier: &str,
        org_id: &str,
        role: OrgRole,
    ) -> User {
        let user = test_user(token_identifier).with_org(org_id, role);
        self.state
            .lock()
            .await
            .users
            .insert(user.id, user.clone());
        user
    }

    pub async fn set_role(&self, token_identifier: &str, org_id: &str, role: OrgRole) {
        let mut state = self.state.lock().await;
        if let Some(user) = state
            .users
            .values_mut()
            .find(|u| u.token_identifier == token_identifier)
        {
            user.memberships = user.memberships.with_membership(org_id, role);
        }
    }

    pub async fn seed_file(
        &self,
        owner: &User,
        org_id: &str,
        name: &str,
        file_type: FileType,
    ) -> File {
        let file = File {
            id: Uuid::new_v4(),
            name: name.to_string(),
            file_type,
            org_id: org_id.to_string(),
            user_id: owner.id,
            blob_ref: format!("uploads/{}", Uuid::new_v4()),
            marked_as_deleted: false,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .files
            .insert(file.id, file.clone());
        file
    }

    pub async fn mark_deleted(&self, file_id: Uuid) {
        self.set_flag(file_id, true).await;
    }

    pub async fn restore(&self, file_id: Uuid) {
        self.set_flag(file_id, false).await;
    }

    async fn set_flag(&self, file_id: Uuid, marked: bool) {
        if let Some(file) = self.state.lock().await.files.get_mut(&file_id) {
            file.marked_as_deleted = marked;
        }
    }

    pub async fn seed_favorite(&self, user: &User, file: &File) {
        let key = FavoriteKey {
            user_id: user.id,
            org_id: &file.org_id,
            file_id: file.id,
        };
        FavoriteRepository::insert(self, key)
            .await
            .expect("seed favorite");
    }

    pub async fn file(&self, file_id: Uuid) -> Option<File> {
        self.state.lock().await.files.get(&file_id).cloned()
    }

    pub async fn favorite_count(&self) -> usize {
        self.state.lock().await.favorites.len()
    }

    /// Make favorite writes wait until `writers` of them are pending
    pub async fn gate_favorite_writes(&self, writers: usize) {
        *self.favorite_gate.lock().await = Some(Arc::new(Barrier::new(writers)));
    }

    async fn pass_favorite_gate(&self) {
        let gate = self.favorite_gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_token(&self, token_identifier: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.token_identifier == token_identifier)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn create_if_absent(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .users
            .values()
            .find(|u| u.token_identifier == new_user.token_identifier)
        {
            return Ok(existing.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            token_identifier: new_user.token_identifier,
            name: new_user.name,
            image: new_user.image,
            memberships: MembershipRelation::default(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        token_identifier: &str,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state
            .users
            .values_mut()
            .find(|u| u.token_identifier == token_identifier)
        else {
            return Ok(None);
        };

        if name.is_some() {
            user.name = name;
        }
        if image.is_some() {
            user.image = image;
        }
        Ok(Some(user.clone()))
    }

    async fn upsert_membership(
        &self,
        user_id: Uuid,
        org_id: &str,
        role: OrgRole,
    ) -> Result<MembershipRelation> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&user_id).expect("user exists");
        user.memberships = user.memberships.with_membership(org_id, role);
        Ok(user.memberships.clone())
    }

    async fn remove_membership(&self, user_id: Uuid, org_id: &str) -> Result<MembershipRelation> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&user_id).expect("user exists");
        user.memberships = user.memberships.without_org(org_id);
        Ok(user.memberships.clone())
    }
}

#[async_trait]
impl FileRepository for InMemoryStore {
    async fn insert(&self, new_file: NewFile) -> Result<File> {
        let file = File {
            id: Uuid::new_v4(),
            name: new_file.name,
            file_type: new_file.file_type,
            org_id: new_file.org_id,
            user_id: new_file.user_id,
            blob_ref: new_file.blob_ref,
            marked_as_deleted: false,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .files
            .insert(file.id, file.clone());
        Ok(file)
    }

    async fn get(&self, id: Uuid) -> Result<Option<File>> {
        Ok(self.state.lock().await.files.get(&id).cloned())
    }

    async fn list_by_org(&self, org_id: &str) -> Result<Vec<File>> {
        let state = self.state.lock().await;
        Ok(state
            .files
            .values()
            .filter(|f| f.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn list_marked_as_deleted(&self) -> Result<Vec<File>> {
        let state = self.state.lock().await;
        Ok(state
            .files
            .values()
            .filter(|f| f.marked_as_deleted)
            .cloned()
            .collect())
    }

    async fn set_marked_as_deleted(&self, id: Uuid, marked: bool) -> Result<Option<File>> {
        let mut state = self.state.lock().await;
        match state.files.get_mut(&id) {
            Some(file) if file.marked_as_deleted != marked => {
                file.marked_as_deleted = marked;
                Ok(Some(file.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_if_marked(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.files.get(&id) {
            Some(file) if file.marked_as_deleted => {
                state.files.remove(&id);
                state.favorites.retain(|f| f.file_id != id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn matches_key(favorite: &Favorite, key: &FavoriteKey<'_>) -> bool {
    favorite.user_id == key.user_id
        && favorite.org_id == key.org_id
        && favorite.file_id == key.file_id
}

#[async_trait]
impl FavoriteRepository for InMemoryStore {
    async fn find(&self, key: FavoriteKey<'_>) -> Result<Option<Favorite>> {
        let state = self.state.lock().await;
        Ok(state
            .favorites
            .iter()
            .find(|f| matches_key(f, &key))
            .cloned())
    }

    async fn insert(&self, key: FavoriteKey<'_>) -> Result<bool> {
        self.pass_favorite_gate().await;

        let mut state = self.state.lock().await;
        if state.favorites.iter().any(|f| matches_key(f, &key)) {
            return Ok(false);
        }

        state.favorites.push(Favorite {
            id: Uuid::new_v4(),
            file_id: key.file_id,
            org_id: key.org_id.to_string(),
            user_id: key.user_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete(&self, key: FavoriteKey<'_>) -> Result<bool> {
        self.pass_favorite_gate().await;

        let mut state = self.state.lock().await;
        let before = state.favorites.len();
        state.favorites.retain(|f| !matches_key(f, &key));
        Ok(state.favorites.len() < before)
    }

    async fn list_for_user_in_org(&self, user_id: Uuid, org_id: &str) -> Result<Vec<Favorite>> {
        let state = self.state.lock().await;
        Ok(state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id && f.org_id == org_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct BlobState {
    present: HashSet<String>,
    failing: HashSet<String>,
    deleted: Vec<String>,
}

/// Blob store double with per-blob failure injection, a deletion log and a count of
/// the most calls ever in flight at once
#[derive(Default)]
pub struct InMemoryBlobStore {
    state: Mutex<BlobState>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn put(&self, blob_ref: &str) {
        self.state.lock().await.present.insert(blob_ref.to_string());
    }

    pub async fn fail_on(&self, blob_ref: &str) {
        self.state.lock().await.failing.insert(blob_ref.to_string());
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing.clear();
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.state.lock().await.deleted.clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Count the call as in flight across a yield so concurrent callers overlap
    async fn tracked<T>(&self, call: impl Future<Output = T>) -> T {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let result = call.await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn generate_upload_url(&self) -> std::result::Result<UploadTarget, BlobStoreError> {
        let blob_ref = format!("uploads/{}", Uuid::now_v7());
        // Treat the upload as completed right away
        self.state.lock().await.present.insert(blob_ref.clone());

        Ok(UploadTarget {
            upload_url: format!("https://blobs.test/{}?signature=put", blob_ref),
            blob_ref,
        })
    }

    async fn get_url(&self, blob_ref: &str) -> std::result::Result<Option<String>, BlobStoreError> {
        self.tracked(async {
            let state = self.state.lock().await;
            if state.failing.contains(blob_ref) {
                return Err(BlobStoreError::Request(format!(
                    "injected failure for {}",
                    blob_ref
                )));
            }

            Ok(state
                .present
                .contains(blob_ref)
                .then(|| format!("https://blobs.test/{}", blob_ref)))
        })
        .await
    }

    async fn delete(&self, blob_ref: &str) -> std::result::Result<(), BlobStoreError> {
        self.tracked(async {
            let mut state = self.state.lock().await;
            if state.failing.contains(blob_ref) {
                return Err(BlobStoreError::Status {
                    blob_ref: blob_ref.to_string(),
                    status: 503,
                });
            }

            state.present.remove(blob_ref);
            state.deleted.push(blob_ref.to_string());
            Ok(())
        })
        .await
    }
}

/// Authenticated caller for an `{issuer}|{sub}` identity token
pub fn authenticated_user(token_identifier: &str) -> AuthenticatedUser {
    let (issuer, sub) = token_identifier
        .split_once('|')
        .unwrap_or(("test-issuer", token_identifier));

    AuthenticatedUser {
        sub: sub.to_string(),
        issuer: issuer.to_string(),
        token_identifier: token_identifier.to_string(),
    }
}

/// Wrap a router so every request carries the given caller identity
pub fn with_user_auth(router: Router, token_identifier: &str) -> Router {
    let user = authenticated_user(token_identifier);
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}
