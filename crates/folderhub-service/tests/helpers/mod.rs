//! Shared test helpers for folder service integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use folderhub_core::config::FolderConfig;
use folderhub_core::error::AppError;
use folderhub_core::events::DomainEvent;
use folderhub_core::result::AppResult;
use folderhub_core::traits::ActivityRecorder;
use folderhub_core::types::{FolderId, OwnerId};
use folderhub_database::{FolderStore, MemoryFolderStore};
use folderhub_entity::folder::path;
use folderhub_entity::folder::{CreateFolder, Folder, SubtreeRewrite};
use folderhub_service::{
    ActivityDispatcher, CreateFolderRequest, FolderService, RequestContext, TreeService,
};

/// Test application context
pub struct TestApp {
    /// Backing store, for direct inspection
    pub store: MemoryFolderStore,
    /// Folder service under test
    pub folders: FolderService,
    /// Tree service under test
    pub tree: TreeService,
    /// Captures dispatched activity
    pub recorder: Arc<RecordingRecorder>,
}

impl TestApp {
    /// Create a new test application with default folder rules
    pub fn new() -> Self {
        Self::with_config(FolderConfig::default())
    }

    /// Create a new test application with custom folder rules
    pub fn with_config(config: FolderConfig) -> Self {
        let store = MemoryFolderStore::new();
        Self::with_store(store.clone(), Arc::new(store), config)
    }

    /// Create a test application whose services use `backend`, while
    /// `store` stays available for inspection
    pub fn with_store(
        store: MemoryFolderStore,
        backend: Arc<dyn FolderStore>,
        config: FolderConfig,
    ) -> Self {
        let recorder = Arc::new(RecordingRecorder::default());
        let folders = FolderService::new(
            backend.clone(),
            ActivityDispatcher::new(recorder.clone()),
            config,
        );
        let tree = TreeService::new(backend, folders.clone());
        Self {
            store,
            folders,
            tree,
            recorder,
        }
    }

    /// A context for a fresh owner
    pub fn ctx(&self) -> RequestContext {
        RequestContext::new(OwnerId::new())
    }

    /// Create a folder, panicking on failure
    pub async fn create(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> Folder {
        self.folders
            .create(
                ctx,
                CreateFolderRequest {
                    name: name.to_string(),
                    parent_id,
                    ..Default::default()
                },
            )
            .await
            .unwrap_or_else(|e| panic!("Failed to create '{name}': {e}"))
    }

    /// Re-read a folder straight from the store
    pub async fn reload(&self, id: FolderId) -> Folder {
        self.store
            .get_by_id(id)
            .await
            .expect("store read")
            .expect("folder exists")
    }

    /// Assert that every stored folder of `owner_id` agrees with its parent
    /// on path and depth, and that exactly one root exists
    pub async fn assert_consistent(&self, owner_id: OwnerId) {
        let rows = self.store.snapshot(owner_id).await;
        let by_id: HashMap<FolderId, &Folder> = rows.iter().map(|f| (f.id, f)).collect();

        let roots: Vec<&Folder> = rows.iter().filter(|f| f.is_root).collect();
        assert_eq!(roots.len(), 1, "expected exactly one root");
        assert_eq!(roots[0].path, path::ROOT_PATH);
        assert_eq!(roots[0].depth, 0);

        for folder in rows.iter().filter(|f| !f.is_root) {
            let parent_id = folder.parent_id.expect("non-root has a parent");
            let parent = by_id.get(&parent_id).expect("parent exists");
            assert_eq!(
                folder.path,
                path::join(&parent.path, &folder.name),
                "path of {}",
                folder.name
            );
            assert_eq!(folder.depth, parent.depth + 1, "depth of {}", folder.name);
        }
    }
}

/// Activity recorder that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingRecorder {
    events: Mutex<Vec<DomainEvent>>,
    delay: Option<Duration>,
}

impl RecordingRecorder {
    /// A recorder that takes `delay` per event, like a database insert
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            events: Mutex::default(),
            delay: Some(delay),
        }
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("recorder lock").clone()
    }

    /// Recorded action names, in arrival order
    pub fn actions(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.payload.action()).collect()
    }

    /// Wait until at least `n` events have been recorded
    pub async fn wait_for(&self, n: usize) -> Vec<DomainEvent> {
        for _ in 0..200 {
            let events = self.events();
            if events.len() >= n {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} activity events, got {}", self.events().len());
    }
}

#[async_trait]
impl ActivityRecorder for RecordingRecorder {
    async fn record(&self, event: &DomainEvent) -> AppResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.events
            .lock()
            .expect("recorder lock")
            .push(event.clone());
        Ok(())
    }
}

/// Activity recorder that always fails
#[derive(Debug, Default)]
pub struct FailingRecorder;

#[async_trait]
impl ActivityRecorder for FailingRecorder {
    async fn record(&self, _event: &DomainEvent) -> AppResult<()> {
        Err(AppError::database("activity log unavailable"))
    }
}

/// Store wrapper whose child listings fail for selected folders and whose
/// structural rewrites can be made to lose a sibling-name race
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryFolderStore,
    broken: Mutex<Vec<FolderId>>,
    reject_rewrites: Mutex<bool>,
}

impl FlakyStore {
    /// Wrap `inner`
    pub fn new(inner: MemoryFolderStore) -> Self {
        Self {
            inner,
            broken: Mutex::new(Vec::new()),
            reject_rewrites: Mutex::new(false),
        }
    }

    /// Make `apply_rewrite` fail with `NameTaken`
    pub fn reject_rewrites(&self) {
        *self.reject_rewrites.lock().expect("flaky lock") = true;
    }

    /// Make `list_by_parent` fail for `id`
    pub fn break_listing(&self, id: FolderId) {
        self.broken.lock().expect("flaky lock").push(id);
    }
}

#[async_trait]
impl FolderStore for FlakyStore {
    async fn get_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        self.inner.get_by_id(id).await
    }

    async fn get_root(&self, owner_id: OwnerId) -> AppResult<Option<Folder>> {
        self.inner.get_root(owner_id).await
    }

    async fn get_by_owner_parent_name(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        self.inner
            .get_by_owner_parent_name(owner_id, parent_id, name)
            .await
    }

    async fn list_by_parent(
        &self,
        owner_id: OwnerId,
        parent_id: FolderId,
    ) -> AppResult<Vec<Folder>> {
        if self.broken.lock().expect("flaky lock").contains(&parent_id) {
            return Err(AppError::database("connection reset"));
        }
        self.inner.list_by_parent(owner_id, parent_id).await
    }

    async fn list_descendants(&self, owner_id: OwnerId, path: &str) -> AppResult<Vec<Folder>> {
        self.inner.list_descendants(owner_id, path).await
    }

    async fn list_starred(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>> {
        self.inner.list_starred(owner_id).await
    }

    async fn list_trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Folder>> {
        self.inner.list_trashed(owner_id).await
    }

    async fn search(&self, owner_id: OwnerId, query: &str) -> AppResult<Vec<Folder>> {
        self.inner.search(owner_id, query).await
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        self.inner.create(data).await
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        self.inner.update(folder).await
    }

    async fn update_path(&self, id: FolderId, path: &str, depth: i32) -> AppResult<()> {
        self.inner.update_path(id, path, depth).await
    }

    async fn update_parent(
        &self,
        id: FolderId,
        parent_id: FolderId,
        name: &str,
        path: &str,
        depth: i32,
    ) -> AppResult<()> {
        self.inner
            .update_parent(id, parent_id, name, path, depth)
            .await
    }

    async fn update_trashed(&self, id: FolderId, trashed: bool) -> AppResult<()> {
        self.inner.update_trashed(id, trashed).await
    }

    async fn update_trashed_many(
        &self,
        owner_id: OwnerId,
        ids: &[FolderId],
        trashed: bool,
    ) -> AppResult<u64> {
        self.inner.update_trashed_many(owner_id, ids, trashed).await
    }

    async fn update_starred(&self, id: FolderId, starred: bool) -> AppResult<()> {
        self.inner.update_starred(id, starred).await
    }

    async fn apply_rewrite(&self, rewrite: &SubtreeRewrite) -> AppResult<Folder> {
        if *self.reject_rewrites.lock().expect("flaky lock") {
            return Err(AppError::name_taken(format!(
                "A folder named '{}' already exists here",
                rewrite.name
            )));
        }
        self.inner.apply_rewrite(rewrite).await
    }

    async fn delete_many(&self, owner_id: OwnerId, ids: &[FolderId]) -> AppResult<u64> {
        self.inner.delete_many(owner_id, ids).await
    }
}
