//! In-process store used by service unit tests. Filters with
//! `domain::is_visible` directly, so it doubles as the reference behaviour
//! for the SQL-backed repositories.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    domain::{is_visible, FeedItem, Module, NewFeedItem, TypeClass, ViewerContext},
    error::Result,
    repository::{FeedItemRepository, ModuleDirectory, ReadReceiptRepository, UserDirectory},
};

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<i64, FeedItem>>,
    receipts: RwLock<HashMap<(i64, i64), DateTime<Utc>>>,
    viewers: RwLock<HashMap<String, ViewerContext>>,
    modules: RwLock<HashMap<i64, Module>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_viewer(&self, viewer: ViewerContext) {
        self.viewers.write().await.insert(viewer.user_name.clone(), viewer);
    }

    pub async fn add_module(&self, module: Module) {
        self.modules.write().await.insert(module.id, module);
    }

    pub async fn insert_item(&self, item: FeedItem) {
        self.items.write().await.insert(item.id, item);
    }

    pub async fn receipt_count(&self) -> usize {
        self.receipts.read().await.len()
    }
}

#[async_trait]
impl FeedItemRepository for MemoryStore {
    async fn create(&self, item: NewFeedItem) -> Result<FeedItem> {
        let mut items = self.items.write().await;
        let id = items.keys().next_back().copied().unwrap_or(0) + 1;
        let stored = FeedItem {
            id,
            kind: item.kind,
            audience: item.audience,
            title: item.title,
            message: item.message,
            image_path: item.image_path,
            created_by: item.created_by,
            created_at: item.created_at,
            module_id: item.module_id,
        };
        items.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.items.read().await.contains_key(&id))
    }

    async fn find_visible(
        &self,
        viewer: &ViewerContext,
        type_class: Option<TypeClass>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<FeedItem>, i64)> {
        let items = self.items.read().await;
        let mut visible: Vec<FeedItem> = items
            .values()
            .filter(|item| is_visible(item, viewer))
            .filter(|item| type_class.map_or(true, |class| class.includes(item.kind)))
            .cloned()
            .collect();

        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = visible.len() as i64;

        let window = visible
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((window, total))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.items.write().await.remove(&id).is_some();
        if removed {
            self.receipts.write().await.retain(|(item_id, _), _| *item_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl ReadReceiptRepository for MemoryStore {
    async fn mark(&self, item_id: i64, user_id: i64, read_at: DateTime<Utc>) -> Result<bool> {
        let mut receipts = self.receipts.write().await;
        if receipts.contains_key(&(item_id, user_id)) {
            return Ok(false);
        }
        receipts.insert((item_id, user_id), read_at);
        Ok(true)
    }

    async fn unmark(&self, item_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.receipts.write().await.remove(&(item_id, user_id)).is_some())
    }

    async fn is_read(&self, item_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.receipts.read().await.contains_key(&(item_id, user_id)))
    }

    async fn read_item_ids(&self, user_id: i64, item_ids: &[i64]) -> Result<HashSet<i64>> {
        let receipts = self.receipts.read().await;
        Ok(item_ids
            .iter()
            .copied()
            .filter(|item_id| receipts.contains_key(&(*item_id, user_id)))
            .collect())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_viewer(&self, user_name: &str) -> Result<Option<ViewerContext>> {
        Ok(self.viewers.read().await.get(user_name).cloned())
    }
}

#[async_trait]
impl ModuleDirectory for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Module>> {
        Ok(self.modules.read().await.get(&id).cloned())
    }
}
