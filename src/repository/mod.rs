use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::*;
use crate::error::Result;

pub mod feed_item_repository;
pub mod read_receipt_repository;
pub mod user_repository;
pub mod module_repository;

#[cfg(test)]
pub mod memory;

pub use feed_item_repository::SqliteFeedItemRepository;
pub use read_receipt_repository::SqliteReadReceiptRepository;
pub use user_repository::SqliteUserRepository;
pub use module_repository::SqliteModuleRepository;

#[async_trait]
pub trait FeedItemRepository: Send + Sync {
    async fn create(&self, item: NewFeedItem) -> Result<FeedItem>;
    async fn find_by_id(&self, id: i64) -> Result<Option<FeedItem>>;
    async fn exists(&self, id: i64) -> Result<bool>;
    /// Items `viewer` may see, newest first (ties broken by id, highest
    /// first), windowed by `limit`/`offset`, together with the total number
    /// of matching items before windowing.
    async fn find_visible(
        &self,
        viewer: &ViewerContext,
        type_class: Option<TypeClass>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<FeedItem>, i64)>;
    /// Returns false when there was nothing to delete.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait ReadReceiptRepository: Send + Sync {
    /// Returns true if a new receipt was written, false if one already existed.
    async fn mark(&self, item_id: i64, user_id: i64, read_at: DateTime<Utc>) -> Result<bool>;
    /// Returns true if a receipt was removed.
    async fn unmark(&self, item_id: i64, user_id: i64) -> Result<bool>;
    async fn is_read(&self, item_id: i64, user_id: i64) -> Result<bool>;
    /// The subset of `item_ids` that `user_id` has read.
    async fn read_item_ids(&self, user_id: i64, item_ids: &[i64]) -> Result<HashSet<i64>>;
}

/// Identity and role lookups. Owned by the identity system.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_viewer(&self, user_name: &str) -> Result<Option<ViewerContext>>;
}

#[async_trait]
pub trait ModuleDirectory: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Module>>;
}
