use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, Result},
    repository::{FeedItemRepository, ReadReceiptRepository},
};

/// Idempotent read/unread tracking. Asking for the state a user is already
/// in succeeds without touching anything.
pub struct ReadReceiptService {
    items: Arc<dyn FeedItemRepository>,
    receipts: Arc<dyn ReadReceiptRepository>,
}

impl ReadReceiptService {
    pub fn new(items: Arc<dyn FeedItemRepository>, receipts: Arc<dyn ReadReceiptRepository>) -> Self {
        Self { items, receipts }
    }

    pub async fn mark_read(&self, item_id: i64, user_id: i64) -> Result<()> {
        self.ensure_item_exists(item_id).await?;

        if self.receipts.mark(item_id, user_id, Utc::now()).await? {
            tracing::debug!("User {} read feed item {}", user_id, item_id);
        }

        Ok(())
    }

    pub async fn mark_unread(&self, item_id: i64, user_id: i64) -> Result<()> {
        self.ensure_item_exists(item_id).await?;

        if self.receipts.unmark(item_id, user_id).await? {
            tracing::debug!("User {} marked feed item {} unread", user_id, item_id);
        }

        Ok(())
    }

    pub async fn is_read(&self, item_id: i64, user_id: i64) -> Result<bool> {
        self.receipts.is_read(item_id, user_id).await
    }

    async fn ensure_item_exists(&self, item_id: i64) -> Result<()> {
        if self.items.exists(item_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Feed item not found".to_string()))
        }
    }
}
