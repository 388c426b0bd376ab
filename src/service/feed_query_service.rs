use std::sync::Arc;

use crate::{
    config::FeedConfig,
    domain::{FeedItemView, Page, PageRequest, TypeClass},
    error::Result,
    repository::{FeedItemRepository, ReadReceiptRepository, UserDirectory},
};

/// Builds a viewer's page of the feed.
pub struct FeedQueryService {
    items: Arc<dyn FeedItemRepository>,
    receipts: Arc<dyn ReadReceiptRepository>,
    users: Arc<dyn UserDirectory>,
    default_page_size: i64,
    max_page_size: i64,
}

impl FeedQueryService {
    pub fn new(
        items: Arc<dyn FeedItemRepository>,
        receipts: Arc<dyn ReadReceiptRepository>,
        users: Arc<dyn UserDirectory>,
        config: &FeedConfig,
    ) -> Self {
        Self {
            items,
            receipts,
            users,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Clamp raw query parameters into a page request.
    pub fn page_request(&self, page_number: Option<i64>, page_size: Option<i64>) -> PageRequest {
        PageRequest::new(
            page_number.unwrap_or(1),
            page_size.unwrap_or(self.default_page_size),
            self.max_page_size,
        )
    }

    /// An unknown viewer gets an empty page rather than an error.
    pub async fn get_page(
        &self,
        viewer_name: &str,
        type_class: Option<TypeClass>,
        request: PageRequest,
    ) -> Result<Page<FeedItemView>> {
        let Some(viewer) = self.users.find_viewer(viewer_name).await? else {
            tracing::debug!("Feed requested for unknown user '{}'", viewer_name);
            return Ok(Page::empty(request));
        };

        let (items, total_count) = self
            .items
            .find_visible(&viewer, type_class, request.limit(), request.offset())
            .await?;

        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        let read = self.receipts.read_item_ids(viewer.user_id, &ids).await?;

        let views = items
            .into_iter()
            .map(|item| {
                let is_read = read.contains(&item.id);
                FeedItemView::from_item(item, is_read)
            })
            .collect();

        Ok(Page::new(views, request, total_count))
    }
}
