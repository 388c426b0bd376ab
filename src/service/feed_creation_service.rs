use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    domain::{
        resolve_audience, tag_with_module_code, AudienceRequest, CreateFeedItemRequest,
        FeedItemView, FeedKind, NewFeedItem, ViewerContext,
    },
    error::{AppError, Result},
    repository::{FeedItemRepository, ModuleDirectory, UserDirectory},
    uploads::AttachmentUploader,
};

#[derive(Debug, Validate)]
struct FeedContent<'a> {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    title: &'a str,
    #[validate(length(min = 5, message = "Message must be at least 5 characters"))]
    message: &'a str,
}

/// Validates, authorizes and stores new feed items; also owns deletion.
pub struct FeedCreationService {
    items: Arc<dyn FeedItemRepository>,
    users: Arc<dyn UserDirectory>,
    modules: Arc<dyn ModuleDirectory>,
    uploader: Arc<dyn AttachmentUploader>,
}

impl FeedCreationService {
    pub fn new(
        items: Arc<dyn FeedItemRepository>,
        users: Arc<dyn UserDirectory>,
        modules: Arc<dyn ModuleDirectory>,
        uploader: Arc<dyn AttachmentUploader>,
    ) -> Self {
        Self {
            items,
            users,
            modules,
            uploader,
        }
    }

    pub async fn create(&self, request: CreateFeedItemRequest, creator_name: &str) -> Result<FeedItemView> {
        let creator = self.resolve_user(creator_name).await?;

        if !creator.roles.can_post() {
            tracing::warn!("User '{}' without a staff role tried to post", creator_name);
            return Err(AppError::Forbidden(
                "Only lecturers, coordinators and admins can post".to_string(),
            ));
        }

        let resolution = resolve_audience(
            &creator,
            AudienceRequest {
                kind: &request.kind,
                audience: request.audience.as_deref(),
                module_id: request.module_id,
            },
        )
        .map_err(|e| {
            tracing::warn!("Rejected post by '{}': {}", creator_name, e);
            AppError::from(e)
        })?;

        let module = match resolution.module_id {
            Some(module_id) => Some(
                self.modules
                    .find_by_id(module_id)
                    .await?
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown moduleId: {}", module_id)))?,
            ),
            None => None,
        };

        let mut title = request.title.trim().to_string();
        let mut message = request.message.clone();
        FeedContent {
            title: &title,
            message: message.trim(),
        }
        .validate()?;

        if let (FeedKind::DocumentUpload, Some(module)) = (resolution.kind, &module) {
            (title, message) = tag_with_module_code(&title, &message, &module.code);
        }

        let image_path = match &request.attachment {
            Some(attachment) => Some(
                self.uploader
                    .upload(&attachment.file_name, &attachment.data)
                    .await?,
            ),
            None => None,
        };

        let stored = self
            .items
            .create(NewFeedItem {
                kind: resolution.kind,
                audience: resolution.audience,
                title,
                message,
                image_path: image_path.clone(),
                created_by: creator.user_name.clone(),
                created_at: Utc::now(),
                module_id: resolution.module_id,
            })
            .await;

        let item = match stored {
            Ok(item) => item,
            Err(e) => {
                if let Some(path) = image_path {
                    if let Err(cleanup) = self.uploader.remove(&path).await {
                        tracing::warn!("Failed to remove orphaned attachment {}: {}", path, cleanup);
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Feed item {} created by '{}' (kind: {}, audience: {}, module: {:?})",
            item.id,
            item.created_by,
            item.kind.as_str(),
            item.audience.as_str(),
            item.module_id
        );

        Ok(FeedItemView::from_item(item, false))
    }

    /// Authors may delete their own items; admins and coordinators may delete
    /// any item.
    pub async fn delete(&self, item_id: i64, requester_name: &str) -> Result<()> {
        let requester = self.resolve_user(requester_name).await?;

        let item = self
            .items
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Feed item not found".to_string()))?;

        if item.created_by != requester.user_name && !requester.roles.has_elevated_rights() {
            tracing::warn!("User '{}' may not delete feed item {}", requester_name, item_id);
            return Err(AppError::Forbidden(
                "You are not authorized to delete this item".to_string(),
            ));
        }

        if !self.items.delete(item_id).await? {
            return Err(AppError::NotFound("Feed item not found".to_string()));
        }

        if let Some(path) = item.image_path {
            if let Err(e) = self.uploader.remove(&path).await {
                tracing::warn!("Failed to remove attachment {} of feed item {}: {}", path, item_id, e);
            }
        }

        tracing::info!("Feed item {} deleted by '{}'", item_id, requester_name);
        Ok(())
    }

    async fn resolve_user(&self, user_name: &str) -> Result<ViewerContext> {
        self.users
            .find_viewer(user_name)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}
