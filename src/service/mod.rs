pub mod feed_query_service;
pub mod feed_creation_service;
pub mod read_receipt_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::AuthService;
use crate::config::FeedConfig;
use crate::repository::*;
use crate::uploads::AttachmentUploader;

pub use feed_query_service::FeedQueryService;
pub use feed_creation_service::FeedCreationService;
pub use read_receipt_service::ReadReceiptService;

pub struct ServiceContext {
    pub feed_query_service: Arc<FeedQueryService>,
    pub feed_creation_service: Arc<FeedCreationService>,
    pub read_receipt_service: Arc<ReadReceiptService>,
    pub auth_service: Arc<AuthService>,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        uploader: Arc<dyn AttachmentUploader>,
        feed_config: &FeedConfig,
    ) -> Self {
        // Create repositories
        let feed_item_repo: Arc<dyn FeedItemRepository> =
            Arc::new(SqliteFeedItemRepository::new(db_pool.clone()));
        let read_receipt_repo: Arc<dyn ReadReceiptRepository> =
            Arc::new(SqliteReadReceiptRepository::new(db_pool.clone()));
        let user_directory: Arc<dyn UserDirectory> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let module_directory: Arc<dyn ModuleDirectory> =
            Arc::new(SqliteModuleRepository::new(db_pool.clone()));

        // Create services
        let feed_query_service = Arc::new(FeedQueryService::new(
            feed_item_repo.clone(),
            read_receipt_repo.clone(),
            user_directory.clone(),
            feed_config,
        ));
        let feed_creation_service = Arc::new(FeedCreationService::new(
            feed_item_repo.clone(),
            user_directory,
            module_directory,
            uploader,
        ));
        let read_receipt_service = Arc::new(ReadReceiptService::new(
            feed_item_repo,
            read_receipt_repo,
        ));
        let auth_service = Arc::new(AuthService::new(db_pool));

        Self {
            feed_query_service,
            feed_creation_service,
            read_receipt_service,
            auth_service,
        }
    }
}
