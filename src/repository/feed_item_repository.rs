use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    domain::{Audience, FeedItem, FeedKind, NewFeedItem, TypeClass, ViewerContext},
    error::{AppError, Result},
    repository::FeedItemRepository,
};

const SELECT_COLUMNS: &str =
    "id, kind, audience, title, message, image_path, created_by, created_at, module_id";

#[derive(FromRow)]
struct FeedItemRow {
    id: i64,
    kind: String,
    audience: String,
    title: String,
    message: String,
    image_path: Option<String>,
    created_by: String,
    created_at: NaiveDateTime,
    module_id: Option<i64>,
}

pub struct SqliteFeedItemRepository {
    pool: SqlitePool,
}

impl SqliteFeedItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: FeedItemRow) -> Result<FeedItem> {
        Ok(FeedItem {
            id: row.id,
            kind: FeedKind::parse(&row.kind)
                .ok_or_else(|| AppError::Database(format!("Invalid feed kind: {}", row.kind)))?,
            audience: Audience::parse(&row.audience)
                .ok_or_else(|| AppError::Database(format!("Invalid audience: {}", row.audience)))?,
            title: row.title,
            message: row.message,
            image_path: row.image_path,
            created_by: row.created_by,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            module_id: row.module_id,
        })
    }

    /// Appends the visibility predicate (and optional type-class filter) as a
    /// WHERE clause body. Mirrors `domain::is_visible` term for term.
    fn push_visibility_filter(
        query: &mut QueryBuilder<'_, Sqlite>,
        viewer: &ViewerContext,
        type_class: Option<TypeClass>,
    ) {
        query.push("(created_by = ");
        query.push_bind(viewer.user_name.clone());
        query.push(" OR (");

        if let Some(from) = viewer.visible_from() {
            query.push("created_at >= ");
            query.push_bind(from.naive_utc());
            query.push(" AND ");
        }

        query.push("(module_id IS NULL OR ");
        Self::push_module_membership(query, &viewer.registered_module_ids);
        query.push(") AND (audience = ");
        query.push_bind(Audience::All.as_str());

        if viewer.is_student() {
            query.push(" OR audience = ");
            query.push_bind(Audience::Students.as_str());
        }
        if viewer.is_staff() {
            query.push(" OR audience = ");
            query.push_bind(Audience::Staff.as_str());
        }
        if viewer.is_student() {
            query.push(" OR (audience = ");
            query.push_bind(Audience::ModuleStudents.as_str());
            query.push(" AND module_id IS NOT NULL AND ");
            Self::push_module_membership(query, &viewer.registered_module_ids);
            query.push(")");
        }

        query.push(")))");

        if let Some(class) = type_class {
            query.push(match class {
                TypeClass::Announcement => " AND kind IN (",
                TypeClass::Notification => " AND kind NOT IN (",
            });
            let mut kinds = query.separated(", ");
            for kind in FeedKind::ANNOUNCEMENT_KINDS {
                kinds.push_bind(kind.as_str());
            }
            kinds.push_unseparated(")");
        }
    }

    fn push_module_membership(query: &mut QueryBuilder<'_, Sqlite>, module_ids: &BTreeSet<i64>) {
        if module_ids.is_empty() {
            query.push("0");
            return;
        }

        query.push("module_id IN (");
        let mut ids = query.separated(", ");
        for id in module_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
}

#[async_trait]
impl FeedItemRepository for SqliteFeedItemRepository {
    async fn create(&self, item: NewFeedItem) -> Result<FeedItem> {
        let result = sqlx::query(
            r#"
            INSERT INTO feed_items (
                kind, audience, title, message, image_path,
                created_by, created_at, module_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(item.kind.as_str())
        .bind(item.audience.as_str())
        .bind(&item.title)
        .bind(&item.message)
        .bind(&item.image_path)
        .bind(&item.created_by)
        .bind(item.created_at.naive_utc())
        .bind(item.module_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(result.last_insert_rowid()).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created feed item".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedItem>> {
        let row = sqlx::query_as::<_, FeedItemRow>(&format!(
            "SELECT {} FROM feed_items WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_item).transpose()
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM feed_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn find_visible(
        &self,
        viewer: &ViewerContext,
        type_class: Option<TypeClass>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<FeedItem>, i64)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM feed_items WHERE ");
        Self::push_visibility_filter(&mut count_query, viewer, type_class);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        if total == 0 || offset >= total {
            return Ok((Vec::new(), total));
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM feed_items WHERE ",
            SELECT_COLUMNS
        ));
        Self::push_visibility_filter(&mut query, viewer, type_class);
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build_query_as::<FeedItemRow>()
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
