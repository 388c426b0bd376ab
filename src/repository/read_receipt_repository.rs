use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::Result,
    repository::ReadReceiptRepository,
};

pub struct SqliteReadReceiptRepository {
    pool: SqlitePool,
}

impl SqliteReadReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadReceiptRepository for SqliteReadReceiptRepository {
    async fn mark(&self, item_id: i64, user_id: i64, read_at: DateTime<Utc>) -> Result<bool> {
        // The (item_id, user_id) primary key absorbs concurrent duplicates.
        let result = sqlx::query(
            r#"
            INSERT INTO feed_item_reads (item_id, user_id, read_at)
            VALUES (?, ?, ?)
            ON CONFLICT (item_id, user_id) DO NOTHING
            "#
        )
        .bind(item_id)
        .bind(user_id)
        .bind(read_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unmark(&self, item_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_item_reads WHERE item_id = ? AND user_id = ?")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_read(&self, item_id: i64, user_id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM feed_item_reads WHERE item_id = ? AND user_id = ?"
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn read_item_ids(&self, user_id: i64, item_ids: &[i64]) -> Result<HashSet<i64>> {
        if item_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT item_id FROM feed_item_reads WHERE user_id = ");
        query.push_bind(user_id);
        query.push(" AND item_id IN (");
        let mut ids = query.separated(", ");
        for id in item_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let read: Vec<i64> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        Ok(read.into_iter().collect())
    }
}
