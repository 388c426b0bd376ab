use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::Module,
    error::{AppError, Result},
    repository::ModuleDirectory,
};

#[derive(FromRow)]
struct ModuleRow {
    id: i64,
    code: String,
    name: String,
}

pub struct SqliteModuleRepository {
    pool: SqlitePool,
}

impl SqliteModuleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, code: &str, name: &str) -> Result<Module> {
        let result = sqlx::query("INSERT INTO modules (code, name) VALUES (?, ?)")
            .bind(code)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Module {
            id: result.last_insert_rowid(),
            code: code.to_string(),
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl ModuleDirectory for SqliteModuleRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Module>> {
        let row = sqlx::query_as::<_, ModuleRow>("SELECT id, code, name FROM modules WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Module {
            id: r.id,
            code: r.code,
            name: r.name,
        }))
    }
}
