use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{Role, RoleContext, Roles, ViewerContext},
    error::{AppError, Result},
    repository::UserDirectory,
};

#[derive(FromRow)]
struct UserRow {
    id: i64,
    user_name: String,
    join_date: Option<NaiveDate>,
}

#[derive(FromRow)]
struct AssignmentRow {
    module_id: i64,
    role_context: String,
}

/// Read access to the identity tables, plus the handful of writes the seed
/// tool and tests need to set users up.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, user_name: &str, join_date: Option<NaiveDate>) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (user_name, join_date) VALUES (?, ?)")
            .bind(user_name)
            .bind(join_date)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    pub async fn add_role(&self, user_id: i64, role: Role) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn assign_module(&self, user_id: i64, module_id: i64, role_context: RoleContext) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_modules (user_id, module_id, role_context)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, module_id) DO UPDATE SET role_context = excluded.role_context
            "#
        )
        .bind(user_id)
        .bind(module_id)
        .bind(role_context.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserRepository {
    async fn find_viewer(&self, user_name: &str) -> Result<Option<ViewerContext>> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, user_name, join_date FROM users WHERE user_name = ?"
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let role_names = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user.id)
            .fetch_all(&self.pool)
            .await?;

        let roles: Roles = role_names
            .iter()
            .filter_map(|name| {
                let role = Role::parse(name);
                if role.is_none() {
                    tracing::warn!("Ignoring unknown role '{}' for user {}", name, user.id);
                }
                role
            })
            .collect();

        let assignments = sqlx::query_as::<_, AssignmentRow>(
            "SELECT module_id, role_context FROM user_modules WHERE user_id = ?"
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        let mut viewer = ViewerContext::new(user.id, user.user_name, roles);
        viewer.join_date = user.join_date;

        for assignment in assignments {
            viewer = match RoleContext::parse(&assignment.role_context) {
                Some(RoleContext::Lecturer) => viewer.with_lecturing_module(assignment.module_id),
                _ => viewer.with_module(assignment.module_id),
            };
        }

        Ok(Some(viewer))
    }
}
