// src/db/access_group_repo.rs

use std::collections::BTreeMap;

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::access_group::AccessGroup;

#[derive(Clone)]
pub struct AccessGroupRepository {
    pool: PgPool,
}

fn map_name_conflict(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(name.to_string());
        }
    }
    e.into()
}

impl AccessGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
        permissions: &BTreeMap<String, bool>,
        active: bool,
    ) -> Result<AccessGroup, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AccessGroup>(
            r#"
            INSERT INTO access_groups (tenant_id, name, description, permissions, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(Json(permissions))
        .bind(active)
        .fetch_one(executor)
        .await
        .map_err(|e| map_name_conflict(e, name))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        permissions: &BTreeMap<String, bool>,
        active: bool,
    ) -> Result<AccessGroup, AppError> {
        sqlx::query_as::<_, AccessGroup>(
            r#"
            UPDATE access_groups
               SET name = $3, description = $4, permissions = $5, active = $6, updated_at = NOW()
             WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(Json(permissions))
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_name_conflict(e, name))?
        .ok_or(AppError::NotFound("grupo de acesso"))
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<AccessGroup>, AppError> {
        let groups = sqlx::query_as::<_, AccessGroup>(
            "SELECT * FROM access_groups WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<AccessGroup, AppError> {
        sqlx::query_as::<_, AccessGroup>("SELECT * FROM access_groups WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("grupo de acesso"))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM access_groups WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("grupo de acesso"));
        }
        Ok(())
    }

    /// A flag vem do grupo vinculado à associação ativa do usuário no tenant.
    pub async fn user_has_permission(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        slug: &str,
    ) -> Result<bool, AppError> {
        let allowed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM tenant_members m
                JOIN access_groups g ON g.id = m.access_group_id
                WHERE m.user_id = $1
                  AND m.tenant_id = $2
                  AND m.is_active
                  AND g.active
                  AND COALESCE((g.permissions ->> $3)::boolean, FALSE)
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(allowed)
    }
}
