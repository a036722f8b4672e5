// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::tenancy::{MemberView, Tenant, TenantMember};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifica se o usuário é membro ativo do tenant.
    /// Esta é a verificação de autorização mais importante.
    pub async fn check_user_tenancy(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenant_members
                WHERE user_id = $1 AND tenant_id = $2 AND is_active
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<TenantMember>, AppError> {
        let member = sqlx::query_as::<_, TenantMember>(
            "SELECT * FROM tenant_members WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    /// Vincula (ou reativa) um usuário no tenant com o grupo de acesso dado.
    pub async fn upsert_member<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        access_group_id: Option<Uuid>,
    ) -> Result<TenantMember, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let member = sqlx::query_as::<_, TenantMember>(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id, access_group_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, user_id)
            DO UPDATE SET access_group_id = EXCLUDED.access_group_id, is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(access_group_id)
        .fetch_one(executor)
        .await?;
        Ok(member)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.*
            FROM tenants t
            JOIN tenant_members m ON m.tenant_id = t.id
            WHERE m.user_id = $1 AND m.is_active
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<MemberView>, AppError> {
        let members = sqlx::query_as::<_, MemberView>(
            r#"
            SELECT m.user_id, u.name, u.email, m.access_group_id,
                   g.name AS access_group_name, m.is_active
            FROM tenant_members m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN access_groups g ON g.id = m.access_group_id
            WHERE m.tenant_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}
