// src/services/tenancy_service.rs

use crate::{
    common::error::AppError,
    db::{AccessGroupRepository, TenantRepository, UserRepository},
    models::{
        access_group::all_permissions,
        tenancy::{MemberView, Tenant, TenantMember},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

pub const OWNER_GROUP_NAME: &str = "Administradores";

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    group_repo: AccessGroupRepository,
    user_repo: UserRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        group_repo: AccessGroupRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { tenant_repo, group_repo, user_repo, pool }
    }

    /// Cria o tenant, o grupo "Administradores" com todas as permissões
    /// e vincula o criador a ele. Tudo numa transação só.
    pub async fn create_tenant_with_owner(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let tenant = self.tenant_repo.create_tenant(&mut *tx, name.trim(), description).await?;

        let owner_group = self
            .group_repo
            .create(
                &mut *tx,
                tenant.id,
                OWNER_GROUP_NAME,
                Some("Acesso total (gerado automaticamente)"),
                &all_permissions(),
                true,
            )
            .await?;

        self.tenant_repo
            .upsert_member(&mut *tx, tenant.id, owner_id, Some(owner_group.id))
            .await?;

        tx.commit().await?;

        tracing::info!("🏢 Tenant criado: {} ({}) por {}", tenant.name, tenant.id, owner_id);
        Ok(tenant)
    }

    /// Vincula um usuário já cadastrado, pelo e-mail. O grupo precisa ser deste tenant.
    pub async fn add_member(
        &self,
        tenant_id: Uuid,
        email: &str,
        access_group_id: Option<Uuid>,
    ) -> Result<TenantMember, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::UserNotFound)?;

        if let Some(group_id) = access_group_id {
            self.group_repo.get(tenant_id, group_id).await?;
        }

        let member = self
            .tenant_repo
            .upsert_member(&self.pool, tenant_id, user.id, access_group_id)
            .await?;

        tracing::info!("👥 Usuário {} vinculado ao tenant {}", user.id, tenant_id);
        Ok(member)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_user_tenants(user_id).await
    }

    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<MemberView>, AppError> {
        self.tenant_repo.list_members(tenant_id).await
    }
}
