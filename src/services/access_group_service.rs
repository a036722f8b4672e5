// src/services/access_group_service.rs

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::FieldErrors},
    db::AccessGroupRepository,
    models::access_group::{is_known_permission, AccessGroup, AccessGroupPayload},
};

#[derive(Clone)]
pub struct AccessGroupService {
    repo: AccessGroupRepository,
}

/// Derive + chaves do mapa de permissões conferidas contra o catálogo.
pub fn validate_group(payload: &AccessGroupPayload) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check(None, payload);
    for slug in payload.permissions.keys() {
        if !is_known_permission(slug) {
            errors.add(format!("permissions.{}", slug), "unknown_permission");
        }
    }
    errors.into_result()
}

impl AccessGroupService {
    pub fn new(repo: AccessGroupRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<AccessGroup>, AppError> {
        self.repo.list(tenant_id).await
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<AccessGroup, AppError> {
        self.repo.get(tenant_id, id).await
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &AccessGroupPayload) -> Result<AccessGroup, AppError> {
        validate_group(payload)?;
        let group = self
            .repo
            .create(
                self.repo.pool(),
                tenant_id,
                payload.name.trim(),
                payload.description.as_deref(),
                &payload.permissions,
                payload.active,
            )
            .await?;
        tracing::info!("🔐 Grupo de acesso criado: {} ({})", group.name, group.id);
        Ok(group)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, payload: &AccessGroupPayload) -> Result<AccessGroup, AppError> {
        validate_group(payload)?;
        self.repo
            .update(
                tenant_id,
                id,
                payload.name.trim(),
                payload.description.as_deref(),
                &payload.permissions,
                payload.active,
            )
            .await
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(tenant_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn payload(perms: &[(&str, bool)]) -> AccessGroupPayload {
        AccessGroupPayload {
            name: "Vendas".into(),
            description: None,
            permissions: perms.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
            active: true,
        }
    }

    #[test]
    fn known_permissions_pass() {
        assert!(validate_group(&payload(&[("clients:read", true), ("clients:write", false)])).is_ok());
    }

    #[test]
    fn unknown_permission_is_reported_by_key() {
        match validate_group(&payload(&[("clients:read", true), ("clients:nuke", true)])) {
            Err(AppError::FieldValidation(errors)) => {
                assert_eq!(errors.codes("permissions.clients:nuke"), ["unknown_permission".to_string()]);
                assert!(!errors.contains("permissions.clients:read"));
            }
            other => panic!("esperava erro de campo, veio {:?}", other),
        }
    }

    #[test]
    fn short_name_is_rejected() {
        let mut p = payload(&[]);
        p.name = "V".into();
        match validate_group(&p) {
            Err(AppError::FieldValidation(errors)) => assert!(errors.contains("name")),
            other => panic!("esperava erro de campo, veio {:?}", other),
        }
    }
}
