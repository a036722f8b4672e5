// src/models/access_group.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (tabela access_groups)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessGroup {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "Vendas")]
    pub name: String,

    #[schema(example = "Cadastro de clientes e produtos")]
    pub description: Option<String>,

    // Mapa de flags: { "clients:write": true, ... }
    #[schema(value_type = Object, example = json!({"clients:read": true, "clients:write": true}))]
    pub permissions: Json<BTreeMap<String, bool>>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessGroup {
    pub fn allows(&self, slug: &str) -> bool {
        self.permissions.0.get(slug).copied().unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessGroupPayload {
    #[validate(length(min = 2, message = "min_length"))]
    #[schema(example = "Vendas")]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    #[schema(value_type = Object, example = json!({"clients:read": true, "clients:write": true}))]
    pub permissions: BTreeMap<String, bool>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Item do catálogo de permissões exibido na tela de grupos.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PermissionInfo {
    #[schema(value_type = String, example = "clients:write")]
    pub slug: &'static str,
    #[schema(value_type = String, example = "Criar e editar clientes")]
    pub description: &'static str,
    #[schema(value_type = String, example = "CADASTROS")]
    pub module: &'static str,
}

const fn perm(slug: &'static str, description: &'static str, module: &'static str) -> PermissionInfo {
    PermissionInfo { slug, description, module }
}

pub const PERMISSIONS: &[PermissionInfo] = &[
    perm("clients:read", "Visualizar clientes", "CADASTROS"),
    perm("clients:write", "Criar e editar clientes", "CADASTROS"),
    perm("suppliers:read", "Visualizar fornecedores", "CADASTROS"),
    perm("suppliers:write", "Criar e editar fornecedores", "CADASTROS"),
    perm("products:read", "Visualizar produtos", "ESTOQUE"),
    perm("products:write", "Criar e editar produtos", "ESTOQUE"),
    perm("employees:read", "Visualizar funcionários", "RH"),
    perm("employees:write", "Criar e editar funcionários", "RH"),
    perm("carriers:read", "Visualizar transportadoras", "LOGISTICA"),
    perm("carriers:write", "Criar e editar transportadoras", "LOGISTICA"),
    perm("payments:read", "Visualizar pagamentos", "FINANCEIRO"),
    perm("payments:write", "Registrar pagamentos", "FINANCEIRO"),
    perm("access:manage", "Gerenciar grupos de acesso e equipe", "ADMIN"),
];

pub fn is_known_permission(slug: &str) -> bool {
    PERMISSIONS.iter().any(|p| p.slug == slug)
}

/// Todas as flags ligadas: usado no grupo "Administradores" criado com o tenant.
pub fn all_permissions() -> BTreeMap<String, bool> {
    PERMISSIONS.iter().map(|p| (p.slug.to_string(), true)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_unique_slugs() {
        let mut slugs: Vec<_> = PERMISSIONS.iter().map(|p| p.slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), PERMISSIONS.len());
    }

    #[test]
    fn full_group_allows_everything() {
        let all = all_permissions();
        assert!(all.values().all(|v| *v));
        assert!(is_known_permission("payments:write"));
        assert!(!is_known_permission("payments:delete"));
    }
}
