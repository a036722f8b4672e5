// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        // A. Usuário e tenant, postos pelos guards
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| to_api(AppError::InvalidToken))?;
        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .ok_or_else(|| to_api(AppError::MissingTenant))?;

        // B. Administrador global não passa pelos grupos
        if user.0.is_admin {
            return Ok(RequirePermission(PhantomData));
        }

        // C. Verifica no grupo de acesso do vínculo
        let required_perm = T::slug();
        let has_permission = app_state
            .access_group_repo
            .user_has_permission(user.0.id, tenant.0, required_perm)
            .await
            .map_err(to_api)?;

        if !has_permission {
            tracing::warn!("🚫 Usuário {} sem a permissão '{}'", user.0.id, required_perm);
            return Err(to_api(AppError::PermissionDenied(required_perm.to_string())));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $slug:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn slug() -> &'static str {
                $slug
            }
        }
    };
}

permission!(PermClientsRead, "clients:read");
permission!(PermClientsWrite, "clients:write");
permission!(PermSuppliersRead, "suppliers:read");
permission!(PermSuppliersWrite, "suppliers:write");
permission!(PermProductsRead, "products:read");
permission!(PermProductsWrite, "products:write");
permission!(PermEmployeesRead, "employees:read");
permission!(PermEmployeesWrite, "employees:write");
permission!(PermCarriersRead, "carriers:read");
permission!(PermCarriersWrite, "carriers:write");
permission!(PermPaymentsRead, "payments:read");
permission!(PermPaymentsWrite, "payments:write");
permission!(PermAccessManage, "access:manage");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access_group::is_known_permission;

    #[test]
    fn every_guard_slug_is_in_the_catalog() {
        for slug in [
            PermClientsRead::slug(),
            PermClientsWrite::slug(),
            PermSuppliersRead::slug(),
            PermSuppliersWrite::slug(),
            PermProductsRead::slug(),
            PermProductsWrite::slug(),
            PermEmployeesRead::slug(),
            PermEmployeesWrite::slug(),
            PermCarriersRead::slug(),
            PermCarriersWrite::slug(),
            PermPaymentsRead::slug(),
            PermPaymentsWrite::slug(),
            PermAccessManage::slug(),
        ] {
            assert!(is_known_permission(slug), "{} fora do catálogo", slug);
        }
    }
}
