// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{AccessGroupRepository, TenantRepository, UserRepository},
    models::party::PartyKind,
    services::{
        access_group_service::AccessGroupService,
        address_lookup::AddressLookup,
        auth::AuthService,
        export_service::ExportService,
        party_service::PartyService,
        payment_gateway::HttpPaymentGateway,
        payment_intake::PaymentService,
        registry_service::{CarrierService, EmployeeService, ProductService},
        tenancy_service::TenantService,
    },
};

/// Configuração lida do ambiente (e do `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub token_ttl_days: i64,
    pub reset_token_ttl_minutes: i64,
    // Só em desenvolvimento: devolve o token de redefinição na resposta (não há envio de e-mail)
    pub expose_reset_token: bool,
    pub payment_gateway_url: String,
    pub payment_gateway_token: String,
    pub viacep_url: String,
    pub fonts_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| get(key).filter(|v| !v.is_empty()).with_context(|| format!("{} deve ser definida", key));
        let or = |key: &str, default: &str| get(key).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string());

        let payment_gateway_token = or("PAYMENT_GATEWAY_TOKEN", "");
        if payment_gateway_token.is_empty() {
            tracing::warn!("⚠️ PAYMENT_GATEWAY_TOKEN vazio: o gateway vai recusar as cobranças");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_addr: or("SERVER_ADDR", "0.0.0.0:8000"),
            db_max_connections: or("DB_MAX_CONNECTIONS", "5").parse().context("DB_MAX_CONNECTIONS inválido")?,
            db_acquire_timeout_secs: or("DB_ACQUIRE_TIMEOUT_SECS", "3")
                .parse()
                .context("DB_ACQUIRE_TIMEOUT_SECS inválido")?,
            token_ttl_days: or("TOKEN_TTL_DAYS", "7").parse().context("TOKEN_TTL_DAYS inválido")?,
            reset_token_ttl_minutes: or("RESET_TOKEN_TTL_MINUTES", "30")
                .parse()
                .context("RESET_TOKEN_TTL_MINUTES inválido")?,
            expose_reset_token: matches!(or("EXPOSE_RESET_TOKEN", "false").as_str(), "1" | "true"),
            payment_gateway_url: or("PAYMENT_GATEWAY_URL", "https://api.mercadopago.com"),
            payment_gateway_token,
            viacep_url: or("VIACEP_URL", "https://viacep.com.br"),
            fonts_dir: or("FONTS_DIR", "./fonts"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub tenant_repo: TenantRepository,
    pub access_group_repo: AccessGroupRepository,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub access_group_service: AccessGroupService,
    pub client_service: PartyService,
    pub supplier_service: PartyService,
    pub employee_service: EmployeeService,
    pub carrier_service: CarrierService,
    pub product_service: ProductService,
    pub payment_service: PaymentService,
    pub export_service: ExportService,
    pub address_lookup: AddressLookup,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::build(db_pool, config))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada.
    pub fn build(db_pool: PgPool, config: Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let access_group_repo = AccessGroupRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_days,
            config.reset_token_ttl_minutes,
            db_pool.clone(),
        );
        let tenant_service = TenantService::new(
            tenant_repo.clone(),
            access_group_repo.clone(),
            user_repo,
            db_pool.clone(),
        );
        let gateway = HttpPaymentGateway::new(&config.payment_gateway_url, &config.payment_gateway_token);

        Self {
            access_group_service: AccessGroupService::new(access_group_repo.clone()),
            client_service: PartyService::new(PartyKind::Client),
            supplier_service: PartyService::new(PartyKind::Supplier),
            employee_service: EmployeeService::new(),
            carrier_service: CarrierService::new(),
            product_service: ProductService::new(),
            payment_service: PaymentService::new(Arc::new(gateway)),
            export_service: ExportService::new(&config.fonts_dir),
            address_lookup: AddressLookup::new(&config.viacep_url),
            i18n_store: Arc::new(I18nStore::embedded()),
            config: Arc::new(config),
            db_pool,
            tenant_repo,
            access_group_repo,
            auth_service,
            tenant_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8000");
        assert_eq!(config.token_ttl_days, 7);
        assert_eq!(config.db_max_connections, 5);
        assert!(!config.expose_reset_token);
        assert_eq!(config.fonts_dir, "./fonts");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn bad_number_is_an_error() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("TOKEN_TTL_DAYS", "sete"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("EXPOSE_RESET_TOKEN", "true"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:9000");
        assert!(config.expose_reset_token);
    }
}
