// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, RegisterUserPayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_days: i64,
    reset_ttl_minutes: i64,
    pool: PgPool,
}

/// Gera o token de redefinição (enviado ao usuário) e o hash (guardado no banco).
pub fn new_reset_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let token_hash = hash_reset_token(&token);
    (token, token_hash)
}

pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        jwt_secret: String,
        token_ttl_days: i64,
        reset_ttl_minutes: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, jwt_secret, token_ttl_days, reset_ttl_minutes, pool }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        // Hash fora da transação: não toca no banco
        let hashed_password = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                payload.name.trim(),
                payload.email.trim(),
                &hashed_password,
                payload.phone.as_deref(),
            )
            .await?;

        tracing::info!("👤 Usuário registrado: {}", user.id);

        let token = self.create_token(user.id)?;
        Ok(AuthResponse { token, is_admin: user.is_admin, user })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid || !user.active {
            return Err(AppError::InvalidCredentials);
        }

        self.user_repo.touch_last_login(user.id).await?;

        let token = self.create_token(user.id)?;
        Ok(AuthResponse { token, is_admin: user.is_admin, user })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.active {
            return Err(AppError::InvalidToken);
        }
        Ok(user)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        encode_token(user_id, &self.jwt_secret, self.token_ttl_days)
    }

    /// Devolve o token em claro quando o e-mail existe; o chamador decide como entregá-lo.
    /// E-mail desconhecido não é erro, para não revelar quem tem conta.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AppError> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            tracing::info!("Pedido de redefinição para e-mail sem conta");
            return Ok(None);
        };

        let (token, token_hash) = new_reset_token();
        let expires_at = Utc::now() + Duration::minutes(self.reset_ttl_minutes);
        self.user_repo.create_reset_token(user.id, &token_hash, expires_at).await?;

        tracing::info!("🔑 Token de redefinição emitido para o usuário {}", user.id);
        Ok(Some(token))
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let hashed_password = hash_password(new_password).await?;

        let mut tx = self.pool.begin().await?;
        let user_id = self
            .user_repo
            .consume_reset_token(&mut *tx, &hash_reset_token(token))
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        self.user_repo.update_password(&mut *tx, user_id, &hashed_password).await?;
        tx.commit().await?;

        tracing::info!("🔑 Senha redefinida para o usuário {}", user_id);
        Ok(())
    }
}

pub fn encode_token(user_id: Uuid, secret: &str, ttl_days: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::days(ttl_days);

    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?)
}

/// Token ausente, adulterado ou expirado viram InvalidToken (401).
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = encode_token(user_id, "segredo", 7).unwrap();
        let claims = decode_token(&token, "segredo").unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_token(Uuid::new_v4(), "segredo", 7).unwrap();
        assert!(matches!(decode_token(&token, "outro"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token(Uuid::new_v4(), "segredo", -1).unwrap();
        assert!(matches!(decode_token(&token, "segredo"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn reset_token_hash_matches() {
        let (token, stored) = new_reset_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_reset_token(&token), stored);
        assert_ne!(hash_reset_token("outro"), stored);
    }
}
