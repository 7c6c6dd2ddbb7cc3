use anyhow::{bail, Context, Result};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::{AuthConfig, AuthMode};
use crate::error::AppError;

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

struct AdminGate {
    username: String,
    password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
}

/// Guards the content-management endpoints.
///
/// In `password` mode the admin trades credentials for a signed session
/// token; in `none` mode every request is let through.
pub struct AuthService {
    gate: Option<AdminGate>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Result<Self> {
        let gate = match config.mode {
            AuthMode::None => None,
            AuthMode::Password => {
                let admin = config
                    .admin
                    .context("admin credentials are required when AUTH_MODE=password")?;
                if admin.password.is_empty() || admin.jwt_secret.is_empty() {
                    bail!("admin password and JWT secret must not be empty");
                }
                Some(AdminGate {
                    encoding_key: EncodingKey::from_secret(admin.jwt_secret.as_bytes()),
                    decoding_key: DecodingKey::from_secret(admin.jwt_secret.as_bytes()),
                    username: admin.username,
                    password: admin.password,
                    token_ttl_secs: admin.token_ttl_secs.min(i64::MAX as u64) as i64,
                })
            }
        };

        Ok(Self { gate })
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_some()
    }

    /// Exchange credentials for a session token.
    ///
    /// Returns `Ok(None)` for wrong credentials, and also in `none` mode where
    /// no token is needed.
    pub fn login(&self, username: &str, password: &str) -> Result<Option<IssuedToken>> {
        let Some(gate) = &self.gate else {
            return Ok(None);
        };

        let user_ok: bool = username.as_bytes().ct_eq(gate.username.as_bytes()).into();
        let pass_ok: bool = password.as_bytes().ct_eq(gate.password.as_bytes()).into();
        if !(user_ok & pass_ok) {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: gate.username.clone(),
            iat: now,
            exp: now.saturating_add(gate.token_ttl_secs),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &gate.encoding_key)
            .context("failed to sign session token")?;

        Ok(Some(IssuedToken {
            token,
            expires_at: claims.exp,
        }))
    }

    /// Check a session token's signature and expiry.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let Some(gate) = &self.gate else {
            bail!("authentication is disabled");
        };

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &gate.decoding_key, &validation)
            .context("token failed signature or expiry validation")?;

        if data.claims.sub != gate.username {
            bail!("token subject does not match the admin account");
        }

        Ok(data.claims)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Middleware for admin routes: requires a valid bearer token unless
/// authentication is disabled. Valid claims are attached to the request.
pub async fn require_admin(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        return AppError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    match auth.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            debug!("Rejected admin token: {:#}", e);
            AppError::Unauthorized("Invalid or expired token".to_string()).into_response()
        }
    }
}
