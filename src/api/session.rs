use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::AppError;

use super::handlers::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub auth_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Trade admin credentials for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if !state.auth.is_enabled() {
        return Ok(Json(LoginResponse {
            auth_required: false,
            token: None,
            expires_at: None,
        }));
    }

    match state.auth.login(&body.username, &body.password) {
        Ok(Some(issued)) => {
            info!(user = %body.username, "Admin signed in");
            Ok(Json(LoginResponse {
                auth_required: true,
                token: Some(issued.token),
                expires_at: Some(issued.expires_at),
            }))
        }
        Ok(None) => {
            warn!(user = %body.username, "Rejected admin sign-in");
            Err(AppError::Unauthorized("Invalid credentials".to_string()))
        }
        Err(e) => {
            error!("Failed to issue session token: {:#}", e);
            Err(AppError::Internal("Failed to sign in".to_string()))
        }
    }
}
