use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{error, info};

use crate::contact::ContactRequest;
use crate::error::AppError;

use super::handlers::{AppState, SuccessResponse};

/// Forward a contact form submission to the configured form service
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Some(relay) = state.contact.as_ref() else {
        return Err(AppError::Unavailable(
            "Contact form is not configured".to_string(),
        ));
    };

    let problems = body.problems();
    if !problems.is_empty() {
        return Err(AppError::BadRequest(problems.join("; ")));
    }

    if let Err(e) = relay.send(&body).await {
        error!("Contact relay failed: {:#}", e);
        return Err(AppError::Upstream("Failed to send message".to_string()));
    }

    info!("Relayed contact form submission");
    Ok(Json(SuccessResponse {
        message: "Message sent".to_string(),
    }))
}
