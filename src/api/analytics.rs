//! Analytics API handlers

use axum::{
    extract::{connect_info::ConnectInfo, FromRequestParts, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::error;

use crate::analytics::ip_extractor::{header_city, header_country};
use crate::analytics::{
    anonymize_ip, extract_client_ip, load_stats, resolve_days, StatsResponse, StatsWindow,
};
use crate::error::AppError;
use crate::models::{BlogEventRequest, EventType, NewBlogEvent, NewVisitor, VisitRequest};

use super::handlers::{AppState, SuccessResponse};

#[derive(Debug, Deserialize)]
pub struct StatsQueryParams {
    /// Trailing window in days; kept raw so bad input falls back to the default
    pub days: Option<String>,
}

/// Socket peer address, when the server was started with connect info
pub struct PeerAddr(pub Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PeerAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        ))
    }
}

/// Dashboard aggregates for the trailing window
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQueryParams>,
) -> Result<Json<StatsResponse>, AppError> {
    let Some(storage) = state.storage.as_ref() else {
        error!("Analytics requested but no database client is available");
        return Err(AppError::Query("Database connection failed".to_string()));
    };

    let days = resolve_days(params.days.as_deref(), &state.analytics);
    let window = StatsWindow::new(days, Utc::now());

    match load_stats(storage.as_ref(), window, &state.analytics).await {
        Ok(stats) => Ok(Json(StatsResponse {
            success: true,
            stats,
        })),
        Err(e) => {
            error!("Failed to fetch analytics: {:#}", e);
            Err(AppError::Query("Failed to fetch analytics".to_string()))
        }
    }
}

/// Record a site visit for the requesting client
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
    Json(body): Json<VisitRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::Connectivity("Database unavailable".to_string()))?;

    let socket_ip = peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let mut client_ip = extract_client_ip(&headers, socket_ip, &state.analytics);
    if state.analytics.ip_anonymization {
        client_ip = anonymize_ip(client_ip);
    }

    let visitor = NewVisitor {
        created_at: Utc::now().timestamp(),
        country: non_blank(body.country).or_else(|| header_country(&headers)),
        city: non_blank(body.city).or_else(|| header_city(&headers)),
        ip_address: client_ip.to_string(),
    };

    if let Err(e) = storage.record_visitor(&visitor).await {
        error!("Failed to record visit: {:#}", e);
        return Err(AppError::Query("Failed to record visit".to_string()));
    }

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: "Visit recorded".to_string(),
        }),
    ))
}

/// Record a view, read or click on a blog post
pub async fn record_blog_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BlogEventRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    let event_type = body.event_type.parse::<EventType>().map_err(|e| {
        AppError::BadRequest(format!("{e}; expected one of view, read, click"))
    })?;

    let slug = body.blog_slug.trim();
    if slug.is_empty() {
        return Err(AppError::BadRequest("blogSlug is required".to_string()));
    }

    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::Connectivity("Database unavailable".to_string()))?;

    let title = match body.blog_title.trim() {
        "" => slug,
        title => title,
    };

    let event = NewBlogEvent {
        blog_slug: slug.to_string(),
        blog_title: title.to_string(),
        event_type,
        created_at: Utc::now().timestamp(),
    };

    if let Err(e) = storage.record_blog_event(&event).await {
        error!("Failed to record blog event: {:#}", e);
        return Err(AppError::Query("Failed to record blog event".to_string()));
    }

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: "Event recorded".to_string(),
        }),
    ))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
