use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One recorded site visit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisitorEvent {
    pub id: i64,
    pub created_at: i64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: String,
}

/// Kind of tracked blog interaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    View,
    Read,
    Click,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event type '{0}'")]
pub struct UnknownEventType(pub String);

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::View => "view",
            EventType::Read => "read",
            EventType::Click => "click",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(EventType::View),
            "read" => Ok(EventType::Read),
            "click" => Ok(EventType::Click),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

/// One tracked interaction with a blog post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogInteractionEvent {
    pub blog_slug: String,
    pub blog_title: String,
    pub event_type: EventType,
    pub created_at: i64,
}

/// Visitor row ready to be inserted
#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub created_at: i64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: String,
}

/// Blog interaction row ready to be inserted
#[derive(Debug, Clone)]
pub struct NewBlogEvent {
    pub blog_slug: String,
    pub blog_title: String,
    pub event_type: EventType,
    pub created_at: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VisitRequest {
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogEventRequest {
    pub blog_slug: String,
    #[serde(default)]
    pub blog_title: String,
    pub event_type: String,
}
