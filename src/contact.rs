//! Relay for the site's contact form to an external form service

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::ValidateEmail;

use crate::config::ContactConfig;

const MESSAGE_MAX: usize = 5_000;
const NAME_MAX: usize = 200;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactRequest {
    /// Problems that make the submission unsendable, in field order
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            problems.push("Name is required".to_string());
        } else if name.chars().count() > NAME_MAX {
            problems.push(format!("Name must be at most {NAME_MAX} characters"));
        }

        if !looks_like_email(self.email.trim()) {
            problems.push("A valid email address is required".to_string());
        }

        let message = self.message.trim();
        if message.is_empty() {
            problems.push("Message is required".to_string());
        } else if message.chars().count() > MESSAGE_MAX {
            problems.push(format!("Message must be at most {MESSAGE_MAX} characters"));
        }

        problems
    }
}

fn looks_like_email(email: &str) -> bool {
    email.validate_email()
}

pub struct ContactRelay {
    endpoint: String,
    client: Client,
}

impl ContactRelay {
    pub fn from_config(config: &ContactConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.form_url.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .user_agent(concat!("folio-contact-relay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client for contact relay")?;

        Ok(Some(Self { endpoint, client }))
    }

    /// Forward a submission; any non-success status is an error.
    pub async fn send(&self, request: &ContactRequest) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .context("contact form service unreachable")?;

        let status = response.status();
        if !status.is_success() {
            bail!("contact form service responded with {status}");
        }

        Ok(())
    }
}
