use anyhow::Context;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub auth: AuthConfig,
    pub frontend: FrontendConfig,
    pub cache: CacheConfig,
    pub analytics: AnalyticsConfig,
    pub blog: BlogConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Password,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(default)]
    pub admin: Option<AdminAuthConfig>,
}

/// Credentials guarding the content-management endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAuthConfig {
    pub username: String,
    pub password: String,
    pub jwt_secret: String,
    #[serde(default = "AdminAuthConfig::default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Directory with the prebuilt site, served at `/` when set
    pub static_dir: Option<String>,
    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub default_days: u32,
    pub max_days: u32,
    pub top_n: usize,
    pub recent_visitors: i64,
    pub ip_anonymization: bool,
    pub trusted_proxy_mode: TrustedProxyMode,
    #[serde(default)]
    pub trusted_proxies: Vec<IpNet>,
    #[serde(default)]
    pub num_trusted_proxies: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    #[default]
    None,
    Standard,
    Cloudflare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    pub default_author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Form-service endpoint that receives contact submissions
    pub form_url: Option<String>,
    pub timeout_secs: u64,
}

impl AdminAuthConfig {
    const fn default_token_ttl_secs() -> u64 {
        86_400
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_days: 30,
            max_days: 365,
            top_n: 10,
            recent_visitors: 20,
            ip_anonymization: false,
            trusted_proxy_mode: TrustedProxyMode::None,
            trusted_proxies: Vec::new(),
            num_trusted_proxies: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./folio.db?mode=rwc".to_string());

        let max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = parse_env("API_PORT", 8080u16)?;

        let auth_mode = match std::env::var("AUTH_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase()
            .as_str()
        {
            "none" => AuthMode::None,
            "password" => AuthMode::Password,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'none'. Supported values: none, password"
                );
                AuthMode::None
            }
        };

        let admin = if auth_mode == AuthMode::Password {
            let username =
                std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
            let password = std::env::var("ADMIN_PASSWORD")
                .context("ADMIN_PASSWORD must be set when AUTH_MODE=password")?;
            let jwt_secret = std::env::var("AUTH_JWT_SECRET")
                .context("AUTH_JWT_SECRET must be set when AUTH_MODE=password")?;
            let token_ttl_secs = std::env::var("AUTH_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_else(AdminAuthConfig::default_token_ttl_secs);

            Some(AdminAuthConfig {
                username,
                password,
                jwt_secret,
                token_ttl_secs,
            })
        } else {
            None
        };

        let static_dir = std::env::var("FRONTEND_STATIC_DIR").ok();
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default()
            .into_iter()
            .filter(|origin| origin != "*")
            .collect();

        let defaults = AnalyticsConfig::default();
        let trusted_proxy_mode = match std::env::var("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase()
            .as_str()
        {
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            "none" => TrustedProxyMode::None,
            other => {
                tracing::warn!("Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'none'");
                TrustedProxyMode::None
            }
        };
        let trusted_proxies = std::env::var("TRUSTED_PROXIES")
            .map(|v| split_list(&v))
            .unwrap_or_default()
            .iter()
            .map(|cidr| {
                cidr.parse::<IpNet>()
                    .with_context(|| format!("invalid CIDR in TRUSTED_PROXIES: {cidr}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let num_trusted_proxies = std::env::var("NUM_TRUSTED_PROXIES")
            .ok()
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("NUM_TRUSTED_PROXIES must be a non-negative integer")?;

        let analytics = AnalyticsConfig {
            default_days: parse_env("ANALYTICS_DEFAULT_DAYS", defaults.default_days)?,
            max_days: parse_env("ANALYTICS_MAX_DAYS", defaults.max_days)?,
            top_n: parse_env("ANALYTICS_TOP_N", defaults.top_n)?,
            recent_visitors: parse_env("ANALYTICS_RECENT_VISITORS", defaults.recent_visitors)?,
            ip_anonymization: std::env::var("ANALYTICS_IP_ANONYMIZATION")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            trusted_proxy_mode,
            trusted_proxies,
            num_trusted_proxies,
        };

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            auth: AuthConfig {
                mode: auth_mode,
                admin,
            },
            frontend: FrontendConfig {
                static_dir,
                cors_allowed_origins,
            },
            cache: CacheConfig {
                max_entries: parse_env("CACHE_MAX_ENTRIES", 1000u64)?,
                ttl_secs: parse_env("CACHE_TTL_SECS", 300u64)?,
            },
            analytics,
            blog: BlogConfig {
                default_author: std::env::var("BLOG_DEFAULT_AUTHOR")
                    .unwrap_or_else(|_| "Admin".to_string()),
            },
            contact: ContactConfig {
                form_url: std::env::var("CONTACT_FORM_URL")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
                timeout_secs: parse_env("CONTACT_TIMEOUT_SECS", 10u64)?,
            },
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
