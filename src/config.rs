use anyhow::{bail, Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub webhook: Option<WebhookConfig>,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub metrics_cache_ttl_secs: u64,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", raw))?,
            None => 8080,
        };

        let webhook = match (lookup("USAGE_WEBHOOK_URL"), lookup("USAGE_WEBHOOK_SECRET")) {
            (Some(url), Some(secret)) if !url.trim().is_empty() => Some(WebhookConfig {
                url: url.trim().to_string(),
                secret,
            }),
            (Some(url), None) if !url.trim().is_empty() => {
                bail!("USAGE_WEBHOOK_SECRET must be set when USAGE_WEBHOOK_URL is set")
            }
            _ => None,
        };

        let metrics_cache_ttl_secs = match lookup("METRICS_CACHE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("METRICS_CACHE_TTL_SECS is not a number: {}", raw))?,
            None => AppConfig::default().metrics_cache_ttl_secs,
        };

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            webhook,
            app: AppConfig {
                metrics_cache_ttl_secs,
                cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN").filter(|o| !o.trim().is_empty()),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metrics_cache_ttl_secs: 300,
            cors_allowed_origin: None,
        }
    }
}
