pub mod profiles;

use dotenvy::dotenv;
use profiles::{Profile, ProfileDefaults};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub gateway_base_url: String,
    pub gateway_server_key: String,
    pub webhook_secret: String,
    pub directory_base_url: String,
    pub transport_base_url: String,
    pub operator_phone: Option<String>,
    pub cors_allowed_origins: Option<String>,
    pub gateway_timeout_secs: u64,
    pub directory_timeout_secs: u64,
}

pub struct ConfigInfo {
    pub config: Config,
    pub profile: Profile,
    pub overrides: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<ConfigInfo> {
        dotenv().ok();

        let profile = Profile::from_env();
        let defaults = ProfileDefaults::for_profile(profile);
        let mut overrides = Vec::new();

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| {
                overrides.push("SERVER_PORT".to_string());
                v.parse().ok()
            })
            .unwrap_or(defaults.server_port);

        let gateway_base_url = env::var("GATEWAY_BASE_URL")
            .ok()
            .map(|v| {
                overrides.push("GATEWAY_BASE_URL".to_string());
                v
            })
            .unwrap_or(defaults.gateway_base_url);

        let gateway_server_key = env::var("GATEWAY_SERVER_KEY").or_else(|_| {
            defaults
                .gateway_server_key
                .ok_or_else(|| anyhow::anyhow!("GATEWAY_SERVER_KEY must be set"))
        })?;
        if env::var("GATEWAY_SERVER_KEY").is_ok() {
            overrides.push("GATEWAY_SERVER_KEY".to_string());
        }

        let webhook_secret = env::var("WEBHOOK_SECRET").or_else(|_| {
            defaults
                .webhook_secret
                .ok_or_else(|| anyhow::anyhow!("WEBHOOK_SECRET must be set"))
        })?;
        if env::var("WEBHOOK_SECRET").is_ok() {
            overrides.push("WEBHOOK_SECRET".to_string());
        }

        let directory_base_url = env::var("DIRECTORY_BASE_URL")
            .ok()
            .map(|v| {
                overrides.push("DIRECTORY_BASE_URL".to_string());
                v
            })
            .unwrap_or(defaults.directory_base_url);

        let transport_base_url = env::var("TRANSPORT_BASE_URL")
            .ok()
            .map(|v| {
                overrides.push("TRANSPORT_BASE_URL".to_string());
                v
            })
            .unwrap_or(defaults.transport_base_url);

        let operator_phone = env::var("OPERATOR_PHONE")
            .ok()
            .map(|v| {
                overrides.push("OPERATOR_PHONE".to_string());
                Some(v)
            })
            .unwrap_or(defaults.operator_phone);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|v| {
                overrides.push("CORS_ALLOWED_ORIGINS".to_string());
                Some(v)
            })
            .unwrap_or(defaults.cors_allowed_origins);

        let gateway_timeout_secs = env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| {
                overrides.push("GATEWAY_TIMEOUT_SECS".to_string());
                v.parse().ok()
            })
            .unwrap_or(defaults.gateway_timeout_secs);

        let directory_timeout_secs = env::var("DIRECTORY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| {
                overrides.push("DIRECTORY_TIMEOUT_SECS".to_string());
                v.parse().ok()
            })
            .unwrap_or(defaults.directory_timeout_secs);

        let config = Config {
            server_port,
            gateway_base_url,
            gateway_server_key,
            webhook_secret,
            directory_base_url,
            transport_base_url,
            operator_phone,
            cors_allowed_origins,
            gateway_timeout_secs,
            directory_timeout_secs,
        };
        config.validate()?;

        Ok(ConfigInfo {
            config,
            profile,
            overrides,
        })
    }

    /// Rejects configs whose collaborator endpoints are not absolute URLs,
    /// so a typo fails at startup instead of on the first request.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("GATEWAY_BASE_URL", &self.gateway_base_url),
            ("DIRECTORY_BASE_URL", &self.directory_base_url),
            ("TRANSPORT_BASE_URL", &self.transport_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", name, value, e))?;
        }
        if self.gateway_timeout_secs == 0 || self.directory_timeout_secs == 0 {
            anyhow::bail!("timeouts must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3000,
            gateway_base_url: "https://app.sandbox.midtrans.com".to_string(),
            gateway_server_key: "SB-Mid-server-dev".to_string(),
            webhook_secret: "dev-webhook-secret".to_string(),
            directory_base_url: "http://localhost:4000".to_string(),
            transport_base_url: "http://localhost:4100".to_string(),
            operator_phone: None,
            cors_allowed_origins: None,
            gateway_timeout_secs: 30,
            directory_timeout_secs: 10,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = base_config();
        config.directory_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = base_config();
        config.gateway_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
