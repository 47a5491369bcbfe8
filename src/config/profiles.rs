use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Staging,
    Production,
}

impl Profile {
    pub fn from_env() -> Self {
        std::env::var("APP_PROFILE")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "development" | "dev" => Some(Self::Development),
                "staging" | "stage" => Some(Self::Staging),
                "production" | "prod" => Some(Self::Production),
                _ => None,
            })
            .unwrap_or(Self::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileDefaults {
    pub server_port: u16,
    pub gateway_base_url: String,
    pub gateway_server_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub directory_base_url: String,
    pub transport_base_url: String,
    pub operator_phone: Option<String>,
    pub cors_allowed_origins: Option<String>,
    pub gateway_timeout_secs: u64,
    pub directory_timeout_secs: u64,
}

impl ProfileDefaults {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Development => Self {
                server_port: 3000,
                gateway_base_url: "https://app.sandbox.midtrans.com".to_string(),
                gateway_server_key: Some("SB-Mid-server-dev".to_string()),
                webhook_secret: Some("dev-webhook-secret".to_string()),
                directory_base_url: "http://localhost:4000".to_string(),
                transport_base_url: "http://localhost:4100".to_string(),
                operator_phone: None,
                cors_allowed_origins: None,
                gateway_timeout_secs: 30,
                directory_timeout_secs: 10,
            },
            Profile::Staging => Self {
                server_port: 8080,
                gateway_base_url: "https://app.sandbox.midtrans.com".to_string(),
                gateway_server_key: None,
                webhook_secret: None,
                directory_base_url: "http://directory:4000".to_string(),
                transport_base_url: "http://transport:4100".to_string(),
                operator_phone: None,
                cors_allowed_origins: Some("https://staging.example.com".to_string()),
                gateway_timeout_secs: 30,
                directory_timeout_secs: 10,
            },
            Profile::Production => Self {
                server_port: 8080,
                gateway_base_url: "https://app.midtrans.com".to_string(),
                gateway_server_key: None,
                webhook_secret: None,
                directory_base_url: "http://directory:4000".to_string(),
                transport_base_url: "http://transport:4100".to_string(),
                operator_phone: None,
                cors_allowed_origins: Some("https://app.example.com".to_string()),
                gateway_timeout_secs: 30,
                directory_timeout_secs: 10,
            },
        }
    }
}
