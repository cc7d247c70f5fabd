use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: usize,
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
    pub output_root: PathBuf,
    pub synthesizer_url: Option<String>,
    pub synthesis_timeout_secs: u64,
    pub ffmpeg_bin: String,
    pub object_store_endpoint: Option<String>,
    pub object_store_bucket: Option<String>,
    pub admin_users: Vec<String>,
    pub default_admin_password: String,
    pub environment: Environment,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")?,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()?,
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            rate_limit_max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            chunk_max_chars: env::var("CHUNK_MAX_CHARS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            chunk_overlap_chars: env::var("CHUNK_OVERLAP_CHARS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            output_root: env::var("OUTPUT_ROOT")
                .unwrap_or_else(|_| "outputs".to_string())
                .into(),
            synthesizer_url: env::var("SYNTHESIZER_URL").ok().filter(|v| !v.is_empty()),
            synthesis_timeout_secs: env::var("SYNTHESIS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            ffmpeg_bin: env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            object_store_endpoint: env::var("OBJECT_STORE_ENDPOINT")
                .ok()
                .filter(|v| !v.is_empty()),
            object_store_bucket: env::var("OBJECT_STORE_BUCKET")
                .ok()
                .filter(|v| !v.is_empty()),
            admin_users: env::var("ADMIN_USERS")
                .unwrap_or_else(|_| "admin".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            default_admin_password: env::var("DEFAULT_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin".to_string()),
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_users.iter().any(|u| u == username)
    }
}
