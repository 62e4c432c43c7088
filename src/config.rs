use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    /// When set, the internal uploader's password is seeded from this value at startup.
    pub internal_password: Option<String>,
    pub checks: Option<ChecksConfig>,
    pub worker_count: usize,
}

#[derive(Debug, Clone)]
pub struct ChecksConfig {
    pub url: String,
    pub token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("RECEIVER_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid RECEIVER_HOST: {e}"))?;

        let port: u16 = env_or("RECEIVER_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid RECEIVER_PORT: {e}"))?;

        let max_body_size: usize = env_or("RECEIVER_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid RECEIVER_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("RECEIVER_LOG_LEVEL", "info");

        let internal_password = env_optional("RECEIVER_INTERNAL_PASSWORD");

        let checks = env_optional("RECEIVER_CHECKS_URL").map(|url| ChecksConfig {
            url,
            token: env_optional("RECEIVER_CHECKS_TOKEN"),
        });

        let worker_count: usize = env_or("RECEIVER_WORKER_COUNT", "2")
            .parse()
            .map_err(|e| format!("Invalid RECEIVER_WORKER_COUNT: {e}"))?;
        if worker_count == 0 {
            return Err("RECEIVER_WORKER_COUNT must be at least 1".to_string());
        }

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            log_level,
            internal_password,
            checks,
            worker_count,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
