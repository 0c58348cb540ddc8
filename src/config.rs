//! Environment-driven server configuration.
//!
//! Loaded once at startup and read-only afterwards. Only the hosting shell
//! is configurable; document geometry and branding are compile-time
//! constants in the composer.

use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port (`PORT`, default 8080).
    pub port: u16,
    /// API-only mode: when set, the Swagger UI route is not mounted
    /// (`HEADLESS`, default false).
    pub headless: bool,
    /// Use a permissive CORS policy instead of the local-dev allow-list
    /// (`CORS_PERMISSIVE`, default false).
    pub cors_permissive: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(8080);

        Self {
            port,
            headless: env_flag("HEADLESS"),
            cors_permissive: env_flag("CORS_PERMISSIVE"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            headless: false,
            cors_permissive: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert!(!config.headless);
        assert!(!config.cors_permissive);
    }
}
