//! Environment-driven configuration.
//!
//! Everything is read from the process environment (optionally seeded from a
//! `.env` file by `dotenvy` in [`crate::run`]).

use std::net::SocketAddr;

/// Default bind host when `HOST` is unset.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port when `PORT` is unset or unparsable.
pub const DEFAULT_PORT: u16 = 3001;

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", DEFAULT_HOST),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            environment: env_or("ENVIRONMENT", "development"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Public metadata used when rendering the feed.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("SITE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            title: env_or("SITE_TITLE", "Poetry & Thoughts"),
            description: env_or("SITE_DESCRIPTION", "New poems and blog posts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_socket_addr_parses() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
        };
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(!config.is_production());
    }

    #[test]
    fn test_site_config_url_has_no_trailing_slash() {
        let site = SiteConfig::from_env();
        assert!(!site.url.ends_with('/'));
        assert!(!site.title.is_empty());
    }
}
