//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;

use mediaguard_core::{DescriptorConfig, MetadataWatermarkConfig};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8080)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 10)
    pub database_max_connections: u32,
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 512)
    pub body_limit_mb: usize,
    /// Maximum media size per upload in MB (default: 500)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Video search engine base URL
    pub vse_address: String,
    /// Video search engine token
    pub vse_token: String,
    pub desc_tools_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub yt_dlp_path: String,
}

impl Default for Config {
    fn default() -> Self {
        let descriptor = DescriptorConfig::default();
        let watermark = MetadataWatermarkConfig::default();
        Self {
            port: 8080,
            host: [127, 0, 0, 1],
            database_url: None,
            database_max_connections: 10,
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 512,
            max_file_size_mb: 500,
            timeout_secs: 120,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            vse_address: descriptor.vse_address,
            vse_token: descriptor.vse_token,
            desc_tools_path: descriptor.desc_tools_path,
            ffmpeg_path: watermark.ffmpeg_path,
            ffprobe_path: watermark.ffprobe_path,
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("API_PORT").ok())
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.database_max_connections);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.body_limit_mb);

        let max_file_size_mb = std::env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_file_size_mb);

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let rate_limit_per_sec = std::env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_sec);

        let rate_limit_burst = std::env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_burst);

        // Rate limiting is on unless RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let env_or = |name: &str, default: String| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            port,
            host,
            database_url,
            database_max_connections,
            allowed_origins,
            body_limit_mb,
            max_file_size_mb,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            vse_address: env_or("VSE_ADDRESS", defaults.vse_address),
            vse_token: env_or("VSE_TOKEN", defaults.vse_token),
            desc_tools_path: env_or("DESC_TOOLS_PATH", defaults.desc_tools_path),
            ffmpeg_path: env_or("FFMPEG_PATH", defaults.ffmpeg_path),
            ffprobe_path: env_or("FFPROBE_PATH", defaults.ffprobe_path),
            yt_dlp_path: env_or("YT_DLP_PATH", defaults.yt_dlp_path),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum upload size in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn descriptor_config(&self) -> DescriptorConfig {
        DescriptorConfig {
            vse_address: self.vse_address.clone(),
            vse_token: self.vse_token.clone(),
            desc_tools_path: self.desc_tools_path.clone(),
            ..DescriptorConfig::default()
        }
    }

    pub fn watermark_config(&self) -> MetadataWatermarkConfig {
        MetadataWatermarkConfig {
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffprobe_path: self.ffprobe_path.clone(),
            ..MetadataWatermarkConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 10);
        assert!(!config.rate_limit_enabled);
        assert_eq!(config.vse_address, "http://vse:7771");
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            port: 9000,
            host: [0, 0, 0, 0],
            ..Config::default()
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn test_plugin_configs_follow_server_config() {
        let config = Config {
            ffprobe_path: "/opt/ffmpeg/bin/ffprobe".into(),
            vse_token: "secret".into(),
            ..Config::default()
        };
        assert_eq!(config.watermark_config().ffprobe_path, "/opt/ffmpeg/bin/ffprobe");
        assert_eq!(config.watermark_config().tag, "comment");
        assert_eq!(config.descriptor_config().vse_token, "secret");
        assert_eq!(config.descriptor_config().preset, "optimized");
    }

    #[test]
    fn test_max_file_size_bytes() {
        let config = Config {
            max_file_size_mb: 2,
            ..Config::default()
        };
        assert_eq!(config.max_file_size(), 2 * 1024 * 1024);
    }
}
