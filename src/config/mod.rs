use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Configuration for the media store and its HTTP surface
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory holding one subdirectory per category (default: "public/media")
    pub media_root: PathBuf,

    /// JSON index file (default: "data/media.json")
    pub index_file: PathBuf,

    /// Maximum upload size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Sniff uploaded bytes and reject a declared type that contradicts them (default: false)
    pub verify_content: bool,

    /// Bind address (default: 127.0.0.1)
    pub host: IpAddr,

    /// Bind port (default: 3000)
    pub port: u16,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("public/media"),
            index_file: PathBuf::from("data/media.json"),
            max_file_size: 100 * 1024 * 1024, // 100 MB
            verify_content: false,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.media_root),

            index_file: env::var("MEDIA_INDEX_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.index_file),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            verify_content: env::var("VERIFY_CONTENT")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.verify_content),

            host: env::var("HOST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    /// Config for local development: relaxed limits, no content sniffing
    pub fn development() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024,
            verify_content: false,
            ..Self::default()
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value != "false" && value != "0" && !value.is_empty()
}
