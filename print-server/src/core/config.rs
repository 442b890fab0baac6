use std::time::Duration;

use chrono_tz::Tz;

/// Fallback when `TIMEZONE` is not a valid IANA name
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Rome;

/// Server configuration
///
/// # Environment variables
///
/// | variable | default | meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP intake port |
/// | PRINTERS_FILE | printers.json | printer directory (JSON) |
/// | ASSET_DIR | assets | logo/footer directory |
/// | DEFAULT_ASSET_DIR | assets/default | fallback logo/footer directory |
/// | RETRY_INTERVAL_SECS | 60 | delivery queue sweep interval |
/// | RECEIPT_WIDTH | 48 | columns per line |
/// | PAPER_WIDTH_DOTS | 576 | raster image width |
/// | TIMEZONE | Europe/Rome | timezone for printed timestamps |
/// | LOG_LEVEL | info | log level |
/// | LOG_DIR | - | rolling log file directory |
///
/// ```ignore
/// PRINTERS_FILE=/etc/comanda/printers.json HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub printers_file: String,
    pub asset_dir: String,
    pub default_asset_dir: String,
    pub retry_interval_secs: u64,
    /// Characters per line (48 on 80mm paper)
    pub receipt_width: usize,
    pub paper_width_dots: u32,
    pub timezone: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            printers_file: std::env::var("PRINTERS_FILE")
                .unwrap_or_else(|_| "printers.json".into()),
            asset_dir: std::env::var("ASSET_DIR").unwrap_or_else(|_| "assets".into()),
            default_asset_dir: std::env::var("DEFAULT_ASSET_DIR")
                .unwrap_or_else(|_| "assets/default".into()),
            retry_interval_secs: std::env::var("RETRY_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
            receipt_width: std::env::var("RECEIPT_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(48),
            paper_width_dots: std::env::var("PAPER_WIDTH_DOTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(576),
            timezone: std::env::var("TIMEZONE").unwrap_or_else(|_| "Europe/Rome".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// Override the paths, keeping everything else from the environment
    ///
    /// Used by tests
    pub fn with_overrides(
        printers_file: impl Into<String>,
        asset_dir: impl Into<String>,
        http_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        let asset_dir = asset_dir.into();
        config.printers_file = printers_file.into();
        config.default_asset_dir = format!("{}/default", asset_dir);
        config.asset_dir = asset_dir;
        config.http_port = http_port;
        config
    }

    /// Parsed timezone, `None` if `TIMEZONE` is not a valid name
    pub fn parse_timezone(&self) -> Option<Tz> {
        self.timezone.parse().ok()
    }

    pub fn tz(&self) -> Tz {
        self.parse_timezone().unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
