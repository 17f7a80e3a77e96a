use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Content types accepted for spreadsheet uploads: legacy binary `.xls` and
/// zipped-XML `.xlsx`.
pub const ALLOWED_MIME_TYPES: [&str; 2] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub upload_dir: PathBuf,
    pub database_path: PathBuf,
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            upload_dir: std::env::temp_dir(),
            database_path: PathBuf::from("sheet_charts.db"),
            preview_rows: 100,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr)?,
            max_file_size: env_or("MAX_FILE_SIZE", defaults.max_file_size)?,
            upload_dir: env_or("UPLOAD_DIR", defaults.upload_dir)?,
            database_path: env_or("DATABASE_PATH", defaults.database_path)?,
            preview_rows: env_or("PREVIEW_ROWS", defaults.preview_rows)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        _ => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::new()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}
