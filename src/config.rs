use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPLOAD_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Optional external database, only ever probed by the diagnostics endpoint.
#[derive(Clone, Debug, Default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub name: Option<String>,
}

impl DatabaseSettings {
    pub fn from_env() -> Self {
        Self {
            url: non_blank_var("DATABASE_URL"),
            name: non_blank_var("DATABASE_NAME"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub upload_body_limit: usize,
    pub database: DatabaseSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: non_blank(env::var("HOST").ok()).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_port(env::var("PORT").ok()),
            upload_dir: resolve_upload_dir(env::var("UPLOAD_DIR").ok()),
            upload_body_limit: parse_body_limit(env::var("UPLOAD_BODY_LIMIT").ok()),
            database: DatabaseSettings::from_env(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn non_blank_var(key: &str) -> Option<String> {
    non_blank(env::var(key).ok())
}

fn parse_port(raw: Option<String>) -> u16 {
    non_blank(raw)
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn parse_body_limit(raw: Option<String>) -> usize {
    non_blank(raw)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_UPLOAD_BODY_LIMIT)
}

fn resolve_upload_dir(raw: Option<String>) -> PathBuf {
    if let Some(dir) = non_blank(raw) {
        return PathBuf::from(dir);
    }
    let mut base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    base.push("uploads");
    base
}
