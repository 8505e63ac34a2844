//! Best-effort reachability report for the backend and its optional database.
//!
//! Nothing here returns an error: every failure is folded into a
//! [`ProbeStatus`] so the diagnostic endpoint always answers.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::config::DatabaseSettings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_ERROR_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ProbeStatus {
    Unavailable,
    Configured,
    Connected,
    Error(String),
}

impl ProbeStatus {
    fn error(message: impl AsRef<str>) -> Self {
        Self::Error(message.as_ref().chars().take(MAX_ERROR_CHARS).collect())
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Unavailable => "Not Available".to_string(),
            Self::Configured => "Configured (not probed)".to_string(),
            Self::Connected => "Connected".to_string(),
            Self::Error(message) => format!("Error: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvVarStatus {
    Set,
    NotSet,
}

impl EnvVarStatus {
    fn of(value: Option<&str>) -> Self {
        if value.is_some() { Self::Set } else { Self::NotSet }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub backend: &'static str,
    pub database: ProbeStatus,
    pub database_url: EnvVarStatus,
    pub database_name: EnvVarStatus,
    pub connection_status: String,
    pub checked_at: String,
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "mongodb" => Some(27017),
        "postgres" | "postgresql" => Some(5432),
        "mysql" | "mariadb" => Some(3306),
        "redis" | "rediss" => Some(6379),
        _ => None,
    }
}

pub async fn probe_database(settings: &DatabaseSettings) -> ProbeStatus {
    let Some(raw) = settings.url.as_deref() else {
        return ProbeStatus::Unavailable;
    };
    let parsed = match Url::parse(raw.trim()) {
        Ok(parsed) => parsed,
        Err(err) => return ProbeStatus::error(format!("invalid DATABASE_URL: {err}")),
    };
    let Some(host) = parsed.host_str().map(str::to_string) else {
        return ProbeStatus::Configured;
    };
    let Some(port) = parsed.port().or_else(|| default_port(parsed.scheme())) else {
        return ProbeStatus::Configured;
    };

    debug!(%host, port, "probing database");
    match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(_)) => ProbeStatus::Connected,
        Ok(Err(err)) => ProbeStatus::error(err.to_string()),
        Err(_) => ProbeStatus::error(format!("timed out connecting to {host}:{port}")),
    }
}

pub async fn collect_report(settings: &DatabaseSettings) -> DiagnosticReport {
    let database = probe_database(settings).await;
    DiagnosticReport {
        backend: "running",
        connection_status: database.describe(),
        database,
        database_url: EnvVarStatus::of(settings.url.as_deref()),
        database_name: EnvVarStatus::of(settings.name.as_deref()),
        checked_at: Utc::now().to_rfc3339(),
    }
}
