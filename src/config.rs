use crate::session::SessionOptions;
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base_url: String,
    pub identity_path: PathBuf,
    pub chart_scale_floor: f64,
    pub toast_ttl: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parse_or(&lookup, "PORT", 8080),
            api_base_url: lookup("STATS_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
            identity_path: lookup("HOST_IDENTITY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/host_user.json")),
            chart_scale_floor: parse_or(&lookup, "CHART_SCALE_FLOOR", 60.0),
            toast_ttl: Duration::from_secs(parse_or(&lookup, "TOAST_TTL_SECS", 3)),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            chart_scale_floor: self.chart_scale_floor,
            toast_ttl: self.toast_ttl,
            ..SessionOptions::default()
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring invalid {key}={raw:?}, using {default}");
                default
            }
        },
        None => default,
    }
}
