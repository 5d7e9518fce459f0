use crate::aggregate::DEFAULT_MIN_TRAILING_DAYS;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
/// Upper bound for `min_trailing_days`.
pub const MAX_TRAILING_DAYS: usize = 366;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub api_url: String,
    /// When set, activities are read from this JSON file instead of the API.
    pub activities_path: Option<PathBuf>,
    pub min_trailing_days: usize,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("RWATCH_API_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            api_url,
            activities_path: lookup("RWATCH_ACTIVITIES_PATH")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            min_trailing_days: clamp_trailing_days(parse_or(
                &lookup,
                "RWATCH_MIN_TRAILING_DAYS",
                DEFAULT_MIN_TRAILING_DAYS,
            )),
            fetch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "RWATCH_FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
        }
    }
}

fn clamp_trailing_days(days: usize) -> usize {
    if days > MAX_TRAILING_DAYS {
        warn!("RWATCH_MIN_TRAILING_DAYS {days} exceeds {MAX_TRAILING_DAYS}, clamping");
        return MAX_TRAILING_DAYS;
    }
    days
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("invalid {key} value {raw:?}, using default");
            default
        }),
        None => default,
    }
}
