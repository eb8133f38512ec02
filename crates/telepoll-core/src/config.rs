use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Typed configuration for the polling client.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// Host override; requests go to `{api_url}/bot{token}/{method}`.
    pub api_url: String,

    // Cursor
    pub offset_file: Option<PathBuf>,
    pub poll_interval: Duration,
    pub batch_limit: Option<u32>,

    // Behavior flags
    pub echo: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("TELEPOLL_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEPOLL_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let api_url = lookup("TELEPOLL_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "TELEPOLL_API_URL must be an http(s) URL, got {api_url:?}"
            )));
        }

        let offset_file = lookup("TELEPOLL_OFFSET_FILE")
            .and_then(non_empty)
            .map(PathBuf::from);

        let poll_interval = Duration::from_millis(
            parse_u64(lookup("TELEPOLL_POLL_INTERVAL_MS")).unwrap_or(1000),
        );

        let batch_limit = match parse_u64(lookup("TELEPOLL_BATCH_LIMIT")) {
            None => None,
            Some(n @ 1..=100) => Some(n as u32),
            Some(n) => {
                return Err(Error::Config(format!(
                    "TELEPOLL_BATCH_LIMIT must be between 1 and 100, got {n}"
                )))
            }
        };

        let echo = parse_bool(lookup("TELEPOLL_ECHO")).unwrap_or(false);

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            api_url,
            offset_file,
            poll_interval,
            batch_limit,
            echo,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
