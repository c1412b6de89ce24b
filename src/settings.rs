use anyhow::bail;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GRADESD_LOG";
pub const LOG_FORMAT_ENV: &str = "GRADESD_LOG_FORMAT";
const DEFAULT_LOG_FILTER: &str = "gradesd=info";

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_filter = lookup(LOG_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let log_format = match lookup(LOG_FORMAT_ENV)
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("{LOG_FORMAT_ENV} must be 'text' or 'json', got '{other}'"),
        };

        Ok(Self {
            log_filter,
            log_format,
        })
    }
}

/// Installs the global subscriber. Logs go to stderr; stdout carries IPC
/// responses. Later calls are no-ops.
pub fn init_tracing(settings: &Settings) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(&settings.log_filter)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr);
        match settings.log_format {
            LogFormat::Text => builder.init(),
            LogFormat::Json => builder.json().init(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).expect("settings");
        assert_eq!(s.log_filter, "gradesd=info");
        assert_eq!(s.log_format, LogFormat::Text);
    }

    #[test]
    fn reads_filter_and_format() {
        let s = Settings::from_lookup(lookup(&[
            (LOG_ENV, "gradesd=debug"),
            (LOG_FORMAT_ENV, " JSON "),
        ]))
        .expect("settings");
        assert_eq!(s.log_filter, "gradesd=debug");
        assert_eq!(s.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = Settings::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")]))
            .unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
