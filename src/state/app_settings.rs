use crate::state::history::LabelConfig;
use log::warn;
use lovecast_api::client::DEFAULT_BACKEND_URL;
use std::time::Duration;

const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub backend_url: String,
    pub token: Option<String>,
    pub refresh_interval: Duration,
    pub labels: LabelConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            token: None,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            labels: LabelConfig::default(),
        }
    }
}

impl AppSettings {
    /// Defaults overridden by `LOVECAST_*` environment variables.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read before the subscriber exists, so it cannot go through `load`.
    pub fn log_filter() -> String {
        Self::log_filter_from(|key| std::env::var(key).ok())
    }

    fn log_filter_from(lookup: impl Fn(&str) -> Option<String>) -> String {
        ["LOVECAST_LOG", "RUST_LOG"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(url) = get("LOVECAST_BACKEND_URL") {
            settings.backend_url = url.trim_end_matches('/').to_owned();
        }
        settings.token = get("LOVECAST_TOKEN");

        if let Some(raw) = get("LOVECAST_REFRESH_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => settings.refresh_interval = Duration::from_secs(secs),
                _ => warn!("ignoring invalid LOVECAST_REFRESH_SECS={raw}"),
            }
        }

        if let Some(path) = get("LOVECAST_LABELS_JSON") {
            match load_labels(&path) {
                Ok(labels) => settings.labels = labels,
                Err(e) => warn!("could not load labels from {path}: {e}"),
            }
        }

        settings
    }
}

fn load_labels(path: &str) -> anyhow::Result<LabelConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
