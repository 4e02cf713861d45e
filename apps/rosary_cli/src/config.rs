use std::{fs, path::Path};

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub guide: String,
    pub duration: String,
    /// Durations the simulated audio provider can serve.
    pub durations: Vec<String>,
    pub track_seconds: u64,
    pub dispatch_batch: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/rosary.db".into(),
            guide: "sister-anne".into(),
            duration: "standard".into(),
            durations: vec!["short".into(), "standard".into()],
            track_seconds: 3,
            dispatch_batch: notifier::DEFAULT_BATCH_SIZE,
        }
    }
}

pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

/// Shape of `rosary.toml`. Numbers may be written bare or quoted, lists as a
/// TOML array or a comma separated string.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    guide: Option<String>,
    duration: Option<String>,
    durations: Option<ListValue>,
    track_seconds: Option<NumberValue>,
    dispatch_batch: Option<NumberValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberValue {
    Integer(i64),
    Text(String),
}

impl NumberValue {
    fn raw(&self) -> String {
        match self {
            NumberValue::Integer(value) => value.to_string(),
            NumberValue::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListValue {
    Items(Vec<String>),
    Text(String),
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!("config: ignoring unreadable config file: {err}");
            return;
        }
    };

    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.guide {
        settings.guide = v;
    }
    if let Some(v) = file_cfg.duration {
        settings.duration = v;
    }
    match file_cfg.durations {
        Some(ListValue::Items(items)) => settings.durations = split_items(items),
        Some(ListValue::Text(v)) => settings.durations = split_list(&v),
        None => {}
    }
    if let Some(v) = file_cfg.track_seconds {
        apply_number(&mut settings.track_seconds, "track_seconds", &v.raw());
    }
    if let Some(v) = file_cfg.dispatch_batch {
        apply_number(&mut settings.dispatch_batch, "dispatch_batch", &v.raw());
    }
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ROSARY_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("ROSARY_GUIDE") {
        settings.guide = v;
    }
    if let Some(v) = lookup("ROSARY_DURATION") {
        settings.duration = v;
    }
    if let Some(v) = lookup("ROSARY_DURATIONS") {
        settings.durations = split_list(&v);
    }

    if let Some(v) = lookup("APP__TRACK_SECONDS") {
        apply_number(&mut settings.track_seconds, "APP__TRACK_SECONDS", &v);
    }
    if let Some(v) = lookup("APP__DISPATCH_BATCH") {
        apply_number(&mut settings.dispatch_batch, "APP__DISPATCH_BATCH", &v);
    }
}

fn apply_number<T: std::str::FromStr>(target: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!("config: ignoring non-numeric {key}='{raw}'"),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    split_items(raw.split(','))
}

fn split_items<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
