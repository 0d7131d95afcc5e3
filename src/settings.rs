use anyhow::{bail, Result};
use std::time::Duration;

use crate::database::Database;
use crate::models::{Filter, Page};

pub const DEFAULT_PAGE: &str = "default_page";
pub const DEFAULT_FILTER: &str = "default_filter";
pub const NOTIFICATION_SECS: &str = "notification_secs";

/// Keys accepted by `taskmaster set`, with their descriptions.
pub const KNOWN_KEYS: [(&str, &str); 3] = [
    (DEFAULT_PAGE, "Page shown when the TUI starts (dashboard, tasks, calendar)"),
    (DEFAULT_FILTER, "Initial task list filter (all, pending, in-progress, completed)"),
    (NOTIFICATION_SECS, "Seconds a success notification stays visible"),
];

/// Longest a notification may stay up.
pub const MAX_NOTIFICATION_SECS: u64 = 3600;

fn parse_notification_secs(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_NOTIFICATION_SECS).contains(&secs) => Ok(secs),
        _ => bail!(
            "{} must be a whole number of seconds between 1 and {}",
            NOTIFICATION_SECS,
            MAX_NOTIFICATION_SECS
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub default_page: Page,
    pub default_filter: Filter,
    pub notification: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_page: Page::Dashboard,
            default_filter: Filter::All,
            notification: Duration::from_secs(3),
        }
    }
}

impl Settings {
    /// Reads the config table. Unparseable values fall back to defaults.
    pub fn load(db: &Database) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(value) = db.get_config(DEFAULT_PAGE)? {
            match value.parse() {
                Ok(page) => settings.default_page = page,
                Err(e) => log::warn!("Ignoring config {}: {}", DEFAULT_PAGE, e),
            }
        }
        if let Some(value) = db.get_config(DEFAULT_FILTER)? {
            match value.parse() {
                Ok(filter) => settings.default_filter = filter,
                Err(e) => log::warn!("Ignoring config {}: {}", DEFAULT_FILTER, e),
            }
        }
        if let Some(value) = db.get_config(NOTIFICATION_SECS)? {
            match parse_notification_secs(&value) {
                Ok(secs) => settings.notification = Duration::from_secs(secs),
                Err(e) => log::warn!("Ignoring config {}: {}", NOTIFICATION_SECS, e),
            }
        }

        Ok(settings)
    }

    /// Checks a value before it is written to the config table.
    pub fn validate(key: &str, value: &str) -> Result<()> {
        match key {
            DEFAULT_PAGE => {
                value.parse::<Page>()?;
            }
            DEFAULT_FILTER => {
                value.parse::<Filter>()?;
            }
            NOTIFICATION_SECS => {
                parse_notification_secs(value)?;
            }
            other => {
                let known: Vec<&str> = KNOWN_KEYS.iter().map(|(k, _)| *k).collect();
                bail!("unknown config key '{}'. Known keys: {}", other, known.join(", "));
            }
        }
        Ok(())
    }

    pub fn describe(key: &str) -> Option<&'static str> {
        KNOWN_KEYS.iter().find(|(k, _)| *k == key).map(|(_, d)| *d)
    }
}
