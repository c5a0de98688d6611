use anyhow::{anyhow, bail, Context, Result};
use std::time::Duration;

use crate::arc::ArcConfig;
use crate::database::Database;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
pub const DEFAULT_AUTOSAVE_SECS: u64 = 15;

pub const ENV_API_BASE: &str = "TASKTIMER_API_BASE";
pub const ENV_USER: &str = "TASKTIMER_USER";

/// (key, default, description)
pub const KNOWN_KEYS: &[(&str, Option<&str>, &str)] = &[
    ("api_base_url", Some(DEFAULT_API_BASE), "Base URL of the task service"),
    ("autosave_secs", Some("15"), "Seconds between saves of a running timer"),
    ("username", None, "User whose tasks are shown"),
];

fn parse_autosave_secs(raw: &str) -> Result<u64> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("invalid autosave_secs value '{raw}'"))?;
    if secs == 0 {
        bail!("autosave_secs must be at least 1");
    }
    Ok(secs)
}

/// Checks a value before it is stored, so a bad setting cannot break startup.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    match key {
        "autosave_secs" => parse_autosave_secs(value).map(|_| ()),
        "api_base_url" => reqwest::Url::parse(value.trim())
            .map(|_| ())
            .with_context(|| format!("invalid api_base_url '{value}'")),
        "username" if value.trim().is_empty() => bail!("username cannot be blank"),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub username: Option<String>,
    pub autosave: Duration,
    pub arc: ArcConfig,
}

impl AppConfig {
    /// Flags win over the environment, which wins over stored settings.
    pub fn resolve(db: &Database, user_flag: Option<String>, api_flag: Option<String>) -> Result<Self> {
        Self::resolve_with(db, user_flag, api_flag, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        db: &Database,
        user_flag: Option<String>,
        api_flag: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_base_url = match api_flag.or_else(|| env(ENV_API_BASE)) {
            Some(url) => url,
            None => db
                .get_config("api_base_url")?
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        };

        let username = match user_flag.or_else(|| env(ENV_USER)) {
            Some(user) => Some(user),
            None => db.get_config("username")?,
        }
        .filter(|user| !user.trim().is_empty());

        let autosave_secs = match db.get_config("autosave_secs")? {
            Some(raw) => parse_autosave_secs(&raw)?,
            None => DEFAULT_AUTOSAVE_SECS,
        };

        Ok(AppConfig {
            api_base_url,
            username,
            autosave: Duration::from_secs(autosave_secs),
            arc: ArcConfig::default(),
        })
    }

    pub fn require_username(&self) -> Result<&str> {
        self.username.as_deref().ok_or_else(|| {
            anyhow!(
                "no username configured; pass --user NAME, set {ENV_USER}, or run `tasktimer set username NAME`"
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let db = Database::open_in_memory().unwrap();
        let config = AppConfig::resolve_with(&db, None, None, no_env).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.autosave, Duration::from_secs(15));
        assert!(config.username.is_none());
        assert!(config.require_username().is_err());
    }

    #[test]
    fn test_resolution_order() {
        let db = Database::open_in_memory().unwrap();
        db.set_config("username", "stored").unwrap();
        db.set_config("api_base_url", "http://stored").unwrap();

        let env = |key: &str| match key {
            ENV_USER => Some("from-env".to_string()),
            _ => None,
        };

        let config = AppConfig::resolve_with(&db, None, None, env).unwrap();
        assert_eq!(config.require_username().unwrap(), "from-env");
        assert_eq!(config.api_base_url, "http://stored");

        let config =
            AppConfig::resolve_with(&db, Some("flag".into()), Some("http://flag".into()), env).unwrap();
        assert_eq!(config.require_username().unwrap(), "flag");
        assert_eq!(config.api_base_url, "http://flag");
    }

    #[test]
    fn test_invalid_autosave_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.set_config("autosave_secs", "soon").unwrap();
        assert!(AppConfig::resolve_with(&db, None, None, no_env).is_err());

        db.set_config("autosave_secs", "0").unwrap();
        assert!(AppConfig::resolve_with(&db, None, None, no_env).is_err());
    }

    #[test]
    fn test_validate_setting() {
        assert!(validate_setting("autosave_secs", "30").is_ok());
        assert!(validate_setting("autosave_secs", "0").is_err());
        assert!(validate_setting("autosave_secs", "soon").is_err());
        assert!(validate_setting("api_base_url", "http://tasks.local:9000").is_ok());
        assert!(validate_setting("api_base_url", "not a url").is_err());
        assert!(validate_setting("username", " ").is_err());
        assert!(validate_setting("theme", "anything").is_ok());
    }

    #[test]
    fn test_blank_username_counts_as_missing() {
        let db = Database::open_in_memory().unwrap();
        let config = AppConfig::resolve_with(&db, Some("  ".into()), None, no_env).unwrap();
        assert!(config.username.is_none());
    }
}
