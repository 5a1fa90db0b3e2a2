use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::Category;

pub const DEFAULT_INSIGHTS_URL: &str = "https://data.mixpanel.com/api/2.0/insights";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_TEAM_NAME: &str = "DocDigitizer";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub username: String,
    pub secret: String,
    pub project_id: String,
    pub api_url: String,
    pub timeout: Duration,
    pub filters: BTreeMap<Category, String>,
}

impl AnalyticsConfig {
    pub fn filter_for(&self, category: Category) -> Option<&str> {
        self.filters.get(&category).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender: String,
    pub app_password: String,
    pub recipients: Vec<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub team_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match optional(&lookup, "MIXPANEL_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "MIXPANEL_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let mut filters = BTreeMap::new();
        for category in Category::ALL {
            let name = format!("MIXPANEL_WHERE_{}", category.slot());
            if let Some(filter) = optional(&lookup, &name) {
                filters.insert(category, filter);
            }
        }

        let analytics = AnalyticsConfig {
            username: required(&lookup, "MIXPANEL_USERNAME")?,
            secret: required(&lookup, "MIXPANEL_SECRET")?,
            project_id: required(&lookup, "MIXPANEL_PROJECT_TOKEN")?,
            api_url: optional(&lookup, "MIXPANEL_API_URL")
                .unwrap_or_else(|| DEFAULT_INSIGHTS_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            filters,
        };

        Ok(Self {
            analytics,
            team_name: optional(&lookup, "REPORT_TEAM_NAME")
                .unwrap_or_else(|| DEFAULT_TEAM_NAME.to_string()),
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sender = required(&lookup, "GMAIL_USER")?;
        let app_password = required(&lookup, "GMAIL_APP_PASSWORD")?;
        let recipients = split_recipients(&required(&lookup, "EMAIL_TO")?);
        if recipients.is_empty() {
            return Err(ConfigError::Invalid {
                name: "EMAIL_TO",
                reason: "no addresses in list".to_string(),
            });
        }

        let smtp_port = match optional(&lookup, "SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "SMTP_PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            sender,
            app_password,
            recipients,
            smtp_host: optional(&lookup, "SMTP_HOST")
                .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
        })
    }
}

pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(String::from)
        .collect()
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
