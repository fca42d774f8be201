use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{fs, path::Path};

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_data_file() -> String {
    "data.json".to_string()
}

const fn default_cache_ttl() -> u64 {
    300
}

/// Late-evening nag, midnight day-roll notice, morning nag.
fn default_reminders() -> Vec<ReminderConfig> {
    vec![
        ReminderConfig {
            hour: 23,
            minute: 3,
            only_unbooked: true,
            with_instructions: true,
        },
        ReminderConfig {
            hour: 0,
            minute: 0,
            only_unbooked: false,
            with_instructions: false,
        },
        ReminderConfig {
            hour: 9,
            minute: 0,
            only_unbooked: true,
            with_instructions: false,
        },
    ]
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    /// Google Sheets document id.
    pub spreadsheet_id: String,
    /// Worksheet title holding the schedule grid.
    pub schedule_sheet: String,
    /// Worksheet title holding the booker roster.
    pub bookers_sheet: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_reminders")]
    pub reminders: Vec<ReminderConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ReminderConfig {
    pub hour: u32,
    pub minute: u32,
    /// Skip users whose slot is already marked booked.
    #[serde(default)]
    pub only_unbooked: bool,
    /// Append the how-to-book note to the message.
    #[serde(default)]
    pub with_instructions: bool,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path_ref, e)))?;
    let app_config: AppConfig = toml::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "Failed to parse TOML from config file {:?}: {}",
            path_ref, e
        ))
    })?;
    validate(&app_config)?;
    Ok(app_config)
}

fn validate(config: &AppConfig) -> Result<()> {
    for reminder in &config.reminders {
        if reminder.hour > 23 || reminder.minute > 59 {
            return Err(Error::Config(format!(
                "Invalid reminder time {:02}:{:02}",
                reminder.hour, reminder.minute
            )));
        }
    }
    Ok(())
}

/// Loads the configuration from `ROOMKEEPER_CONFIG`, or `config.toml` next to
/// the binary when unset.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path =
        std::env::var("ROOMKEEPER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
