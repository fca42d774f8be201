mod bot;
mod cache;
mod commands;
mod config;
mod errors;
mod models;
mod reminders;
mod resolver;
mod sheets;
mod store;

use crate::cache::ScheduleCache;
use crate::errors::{Error, Result};
use crate::sheets::SheetsClient;
use crate::store::AssignmentStore;
use dotenvy::dotenv;
use std::{env, sync::Arc, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Make it non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;
    info!("Successfully processed application configuration.");

    // 4. Open the assignment store (creates an empty data file on first run)
    let store = AssignmentStore::new(&app_config.data_file)
        .inspect(|_| info!("Assignment store ready at {}", app_config.data_file))
        .inspect_err(|e| error!("Failed to open assignment store: {}", e))?;

    // 5. Set up the Sheets client and the schedule cache in front of it
    let sheets = SheetsClient::new(
        &app_config.credentials_path,
        app_config.spreadsheet_id.clone(),
        app_config.schedule_sheet.clone(),
        app_config.bookers_sheet.clone(),
    )
    .inspect(|_| info!("Sheets client initialized."))
    .inspect_err(|e| error!("Failed to set up Sheets client: {}", e))?;
    let cache = Arc::new(ScheduleCache::new(
        sheets,
        Duration::from_secs(app_config.cache_ttl_secs),
    ));

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let arc_app_config = Arc::new(app_config);
    bot::run_bot(token, Arc::clone(&arc_app_config), cache, store)
        .await
        .map_err(Error::from)?;

    Ok(())
}
