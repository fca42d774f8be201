use crate::cache::ScheduleCache;
use crate::config::AppConfig;
use crate::sheets::SheetsClient;
use crate::store::AssignmentStore;
use crate::{commands, errors, reminders};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{info, instrument};

// User data, which is stored and accessible in all command invocations
#[allow(dead_code)]
pub struct Data {
    pub app_config: Arc<AppConfig>,
    pub cache: Arc<ScheduleCache<SheetsClient>>,
    pub store: AssignmentStore,
}

// Type alias for the error type Poise will use
pub(crate) type Error = errors::Error;
pub(crate) type Context<'a> = poise::Context<'a, Data, Error>;

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {}", error)).await {
                tracing::error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {}", e)
            }
        }
    }
}

#[instrument(skip(token, app_config, cache, store))]
pub async fn run_bot(
    token: String,
    app_config: Arc<AppConfig>,
    cache: Arc<ScheduleCache<SheetsClient>>,
    store: AssignmentStore,
) -> Result<(), serenity::Error> {
    let reminder_config = Arc::clone(&app_config);
    let reminder_store = store.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::assignslot(),
                commands::markbooked(),
                commands::showassignments(),
                commands::bookers(),
                commands::bookings(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // The reminder loop shares the store with the command
                // handlers; writes race as last-write-wins by design.
                tokio::spawn(reminders::run_reminder_loop(
                    Arc::clone(&ctx.http),
                    reminder_store,
                    reminder_config,
                ));

                Ok(Data {
                    app_config,
                    cache,
                    store,
                })
            })
        })
        .build();

    let intents =
        serenity::GatewayIntents::GUILD_MESSAGES | serenity::GatewayIntents::DIRECT_MESSAGES;

    info!("Setting up Serenity client for Poise framework...");
    let client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await;

    match client {
        Ok(mut c) => {
            info!("Starting bot client...");
            if let Err(why) = c.start().await {
                tracing::error!("Client error: {:?}", why);
                return Err(why);
            }
        }
        Err(e) => {
            tracing::error!("Error creating client: {:?}", e);
            return Err(e);
        }
    }
    Ok(())
}
