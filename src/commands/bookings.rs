use crate::bot::{Context, Error};
use crate::models::SlotStatus;
use crate::resolver;
use chrono::Local;
use poise::serenity_prelude as serenity;
use tracing::{info, instrument, warn};

/// What users see when the sheet cannot be reached; the cause only goes to
/// the logs.
const FETCH_FAILED_REPLY: &str = "Couldn't reach the schedule sheet — try again later.";

/// Show who is responsible for booking each slot.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn bookers(ctx: Context<'_>) -> Result<(), Error> {
    info!("Bookers command received from user: {}", ctx.author().name);
    ctx.defer_ephemeral().await?;

    let bookers = match ctx.data().cache.bookers().await {
        Ok(bookers) => bookers,
        Err(e) => {
            warn!("Bookers fetch failed: {}", e);
            ctx.say(FETCH_FAILED_REPLY).await?;
            return Ok(());
        }
    };

    let description = bookers
        .iter()
        .map(|row| {
            if row.is_assigned() {
                format!("{} — {}", row.time, row.name.trim())
            } else {
                format!("{} — *unassigned*", row.time)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::default()
        .title("**Slot Bookers**")
        .description(description)
        .color(0x3498DB)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Roomkeeper | {} slots",
            bookers.len()
        )));

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Report whether the room is booked right now, and until when.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn bookings(ctx: Context<'_>) -> Result<(), Error> {
    info!("Bookings command received from user: {}", ctx.author().name);
    ctx.defer_ephemeral().await?;

    let schedule = match ctx.data().cache.schedule().await {
        Ok(schedule) => schedule,
        Err(e) => {
            warn!("Schedule fetch failed: {}", e);
            ctx.say(FETCH_FAILED_REPLY).await?;
            return Ok(());
        }
    };

    let now = Local::now().naive_local();
    let resolution = resolver::resolve_current_status(now, &schedule);

    let reply = match resolution.status {
        SlotStatus::Booked => match resolution.booked_until {
            Some(until) => format!(
                "The room is booked for the {} slot on {}, until {} on {}.",
                resolution.slot.time_label,
                resolution.slot.date_label,
                until.time_label,
                until.date_label
            ),
            None => format!(
                "The room is booked for the {} slot on {}.",
                resolution.slot.time_label, resolution.slot.date_label
            ),
        },
        SlotStatus::NotBooked => format!(
            "The room is free for the {} slot on {}.",
            resolution.slot.time_label, resolution.slot.date_label
        ),
        SlotStatus::Occupied(ref text) => format!(
            "The {} slot on {} is marked: {}",
            resolution.slot.time_label, resolution.slot.date_label, text
        ),
    };

    ctx.say(reply).await?;
    Ok(())
}
