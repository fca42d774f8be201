use crate::bot::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;
use tracing::{info, instrument};

/// Assign a study-room slot to a user.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn assignslot(
    ctx: Context<'_>,
    #[description = "User to assign the slot to"] user: serenity::User,
    #[description = "Slot time label, e.g. '8:30 am'"] time: String,
) -> Result<(), Error> {
    info!(
        "Assignslot command received from user: {} for {} at '{}'",
        ctx.author().name,
        user.name,
        time
    );

    let time = time.trim();
    if time.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("The slot time must not be empty.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.data().store.assign_slot(&user.id.to_string(), time)?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "Assigned the {} slot to {}. It is not marked as booked yet.",
                time,
                user.mention()
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Mark a user's assigned slot as booked.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn markbooked(
    ctx: Context<'_>,
    #[description = "User whose slot is now booked"] user: serenity::User,
) -> Result<(), Error> {
    info!(
        "Markbooked command received from user: {} for {}",
        ctx.author().name,
        user.name
    );

    let marked = ctx.data().store.mark_booked(&user.id.to_string())?;
    let reply = if marked {
        format!("Marked {}'s slot as booked. ✅", user.name)
    } else {
        format!(
            "{} has no assigned slot yet. Use /assignslot first.",
            user.name
        )
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

/// Show every user's assigned slot and booking state.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn showassignments(ctx: Context<'_>) -> Result<(), Error> {
    info!(
        "Showassignments command received from user: {}",
        ctx.author().name
    );

    let assignments = ctx.data().store.assignments();
    if assignments.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("No slots have been assigned yet.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let mut entries: Vec<_> = assignments.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let description = entries
        .iter()
        .map(|(user_id, assignment)| {
            let state = if assignment.booked {
                "✅ booked"
            } else {
                "❌ not booked"
            };
            format!("<@{}> — {} ({})", user_id, assignment.time, state)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::default()
        .title("**Slot Assignments**")
        .description(description)
        .color(0x3498DB)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Roomkeeper | {} assignments",
            entries.len()
        )));

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
