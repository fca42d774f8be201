//! Daily reminder scheduler.
//!
//! One background task: sleep until the next configured wall-clock time,
//! deliver a batch of DMs, repeat. Delivery failures are per-recipient; one
//! closed DM channel never aborts the rest of the batch. The task shares the
//! assignment store with the command handlers, unsynchronized — last write
//! wins, same as everywhere else the store is touched.

use crate::config::{AppConfig, ReminderConfig};
use crate::errors::{Error, Result};
use crate::models::Assignment;
use crate::store::{AssignmentStore, Assignments};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{info, warn};

/// Note appended when a reminder is configured `with_instructions`.
const BOOKING_INSTRUCTIONS: &str =
    "Book the room through the library portal, then run /markbooked so the bot stops nagging you.";

/// Next wall-clock occurrence of `hour:minute` strictly after `now`.
fn next_occurrence(now: NaiveDateTime, hour: u32, minute: u32) -> NaiveDateTime {
    let today = now.date().and_hms_opt(hour, minute, 0).unwrap();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Earliest upcoming reminder across the configured times.
fn next_reminder(
    now: NaiveDateTime,
    reminders: &[ReminderConfig],
) -> Option<(NaiveDateTime, ReminderConfig)> {
    reminders
        .iter()
        .map(|reminder| {
            (
                next_occurrence(now, reminder.hour, reminder.minute),
                reminder.clone(),
            )
        })
        .min_by_key(|(at, _)| *at)
}

/// Users a reminder batch should message, in stable order.
fn recipients(assignments: &Assignments, only_unbooked: bool) -> Vec<(String, Assignment)> {
    let mut selected: Vec<(String, Assignment)> = assignments
        .iter()
        .filter(|(_, assignment)| !only_unbooked || !assignment.booked)
        .map(|(user_id, assignment)| (user_id.clone(), assignment.clone()))
        .collect();
    selected.sort_by(|a, b| a.0.cmp(&b.0));
    selected
}

fn reminder_message(assignment: &Assignment, with_instructions: bool) -> String {
    let mut message = format!("Reminder: your study room slot is {}.", assignment.time);
    if !assignment.booked {
        message.push_str(" It is not marked as booked yet.");
    }
    if with_instructions {
        message.push('\n');
        message.push_str(BOOKING_INSTRUCTIONS);
    }
    message
}

pub async fn run_reminder_loop(
    http: Arc<serenity::Http>,
    store: AssignmentStore,
    config: Arc<AppConfig>,
) {
    if config.reminders.is_empty() {
        info!("No reminder times configured; reminder loop not started");
        return;
    }
    loop {
        let now = Local::now().naive_local();
        let Some((fire_at, reminder)) = next_reminder(now, &config.reminders) else {
            return;
        };
        let wait = (fire_at - now).to_std().unwrap_or_default();
        info!("Next reminder at {} (in {:?})", fire_at, wait);
        tokio::time::sleep(wait).await;
        deliver_batch(&http, &store, &reminder).await;
    }
}

async fn deliver_batch(
    http: &Arc<serenity::Http>,
    store: &AssignmentStore,
    reminder: &ReminderConfig,
) {
    let assignments = store.assignments();
    let batch = recipients(&assignments, reminder.only_unbooked);
    info!(
        total = assignments.len(),
        notifying = batch.len(),
        "Delivering reminder batch"
    );
    for (user_id, assignment) in batch {
        if let Err(e) =
            send_reminder(http, &user_id, &assignment, reminder.with_instructions).await
        {
            warn!("Failed to deliver reminder to {}: {}", user_id, e);
        }
    }
}

async fn send_reminder(
    http: &Arc<serenity::Http>,
    user_id: &str,
    assignment: &Assignment,
    with_instructions: bool,
) -> Result<()> {
    let raw: u64 = user_id
        .parse()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| {
            Error::Delivery(format!("'{}' is not a valid Discord user id", user_id))
        })?;
    let channel = serenity::UserId::new(raw)
        .create_dm_channel(http)
        .await
        .map_err(|e| Error::Delivery(format!("Could not open DM channel: {}", e)))?;
    channel
        .send_message(
            http,
            serenity::CreateMessage::new().content(reminder_message(assignment, with_instructions)),
        )
        .await
        .map_err(|e| Error::Delivery(format!("Could not send DM: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 18)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn reminder(hour: u32, minute: u32) -> ReminderConfig {
        ReminderConfig {
            hour,
            minute,
            only_unbooked: false,
            with_instructions: false,
        }
    }

    #[test]
    fn test_next_occurrence_later_today() {
        assert_eq!(next_occurrence(at(8, 0), 9, 0), at(9, 0));
    }

    #[test]
    fn test_next_occurrence_rolls_to_tomorrow() {
        let next = next_occurrence(at(10, 0), 9, 0);
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2025, 9, 19)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_next_occurrence_at_the_exact_minute_schedules_tomorrow() {
        // Firing exactly on the mark must not re-fire the same minute.
        let next = next_occurrence(at(9, 0), 9, 0);
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2025, 9, 19)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_next_reminder_picks_the_earliest_across_midnight() {
        let reminders = vec![reminder(23, 3), reminder(0, 0), reminder(9, 0)];
        let (fire_at, _) = next_reminder(at(23, 30), &reminders).unwrap();
        assert_eq!(
            fire_at,
            NaiveDate::from_ymd_opt(2025, 9, 19)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_recipients_filters_booked_users_when_asked() {
        let mut assignments = Assignments::new();
        assignments.insert(
            "1".to_string(),
            Assignment {
                time: "8:00 am".to_string(),
                booked: true,
            },
        );
        assignments.insert(
            "2".to_string(),
            Assignment {
                time: "8:30 am".to_string(),
                booked: false,
            },
        );

        let everyone = recipients(&assignments, false);
        assert_eq!(everyone.len(), 2);

        let unbooked = recipients(&assignments, true);
        assert_eq!(unbooked.len(), 1);
        assert_eq!(unbooked[0].0, "2");
    }

    #[test]
    fn test_reminder_message_flags_unbooked_and_appends_instructions() {
        let unbooked = Assignment {
            time: "8:30 am".to_string(),
            booked: false,
        };
        let booked = Assignment {
            time: "8:30 am".to_string(),
            booked: true,
        };

        let plain = reminder_message(&booked, false);
        assert_eq!(plain, "Reminder: your study room slot is 8:30 am.");

        let nagging = reminder_message(&unbooked, true);
        assert!(nagging.contains("not marked as booked"));
        assert!(nagging.contains(BOOKING_INSTRUCTIONS));
    }
}
