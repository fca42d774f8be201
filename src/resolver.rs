//! Wall-clock slot arithmetic: rounding to the 30-minute grid, formatting
//! schedule labels, and scanning a booked run for its end.

use crate::models::{Schedule, SlotStatus};
use chrono::{Duration, NaiveDateTime, Timelike};

/// Schedule slots are half an hour wide.
const SLOT_MINUTES: i64 = 30;
/// Bound on the booked-until walk: a full day of slots. The sheet data is
/// finite in practice, but a solid run of BOOKED cells must not loop the
/// scan forever.
const MAX_SCAN_STEPS: usize = 48;

/// A slot's lookup key pair in the schedule's labeling convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRef {
    pub time_label: String,
    pub date_label: String,
}

impl SlotRef {
    fn at(t: NaiveDateTime) -> Self {
        Self {
            time_label: time_label(t),
            date_label: date_label(t),
        }
    }
}

/// Outcome of a current-slot lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotResolution {
    pub slot: SlotRef,
    pub status: SlotStatus,
    /// Boundary of the first free slot after a booked run; present only when
    /// `status` is `Booked`.
    pub booked_until: Option<SlotRef>,
}

/// Rounds down to the enclosing 30-minute slot boundary.
pub fn floor_to_slot(now: NaiveDateTime) -> NaiveDateTime {
    let minute = if now.minute() < 30 { 0 } else { 30 };
    now.date().and_hms_opt(now.hour(), minute, 0).unwrap()
}

/// Formats a time the way the sheet labels its rows: 12-hour clock, no
/// leading zero, lowercase am/pm ("8:30 am").
pub fn time_label(t: NaiveDateTime) -> String {
    t.format("%-I:%M %P").to_string()
}

/// Formats a date the way the sheet labels its columns: no leading zeros
/// ("9/18/2025").
pub fn date_label(t: NaiveDateTime) -> String {
    t.format("%-m/%-d/%Y").to_string()
}

/// Resolves the slot containing `now` against the schedule.
///
/// A slot the schedule does not mention is free. For a booked slot the walk
/// advances in real 30-minute timestamp steps, re-deriving both labels each
/// time, so a run crossing midnight lands on the next day's date column
/// instead of wrapping within the same one.
pub fn resolve_current_status(now: NaiveDateTime, schedule: &Schedule) -> SlotResolution {
    let slot_start = floor_to_slot(now);
    let slot = SlotRef::at(slot_start);
    let status = schedule.status(&slot.time_label, &slot.date_label);
    if !status.is_booked() {
        return SlotResolution {
            slot,
            status,
            booked_until: None,
        };
    }

    let mut cursor = slot_start;
    for _ in 0..MAX_SCAN_STEPS {
        cursor += Duration::minutes(SLOT_MINUTES);
        let next = SlotRef::at(cursor);
        if !schedule.status(&next.time_label, &next.date_label).is_booked() {
            return SlotResolution {
                slot,
                status,
                booked_until: Some(next),
            };
        }
    }

    // A solid day of BOOKED cells; report the cap as the boundary.
    SlotResolution {
        slot,
        status,
        booked_until: Some(SlotRef::at(cursor)),
    }
}
