use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Occupancy state of a single schedule cell.
///
/// The sheet convention is literal: an empty cell means the slot is free,
/// the text `BOOKED` means booked, and any other text (an occupant name,
/// a maintenance note) is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Booked,
    NotBooked,
    Occupied(String),
}

impl SlotStatus {
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            "" => SlotStatus::NotBooked,
            "BOOKED" => SlotStatus::Booked,
            "NOT BOOKED" => SlotStatus::NotBooked,
            other => SlotStatus::Occupied(other.to_string()),
        }
    }

    /// Only the literal BOOKED status counts as booked; occupant text does
    /// not extend a booked run.
    pub fn is_booked(&self) -> bool {
        matches!(self, SlotStatus::Booked)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Booked => write!(f, "BOOKED"),
            SlotStatus::NotBooked => write!(f, "NOT BOOKED"),
            SlotStatus::Occupied(text) => write!(f, "{}", text),
        }
    }
}

/// One time row of the schedule grid: a time label plus one status per date
/// column from the header row.
#[derive(Debug, Clone)]
pub struct ScheduleRow {
    pub time: String,
    pub cells: HashMap<String, SlotStatus>,
}

/// Parsed schedule worksheet: the date header plus time rows in sheet order.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub dates: Vec<String>,
    pub rows: Vec<ScheduleRow>,
}

impl Schedule {
    /// Looks up the status for a slot. Missing rows or columns read as free
    /// slots, not as errors.
    pub fn status(&self, time_label: &str, date_label: &str) -> SlotStatus {
        self.rows
            .iter()
            .find(|row| row.time == time_label)
            .and_then(|row| row.cells.get(date_label))
            .cloned()
            .unwrap_or(SlotStatus::NotBooked)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of the booker roster sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookerRow {
    pub time: String,
    pub name: String,
}

impl BookerRow {
    /// A slot counts as assigned only when a name is actually written in,
    /// not just whitespace.
    pub fn is_assigned(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A user's slot assignment as stored in the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub time: String,
    pub booked: bool,
}
