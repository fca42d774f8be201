//! Google Sheets access: fetching the schedule and booker worksheets and
//! parsing their raw cell grids.
//!
//! The worksheet layout is fixed by the sheet the library staff maintain:
//! a banner occupies the top of the schedule tab, the date header sits at a
//! known row, and the time rows follow until the first blank time label.

use crate::cache::ScheduleSource;
use crate::errors::{Error, Result};
use crate::models::{BookerRow, Schedule, ScheduleRow, SlotStatus};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Row index of the date header in the schedule worksheet.
const DATE_HEADER_ROW: usize = 5;
/// First time row, immediately below the header.
const FIRST_TIME_ROW: usize = 6;
/// Column holding the time labels.
const TIME_COL: usize = 1;
/// First date column; up to [`DATE_COUNT`] date labels follow.
const DATE_COL: usize = 2;
/// One date column per day of the week.
const DATE_COUNT: usize = 7;
/// The booker roster is a fixed window below its header row.
const BOOKERS_FIRST_ROW: usize = 1;
const BOOKERS_ROWS: usize = 8;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// `values.get` response payload; only the cell grid matters.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Read-only client for the two worksheets the bot cares about.
pub struct SheetsClient {
    http: reqwest::Client,
    account: CustomServiceAccount,
    spreadsheet_id: String,
    schedule_sheet: String,
    bookers_sheet: String,
}

impl SheetsClient {
    pub fn new(
        credentials_path: impl AsRef<Path>,
        spreadsheet_id: impl Into<String>,
        schedule_sheet: impl Into<String>,
        bookers_sheet: impl Into<String>,
    ) -> Result<Self> {
        let account = CustomServiceAccount::from_file(credentials_path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to load service account credentials: {}",
                e
            ))
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            account,
            spreadsheet_id: spreadsheet_id.into(),
            schedule_sheet: schedule_sheet.into(),
            bookers_sheet: bookers_sheet.into(),
        })
    }

    /// Fetches the full value grid of one worksheet, formatted as displayed
    /// in the sheet (so date and time labels keep their cell formatting).
    async fn fetch_grid(&self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        let token = self
            .account
            .token(&[SHEETS_SCOPE])
            .await
            .map_err(|e| Error::Fetch(format!("Failed to obtain Sheets access token: {}", e)))?;

        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            self.spreadsheet_id, worksheet
        );
        let response = self
            .http
            .get(&url)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")])
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Sheets request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!(
                "Sheets API returned {} for worksheet '{}'",
                status, worksheet
            )));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("Malformed Sheets response: {}", e)))?;
        debug!(worksheet, rows = range.values.len(), "Fetched worksheet grid");
        Ok(range.values)
    }
}

impl ScheduleSource for SheetsClient {
    async fn fetch_schedule(&self) -> Result<Schedule> {
        let grid = self.fetch_grid(&self.schedule_sheet).await?;
        Ok(parse_schedule(&grid))
    }

    async fn fetch_bookers(&self) -> Result<Vec<BookerRow>> {
        let grid = self.fetch_grid(&self.bookers_sheet).await?;
        Ok(parse_bookers(&grid))
    }
}

/// Parses the schedule worksheet grid.
///
/// The date header supplies the columns; every time row below it is zipped
/// against those labels so each row ends up with exactly the header's dates.
/// Row iteration stops at the first blank time label, which is how the sheet
/// marks the end of the table. The API omits trailing empty cells, so short
/// rows read as NOT BOOKED.
pub(crate) fn parse_schedule(grid: &[Vec<String>]) -> Schedule {
    let empty_row = Vec::new();
    let header = grid.get(DATE_HEADER_ROW).unwrap_or(&empty_row);
    let dates: Vec<String> = header
        .iter()
        .skip(DATE_COL)
        .take(DATE_COUNT)
        .cloned()
        .collect();

    let mut rows = Vec::new();
    for row in grid.iter().skip(FIRST_TIME_ROW) {
        let time = row.get(TIME_COL).map(String::as_str).unwrap_or("");
        if time.is_empty() {
            break;
        }
        let cells = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let cell = row.get(DATE_COL + i).map(String::as_str).unwrap_or("");
                (date.clone(), SlotStatus::from_cell(cell))
            })
            .collect();
        rows.push(ScheduleRow {
            time: time.to_string(),
            cells,
        });
    }

    Schedule { dates, rows }
}

/// Parses the fixed booker window: first two columns of each row are
/// `(time label, name)`. No sentinel here; the window size is fixed and
/// short rows pad with blanks.
pub(crate) fn parse_bookers(grid: &[Vec<String>]) -> Vec<BookerRow> {
    grid.iter()
        .skip(BOOKERS_FIRST_ROW)
        .take(BOOKERS_ROWS)
        .map(|row| BookerRow {
            time: row.first().cloned().unwrap_or_default(),
            name: row.get(1).cloned().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    fn sample_schedule_grid() -> Vec<Vec<String>> {
        let mut g: Vec<Vec<String>> = vec![Vec::new(); DATE_HEADER_ROW];
        g.extend(grid(&[
            // Date header: two leading layout columns, then the week.
            &[
                "", "", "9/15/2025", "9/16/2025", "9/17/2025", "9/18/2025", "9/19/2025",
                "9/20/2025", "9/21/2025",
            ],
            &["", "8:00 am", "", "BOOKED", "", "BOOKED", "", "", ""],
            &["", "8:30 am", "", "", "Alice R.", "BOOKED"],
            &["", "9:00 am", "", "", "", "NOT BOOKED", "", "", ""],
            // Blank time label ends the table; rows below are footer noise.
            &["", "", "", "", "", "BOOKED", "", "", ""],
            &["", "10:00 am", "", "", "", "BOOKED", "", "", ""],
        ]));
        g
    }

    #[test]
    fn test_parse_schedule_reads_header_dates() {
        let schedule = parse_schedule(&sample_schedule_grid());
        assert_eq!(schedule.dates.len(), 7);
        assert_eq!(schedule.dates[0], "9/15/2025");
        assert_eq!(schedule.dates[6], "9/21/2025");
    }

    #[test]
    fn test_parse_schedule_stops_at_blank_time_label() {
        let schedule = parse_schedule(&sample_schedule_grid());
        let times: Vec<&str> = schedule.rows.iter().map(|r| r.time.as_str()).collect();
        assert_eq!(times, vec!["8:00 am", "8:30 am", "9:00 am"]);
    }

    #[test]
    fn test_every_row_carries_exactly_the_header_dates() {
        let schedule = parse_schedule(&sample_schedule_grid());
        let header: HashSet<&str> = schedule.dates.iter().map(String::as_str).collect();
        for row in &schedule.rows {
            let keys: HashSet<&str> = row.cells.keys().map(String::as_str).collect();
            assert_eq!(keys, header, "row '{}' diverges from header", row.time);
        }
    }

    #[test]
    fn test_empty_and_short_cells_read_as_not_booked() {
        let schedule = parse_schedule(&sample_schedule_grid());
        assert_eq!(
            schedule.status("8:00 am", "9/15/2025"),
            SlotStatus::NotBooked
        );
        // The "8:30 am" source row is shorter than the header.
        assert_eq!(
            schedule.status("8:30 am", "9/21/2025"),
            SlotStatus::NotBooked
        );
    }

    #[test]
    fn test_cell_text_is_preserved_verbatim() {
        let schedule = parse_schedule(&sample_schedule_grid());
        assert_eq!(
            schedule.status("8:00 am", "9/16/2025"),
            SlotStatus::Booked
        );
        assert_eq!(
            schedule.status("8:30 am", "9/17/2025"),
            SlotStatus::Occupied("Alice R.".to_string())
        );
        assert_eq!(
            schedule.status("9:00 am", "9/18/2025"),
            SlotStatus::NotBooked
        );
    }

    #[test]
    fn test_parse_schedule_handles_empty_grid() {
        let schedule = parse_schedule(&[]);
        assert!(schedule.dates.is_empty());
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_parse_bookers_takes_fixed_window() {
        let mut rows: Vec<Vec<String>> = vec![vec!["Time".to_string(), "Name".to_string()]];
        for i in 0..10 {
            rows.push(vec![format!("slot {}", i), format!("person {}", i)]);
        }
        let bookers = parse_bookers(&rows);
        assert_eq!(bookers.len(), BOOKERS_ROWS);
        assert_eq!(bookers[0].time, "slot 0");
        assert_eq!(bookers[7].name, "person 7");
    }

    #[test]
    fn test_parse_bookers_pads_short_rows() {
        let bookers = parse_bookers(&grid(&[
            &["Time", "Name"],
            &["8:00 am", "Bob"],
            &["8:30 am"],
            &[],
        ]));
        assert_eq!(bookers.len(), 3);
        assert!(bookers[0].is_assigned());
        assert_eq!(bookers[1].time, "8:30 am");
        assert!(!bookers[1].is_assigned());
        assert_eq!(bookers[2], BookerRow {
            time: String::new(),
            name: String::new(),
        });
    }
}
