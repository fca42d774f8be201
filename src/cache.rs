//! Short-TTL cache in front of the remote schedule source.
//!
//! Both datasets (schedule grid, booker roster) are cached independently,
//! each with its own last-fetch clock. A stale or empty entry triggers a
//! refetch; a failed refetch leaves the entry untouched and surfaces the
//! error — data older than the TTL is never served.

use crate::errors::Result;
use crate::models::{BookerRow, Schedule};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Where the cached tables come from. Implemented by
/// [`SheetsClient`](crate::sheets::SheetsClient), and by counting fakes in
/// tests.
pub trait ScheduleSource: Send + Sync {
    fn fetch_schedule(&self) -> impl Future<Output = Result<Schedule>> + Send;
    fn fetch_bookers(&self) -> impl Future<Output = Result<Vec<BookerRow>>> + Send;
}

struct Slot<T> {
    value: Option<(T, Instant)>,
}

impl<T> Slot<T> {
    const fn empty() -> Self {
        Self { value: None }
    }
}

pub struct ScheduleCache<S> {
    source: S,
    ttl: Duration,
    schedule: Mutex<Slot<Schedule>>,
    bookers: Mutex<Slot<Vec<BookerRow>>>,
}

impl<S: ScheduleSource> ScheduleCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            schedule: Mutex::new(Slot::empty()),
            bookers: Mutex::new(Slot::empty()),
        }
    }

    /// Returns the cached schedule, refetching when the entry is older than
    /// the TTL or empty.
    ///
    /// The slot lock is held across the fetch, so concurrent callers of a
    /// stale entry wait for one shared refresh instead of racing their own
    /// requests at the API.
    pub async fn schedule(&self) -> Result<Schedule> {
        let mut slot = self.schedule.lock().await;
        if let Some((value, fetched_at)) = &slot.value {
            if fetched_at.elapsed() < self.ttl && !value.is_empty() {
                debug!("Serving schedule from cache");
                return Ok(value.clone());
            }
        }
        let fresh = self.source.fetch_schedule().await?;
        info!(
            rows = fresh.rows.len(),
            dates = fresh.dates.len(),
            "Refreshed schedule cache"
        );
        slot.value = Some((fresh.clone(), Instant::now()));
        Ok(fresh)
    }

    /// Returns the cached booker roster; same contract as [`Self::schedule`]
    /// on an independent clock.
    pub async fn bookers(&self) -> Result<Vec<BookerRow>> {
        let mut slot = self.bookers.lock().await;
        if let Some((value, fetched_at)) = &slot.value {
            if fetched_at.elapsed() < self.ttl && !value.is_empty() {
                debug!("Serving bookers from cache");
                return Ok(value.clone());
            }
        }
        let fresh = self.source.fetch_bookers().await?;
        info!(rows = fresh.len(), "Refreshed bookers cache");
        slot.value = Some((fresh.clone(), Instant::now()));
        Ok(fresh)
    }
}
