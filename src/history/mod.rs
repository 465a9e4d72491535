//! Date-keyed metric history
//!
//! Every tracked metric (subscribers, views, likes, comments) keeps one
//! snapshot per calendar day. A [`HistorySeries`] upholds two invariants after
//! every mutation: at most one point per date, and points ordered ascending by
//! date. The series is persisted as a text blob (see [`codec`]); a blob that
//! is missing or cannot be decoded is an empty series, never an error.
//!
//! Same-day updates overwrite the day's count, so re-running a fetch on the
//! same day is idempotent on the series length and the last fetched value wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::datetime::calendar_date;
use crate::utils::time::CalendarZone;

pub mod codec;
pub mod query;

pub use query::{latest_point, points_in_range, Growth};

/// A single daily snapshot of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub count: u64,
}

impl HistoryPoint {
    pub fn new(date: NaiveDate, count: u64) -> Self {
        Self { date, count }
    }
}

/// Ordered, date-deduplicated series of [`HistoryPoint`]s
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistorySeries {
    points: Vec<HistoryPoint>,
}

impl HistorySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from points in any order.
    ///
    /// When a date appears more than once the later occurrence wins.
    pub fn from_points(points: impl IntoIterator<Item = HistoryPoint>) -> Self {
        let mut series = Self::new();
        for point in points {
            series.record(point.date, point.count);
        }
        series
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<HistoryPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Count recorded for `date`, if any
    pub fn get(&self, date: NaiveDate) -> Option<u64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].count)
    }

    /// Insert or overwrite the point for `date`
    pub fn record(&mut self, date: NaiveDate, count: u64) {
        match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => self.points[idx].count = count,
            Err(idx) => self.points.insert(idx, HistoryPoint::new(date, count)),
        }
    }
}

/// Applies fetched counts to stored history blobs.
///
/// The recorder owns the calendar zone used when no explicit date is given,
/// so every write in one process agrees on what "today" is.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryRecorder {
    zone: CalendarZone,
}

impl HistoryRecorder {
    pub fn new(zone: CalendarZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> CalendarZone {
        self.zone
    }

    pub fn today(&self) -> NaiveDate {
        self.zone.today()
    }

    /// Merge `count` into the stored series for `date` (today when `None`)
    /// and return the re-encoded blob.
    pub fn add_point(
        &self,
        existing: Option<&str>,
        count: u64,
        date: Option<NaiveDate>,
    ) -> Result<String, serde_json::Error> {
        let date = date.unwrap_or_else(|| self.today());
        let mut series = codec::decode(existing);
        series.record(date, count);
        codec::encode(&series)
    }

    /// Return `existing` untouched when it already holds points, otherwise a
    /// fresh series seeded with today's `current` value.
    pub fn initialize_if_empty(
        &self,
        current: u64,
        existing: Option<&str>,
    ) -> Result<String, serde_json::Error> {
        if let Some(blob) = existing {
            if !codec::decode(Some(blob)).is_empty() {
                return Ok(blob.to_string());
            }
        }

        let mut series = HistorySeries::new();
        series.record(self.today(), current);
        codec::encode(&series)
    }
}

#[cfg(test)]
pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
