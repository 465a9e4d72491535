//! Read-side operations on history series: range filtering, latest point,
//! interpolation for chart markers and growth summaries.

use chrono::NaiveDate;
use serde::Serialize;

use super::{codec, HistoryPoint, HistorySeries};

/// Change between the first and last point of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Growth {
    pub absolute: i64,
    /// Percent change relative to the first point; 0 when the first count is 0
    pub percent: f64,
}

impl HistorySeries {
    /// Points with `start <= date <= end`; a missing bound is open
    pub fn range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<HistoryPoint> {
        self.points()
            .iter()
            .filter(|p| start.map_or(true, |s| p.date >= s))
            .filter(|p| end.map_or(true, |e| p.date <= e))
            .copied()
            .collect()
    }

    /// Point with the greatest date
    pub fn latest(&self) -> Option<HistoryPoint> {
        self.points().iter().max_by_key(|p| p.date).copied()
    }

    /// Estimated count on `date`.
    ///
    /// Clamps to the first/last count outside the recorded range and
    /// interpolates linearly (by day) between the surrounding points inside it.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let points = self.points();
        let first = points.first()?;
        let last = points.last()?;

        if date <= first.date {
            return Some(first.count as f64);
        }
        if date >= last.date {
            return Some(last.count as f64);
        }

        // first.date < date < last.date, so both neighbours exist
        let upper_idx = points.partition_point(|p| p.date <= date);
        let lower = points[upper_idx - 1];
        if lower.date == date {
            return Some(lower.count as f64);
        }
        let upper = points[upper_idx];

        let span = (upper.date - lower.date).num_days() as f64;
        let offset = (date - lower.date).num_days() as f64;
        let ratio = offset / span;
        Some(lower.count as f64 + ratio * (upper.count as f64 - lower.count as f64))
    }

    /// Growth from the first to the last point; `None` below two points
    pub fn growth(&self) -> Option<Growth> {
        let points = self.points();
        if points.len() < 2 {
            return None;
        }
        let first = points[0].count;
        let last = points[points.len() - 1].count;
        let absolute = last as i64 - first as i64;
        let percent = if first > 0 {
            absolute as f64 / first as f64 * 100.0
        } else {
            0.0
        };
        Some(Growth { absolute, percent })
    }
}

/// Range-filter a stored blob
pub fn points_in_range(
    blob: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<HistoryPoint> {
    codec::decode(blob).range(start, end)
}

/// Most recent point of a stored blob
pub fn latest_point(blob: Option<&str>) -> Option<HistoryPoint> {
    codec::decode(blob).latest()
}
