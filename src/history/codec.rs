//! Stored form of a history series
//!
//! Current format is a versioned envelope:
//!
//! ```json
//! {"version":1,"points":[{"date":"2025-01-01","count":150}]}
//! ```
//!
//! Rows written before the envelope existed hold a bare list of points; the
//! decoder accepts both. Decoding never fails: absent, empty or malformed
//! blobs decode to an empty series, malformed ones with a warning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{HistoryPoint, HistorySeries};

/// Version written by [`encode`]
pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    points: &'a [HistoryPoint],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    points: Vec<HistoryPoint>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Envelope(Envelope),
    Legacy(Vec<HistoryPoint>),
}

/// Decode a stored blob into a normalised series
pub fn decode(blob: Option<&str>) -> HistorySeries {
    let Some(blob) = blob.map(str::trim).filter(|b| !b.is_empty()) else {
        return HistorySeries::new();
    };

    match serde_json::from_str::<StoredHistory>(blob) {
        Ok(StoredHistory::Envelope(envelope)) if envelope.version == CURRENT_VERSION => {
            HistorySeries::from_points(envelope.points)
        }
        Ok(StoredHistory::Envelope(envelope)) => {
            warn!(
                "Unsupported history format version {}, treating series as empty",
                envelope.version
            );
            HistorySeries::new()
        }
        Ok(StoredHistory::Legacy(points)) => HistorySeries::from_points(points),
        Err(e) => {
            warn!("Failed to parse history JSON: {}", e);
            HistorySeries::new()
        }
    }
}

/// Encode a series in the current envelope format
pub fn encode(series: &HistorySeries) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        version: CURRENT_VERSION,
        points: series.points(),
    })
}
