//! Bulk CSV ingestion of interaction events.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::events::RawEvent;
use crate::models::InteractionEvent;

#[derive(Debug, Deserialize)]
struct CsvRow {
    visitor_id: Option<String>,
    property_id: Option<String>,
    event_type: Option<String>,
    detail: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

/// A CSV row that was skipped. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportBatch {
    pub events: Vec<InteractionEvent>,
    pub rejected: Vec<RejectedRow>,
}

/// Reads and validates every row. Rows that fail to parse or validate are
/// collected in `rejected` and never reach `events`.
pub fn read_events<R: Read>(input: R, now: DateTime<Utc>) -> ImportBatch {
    let mut reader = csv::Reader::from_reader(input);
    let mut batch = ImportBatch::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                batch.rejected.push(RejectedRow {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let raw = RawEvent {
            visitor_id: row.visitor_id,
            property_id: row.property_id,
            event_type: row.event_type,
            detail: row.detail,
            metadata: None,
            created_at: row.created_at,
        };

        match raw.validate(now) {
            Ok(event) => batch.events.push(event),
            Err(err) => batch.rejected.push(RejectedRow {
                line,
                reason: err.to_string(),
            }),
        }
    }

    batch
}
