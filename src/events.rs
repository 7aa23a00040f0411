//! Event kinds, the point table and validation of incoming event payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngagementError;
use crate::models::InteractionEvent;

/// Scored interaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    CheckIn,
    Favorite,
    Share,
    Inquiry,
    TourRequest,
    DocumentDownload,
}

/// Points awarded per scored event kind, in `EventKind::ALL` order.
pub const POINT_TABLE: [(EventKind, u32); 7] = [
    (EventKind::View, EventKind::View.points()),
    (EventKind::CheckIn, EventKind::CheckIn.points()),
    (EventKind::Favorite, EventKind::Favorite.points()),
    (EventKind::Share, EventKind::Share.points()),
    (EventKind::Inquiry, EventKind::Inquiry.points()),
    (EventKind::TourRequest, EventKind::TourRequest.points()),
    (EventKind::DocumentDownload, EventKind::DocumentDownload.points()),
];

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::View,
        EventKind::CheckIn,
        EventKind::Favorite,
        EventKind::Share,
        EventKind::Inquiry,
        EventKind::TourRequest,
        EventKind::DocumentDownload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::CheckIn => "check_in",
            EventKind::Favorite => "favorite",
            EventKind::Share => "share",
            EventKind::Inquiry => "inquiry",
            EventKind::TourRequest => "tour_request",
            EventKind::DocumentDownload => "document_download",
        }
    }

    pub const fn points(&self) -> u32 {
        match self {
            EventKind::View => 1,
            EventKind::CheckIn => 10,
            EventKind::Favorite => 5,
            EventKind::Share => 8,
            EventKind::Inquiry => 15,
            EventKind::TourRequest => 20,
            EventKind::DocumentDownload => 3,
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(EventKind::as_str).collect()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EngagementError::InvalidEventKind {
                kind: s.to_string(),
                allowed: Self::names(),
            })
    }
}

/// Point value for a raw `event_type` string.
pub fn classify(kind: &str) -> Result<u32, EngagementError> {
    kind.parse::<EventKind>().map(|kind| kind.points())
}

/// Display-only feed signal kinds.
///
/// Deserialization also accepts the underscore names used by the signal
/// ingestion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "check-in", alias = "check_in")]
    CheckIn,
    #[serde(rename = "feature-discovered", alias = "feature_discovered")]
    FeatureDiscovered,
    #[serde(rename = "referral", alias = "referral_sent")]
    Referral,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [
        SignalKind::CheckIn,
        SignalKind::FeatureDiscovered,
        SignalKind::Referral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::CheckIn => "check-in",
            SignalKind::FeatureDiscovered => "feature-discovered",
            SignalKind::Referral => "referral",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(SignalKind::as_str).collect()
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check-in" | "check_in" => Ok(SignalKind::CheckIn),
            "feature-discovered" | "feature_discovered" => Ok(SignalKind::FeatureDiscovered),
            "referral" | "referral_sent" => Ok(SignalKind::Referral),
            other => Err(EngagementError::UnknownSignalType {
                kind: other.to_string(),
                allowed: Self::names(),
            }),
        }
    }
}

/// Event payload as received from a client, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RawEvent {
    /// Attaches metadata given as JSON text, as passed on the command line.
    pub fn with_metadata_str(mut self, json: &str) -> Result<Self, EngagementError> {
        self.metadata = Some(serde_json::from_str(json)?);
        Ok(self)
    }

    /// Validates the payload. Events without `created_at` are stamped with `now`.
    pub fn validate(self, now: DateTime<Utc>) -> Result<InteractionEvent, EngagementError> {
        let visitor_id = required(self.visitor_id, "visitor_id")?;
        let property_id = required(self.property_id, "property_id")?;
        let event_type = required(self.event_type, "event_type")?;

        let kind = match event_type.parse::<EventKind>() {
            Ok(kind) => kind,
            Err(err) => {
                tracing::debug!(%visitor_id, %property_id, %event_type, "rejected event");
                return Err(err);
            }
        };

        Ok(InteractionEvent {
            visitor_id,
            property_id,
            kind,
            detail: self.detail.filter(|d| !d.trim().is_empty()),
            metadata: self.metadata.filter(|m| !m.is_null()),
            occurred_at: self.created_at.unwrap_or(now),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, EngagementError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(EngagementError::MalformedEvent { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(kind: &str) -> RawEvent {
        RawEvent {
            visitor_id: Some("v-1".to_string()),
            property_id: Some("p-1".to_string()),
            event_type: Some(kind.to_string()),
            ..RawEvent::default()
        }
    }

    #[test]
    fn point_table_matches_kinds() {
        assert_eq!(classify("view").unwrap(), 1);
        assert_eq!(classify("check_in").unwrap(), 10);
        assert_eq!(classify("favorite").unwrap(), 5);
        assert_eq!(classify("share").unwrap(), 8);
        assert_eq!(classify("inquiry").unwrap(), 15);
        assert_eq!(classify("tour_request").unwrap(), 20);
        assert_eq!(classify("document_download").unwrap(), 3);
        assert_eq!(POINT_TABLE.len(), EventKind::ALL.len());
    }

    #[test]
    fn point_table_covers_every_kind_in_order() {
        let kinds: Vec<EventKind> = POINT_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, EventKind::ALL.to_vec());
        for (kind, points) in POINT_TABLE {
            assert_eq!(points, kind.points(), "{kind}");
            assert!(points > 0, "{kind} scores nothing");
        }
    }

    #[test]
    fn metadata_text_is_parsed_at_the_boundary() {
        let event = raw("share")
            .with_metadata_str(r#"{"via":"sms"}"#)
            .unwrap()
            .validate(Utc::now())
            .unwrap();
        assert_eq!(event.metadata.unwrap()["via"], "sms");

        let err = raw("share").with_metadata_str("{via: sms").unwrap_err();
        assert!(matches!(err, EngagementError::Json(_)));
        assert!(err.to_string().starts_with("invalid metadata:"));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn unknown_kind_is_rejected_with_allowed_values() {
        let err = classify("bogus").unwrap_err();
        match err {
            EngagementError::InvalidEventKind { kind, allowed } => {
                assert_eq!(kind, "bogus");
                assert!(allowed.contains(&"tour_request"));
                assert_eq!(allowed.len(), 7);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn signal_kinds_are_not_scored() {
        assert!(classify("check-in").is_err());
        assert!(classify("referral").is_err());
    }

    #[test]
    fn validate_stamps_missing_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();
        let event = raw("favorite").validate(now).unwrap();
        assert_eq!(event.kind, EventKind::Favorite);
        assert_eq!(event.occurred_at, now);
        assert_eq!(event.points(), 5);
    }

    #[test]
    fn validate_reports_missing_fields() {
        let now = Utc::now();
        let mut event = raw("view");
        event.property_id = Some("   ".to_string());
        let err = event.validate(now).unwrap_err();
        assert_eq!(err.field(), Some("property_id"));

        let mut event = raw("view");
        event.visitor_id = None;
        let err = event.validate(now).unwrap_err();
        assert!(matches!(err, EngagementError::MalformedEvent { field: "visitor_id" }));
    }

    #[test]
    fn validate_rejects_unknown_kind() {
        let err = raw("bogus").validate(Utc::now()).unwrap_err();
        assert!(matches!(err, EngagementError::InvalidEventKind { .. }));
        assert!(err.to_string().contains("document_download"));
    }

    #[test]
    fn signal_kind_accepts_ingestion_aliases() {
        assert_eq!("check_in".parse::<SignalKind>().unwrap(), SignalKind::CheckIn);
        assert_eq!("referral_sent".parse::<SignalKind>().unwrap(), SignalKind::Referral);
        let kind: SignalKind = serde_json::from_str("\"feature_discovered\"").unwrap();
        assert_eq!(kind, SignalKind::FeatureDiscovered);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"feature-discovered\"");
        assert!("tour".parse::<SignalKind>().is_err());
    }

    #[test]
    fn raw_event_parses_wire_shape() {
        let json = r#"{"visitor_id":"v-9","property_id":"p-2","event_type":"share","metadata":{"via":"sms"}}"#;
        let raw: RawEvent = serde_json::from_str(json).unwrap();
        let event = raw.validate(Utc::now()).unwrap();
        assert_eq!(event.kind, EventKind::Share);
        assert_eq!(event.metadata.unwrap()["via"], "sms");
    }
}
