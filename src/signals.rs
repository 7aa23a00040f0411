//! Feed descriptions for display-only signals.

use chrono::{DateTime, Utc};

use crate::events::SignalKind;
use crate::models::{Signal, SignalDescription};

pub fn describe(signal: &Signal, now: DateTime<Utc>) -> SignalDescription {
    SignalDescription {
        icon: icon(signal.kind),
        message: message(signal),
        freshness: freshness_label(signal.timestamp, now),
    }
}

pub fn icon(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::CheckIn => "log-in",
        SignalKind::FeatureDiscovered => "compass",
        SignalKind::Referral => "users",
    }
}

pub fn message(signal: &Signal) -> String {
    match signal.kind {
        SignalKind::CheckIn => "checked in to the property".to_string(),
        SignalKind::FeatureDiscovered => {
            format!("completed Feature Discovery: {}", signal.detail)
        }
        SignalKind::Referral => "sent a referral invitation".to_string(),
    }
}

/// Relative age of `timestamp` in whole minutes, hours or days.
pub fn freshness_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 14, 15, 30, 0).unwrap()
    }

    fn signal(kind: SignalKind, detail: &str, age: Duration) -> Signal {
        Signal {
            id: "sig-1".to_string(),
            kind,
            actor_name: "Alexandra Chen".to_string(),
            detail: detail.to_string(),
            timestamp: now() - age,
        }
    }

    #[test]
    fn freshness_labels() {
        let cases = [
            (Duration::seconds(45), "Just now"),
            (Duration::minutes(5), "5m ago"),
            (Duration::minutes(59), "59m ago"),
            (Duration::minutes(60), "1h ago"),
            (Duration::minutes(90), "1h ago"),
            (Duration::minutes(1439), "23h ago"),
            (Duration::minutes(1440), "1d ago"),
            (Duration::hours(50), "2d ago"),
        ];
        for (age, expected) in cases {
            assert_eq!(freshness_label(now() - age, now()), expected, "age {age}");
        }
    }

    #[test]
    fn future_timestamps_read_as_just_now() {
        assert_eq!(freshness_label(now() + Duration::minutes(3), now()), "Just now");
    }

    #[test]
    fn messages_by_kind() {
        let check_in = describe(
            &signal(SignalKind::CheckIn, "", Duration::minutes(2)),
            now(),
        );
        assert_eq!(check_in.message, "checked in to the property");
        assert_eq!(check_in.icon, "log-in");
        assert_eq!(check_in.freshness, "2m ago");

        let found = describe(
            &signal(SignalKind::FeatureDiscovered, "Chef's Kitchen", Duration::hours(3)),
            now(),
        );
        assert_eq!(found.message, "completed Feature Discovery: Chef's Kitchen");
        assert_eq!(found.icon, "compass");
        assert_eq!(found.freshness, "3h ago");

        let referral = describe(
            &signal(SignalKind::Referral, "friend@example.com", Duration::zero()),
            now(),
        );
        assert_eq!(referral.message, "sent a referral invitation");
        assert_eq!(referral.freshness, "Just now");
    }

    #[test]
    fn unknown_signal_type_fails_to_parse() {
        let json = r#"{"id":"s","type":"open-door","actor_name":"A","timestamp":"2026-06-14T15:00:00Z"}"#;
        assert!(serde_json::from_str::<Signal>(json).is_err());
    }
}
