//! Sample cohort shown when the datastore has nothing to offer.

use chrono::{DateTime, Duration, Utc};

use crate::events::SignalKind;
use crate::models::{Signal, VisitorSummary};

pub const SAMPLE_LABEL: &str = "sample data";

/// Five sample visitors checked in relative to `now`.
pub fn sample_visitors(now: DateTime<Utc>) -> Vec<VisitorSummary> {
    let rows = [
        ("demo-1", "Alexandra Chen", "alexandra.chen@email.com", 5, 92, 3, 2, 47),
        ("demo-2", "Marcus Williams", "m.williams@company.io", 15, 78, 2, 1, 32),
        ("demo-3", "Sofia Rodriguez", "sofia.r@gmail.com", 32, 65, 2, 0, 24),
        ("demo-4", "James Thompson", "james.t@outlook.com", 48, 45, 1, 0, 15),
        ("demo-5", "Emily Park", "emily.park@email.com", 75, 28, 0, 0, 8),
    ];

    rows.into_iter()
        .map(
            |(id, name, email, minutes_ago, score, features, referrals, minutes)| VisitorSummary {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                checked_in_at: now - Duration::minutes(minutes_ago),
                engagement_score: score,
                features_found: features,
                referrals_sent: referrals,
                time_in_home_minutes: minutes,
            },
        )
        .collect()
}

/// Sample feed, newest first.
pub fn sample_signals(now: DateTime<Utc>) -> Vec<Signal> {
    let rows = [
        ("sig-1", SignalKind::Referral, "Alexandra Chen", "jordan@email.com", 2),
        ("sig-2", SignalKind::FeatureDiscovered, "Marcus Williams", "Chef's Kitchen", 9),
        ("sig-3", SignalKind::CheckIn, "Sofia Rodriguez", "", 32),
        ("sig-4", SignalKind::FeatureDiscovered, "Alexandra Chen", "Spa Retreat", 41),
        ("sig-5", SignalKind::CheckIn, "Emily Park", "", 75),
    ];

    rows.into_iter()
        .map(|(id, kind, actor, detail, minutes_ago)| Signal {
            id: id.to_string(),
            kind,
            actor_name: actor.to_string(),
            detail: detail.to_string(),
            timestamp: now - Duration::minutes(minutes_ago),
        })
        .collect()
}
