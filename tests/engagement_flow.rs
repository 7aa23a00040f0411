use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use open_house_engagement::demo;
use open_house_engagement::models::EngagementTier;
use open_house_engagement::report::{build_report, SampleData};
use open_house_engagement::{
    build_leaderboard, classify, compute_score, describe, EngagementError, EventKind, RawEvent,
    Signal, SignalKind, POINT_TABLE,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 6, 14, 0, 0).unwrap()
}

fn raw(visitor: &str, property: &str, kind: &str, minutes_ago: i64) -> RawEvent {
    RawEvent {
        visitor_id: Some(visitor.to_string()),
        property_id: Some(property.to_string()),
        event_type: Some(kind.to_string()),
        created_at: Some(now() - Duration::minutes(minutes_ago)),
        ..RawEvent::default()
    }
}

#[test]
fn point_table_is_enumerable() {
    let names: Vec<&str> = POINT_TABLE.iter().map(|(kind, _)| kind.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "view",
            "check_in",
            "favorite",
            "share",
            "inquiry",
            "tour_request",
            "document_download"
        ]
    );
    assert_eq!(EventKind::names(), names);
    assert_eq!(SignalKind::names(), vec!["check-in", "feature-discovered", "referral"]);
}

#[test]
fn ingest_then_score_a_visit() {
    let payloads = vec![
        raw("v-1", "p-1", "check_in", 40),
        raw("v-1", "p-1", "view", 35),
        raw("v-1", "p-1", "bogus", 30),
        raw("v-1", "p-1", "tour_request", 5),
        raw("v-1", "p-2", "inquiry", 3),
        raw("v-1", "p-1", "favorite", 20),
    ];

    let mut events = Vec::new();
    let mut rejected = Vec::new();
    for payload in payloads {
        match payload.validate(now()) {
            Ok(event) => events.push(event),
            Err(err) => rejected.push(err),
        }
    }

    assert_eq!(rejected.len(), 1);
    assert!(matches!(
        &rejected[0],
        EngagementError::InvalidEventKind { kind, .. } if kind == "bogus"
    ));

    let score = compute_score("v-1", "p-1", &events);
    let expected: u32 = ["check_in", "view", "tour_request", "favorite"]
        .iter()
        .map(|kind| classify(kind).unwrap())
        .sum();
    assert_eq!(score.total_points, expected);
    assert_eq!(score.total_points, 36);
    assert_eq!(score.interaction_count, 4);
    assert_eq!(score.engagement_tier, EngagementTier::Medium);
    assert_eq!(score.last_interaction_at, Some(now() - Duration::minutes(5)));
}

#[test]
fn score_serializes_to_wire_shape() {
    let score = compute_score("v-7", "p-3", &[]);
    let json = serde_json::to_value(&score).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "visitor_id": "v-7",
            "property_id": "p-3",
            "total_points": 0,
            "interaction_count": 0,
            "engagement_level": "low",
            "last_interaction": null,
        })
    );
}

#[test]
fn leaderboard_and_feed_render_into_report() {
    let mut visitors = demo::sample_visitors(now());
    visitors.reverse();
    let board = build_leaderboard(&visitors);
    let scores: Vec<u32> = board
        .ranked
        .iter()
        .map(|row| row.visitor.engagement_score)
        .collect();
    assert_eq!(scores, vec![92, 78, 65, 45, 28]);
    assert_eq!(board, build_leaderboard(&visitors));

    let signal: Signal = serde_json::from_value(serde_json::json!({
        "id": "s-1",
        "type": "feature_discovered",
        "actor_name": "Sofia Rodriguez",
        "detail": "Smart Home Hub",
        "timestamp": "2026-09-06T13:10:00Z",
    }))
    .unwrap();
    let description = describe(&signal, now());
    assert_eq!(description.message, "completed Feature Discovery: Smart Home Hub");
    assert_eq!(description.freshness, "50m ago");

    let report = build_report("p-1", now(), &board, &[signal], SampleData::NONE);
    assert!(report.contains("- Total visitors: 5"));
    assert!(report.contains("- Average time in home: 25m"));
    assert!(report.contains("Sofia Rodriguez completed Feature Discovery: Smart Home Hub (50m ago)"));
    assert!(!report.contains("sample data"));
}
