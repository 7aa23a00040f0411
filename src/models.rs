use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{EventKind, SignalKind};

/// A validated, scorable interaction of one visitor with one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub visitor_id: String,
    pub property_id: String,
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(rename = "created_at")]
    pub occurred_at: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn points(&self) -> u32 {
        self.kind.points()
    }

    pub fn belongs_to(&self, visitor_id: &str, property_id: &str) -> bool {
        self.visitor_id == visitor_id && self.property_id == property_id
    }
}

/// Raw-point engagement bucket for a visitor+property pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EngagementTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementTier::Low => "low",
            EngagementTier::Medium => "medium",
            EngagementTier::High => "high",
            EngagementTier::VeryHigh => "very_high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementScore {
    pub visitor_id: String,
    pub property_id: String,
    pub total_points: u32,
    pub interaction_count: usize,
    #[serde(rename = "engagement_level")]
    pub engagement_tier: EngagementTier,
    #[serde(rename = "last_interaction")]
    pub last_interaction_at: Option<DateTime<Utc>>,
}

/// One visitor row as supplied to the leaderboard.
///
/// `engagement_score` is the 0-100 display score and is unrelated to raw
/// point totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub checked_in_at: DateTime<Utc>,
    pub engagement_score: u32,
    #[serde(default)]
    pub features_found: u32,
    #[serde(default)]
    pub referrals_sent: u32,
    #[serde(default)]
    pub time_in_home_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedVisitor {
    pub rank: usize,
    pub tier: &'static str,
    pub time_in_home: String,
    #[serde(flatten)]
    pub visitor: VisitorSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierCount {
    pub label: &'static str,
    pub min_score: u32,
    /// Visitors scoring at or above `min_score`.
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardStats {
    pub visitor_count: usize,
    pub average_score: u32,
    pub high_priority_count: usize,
    pub average_time_in_home_minutes: u32,
    pub average_time_in_home: String,
    pub total_referrals: u32,
    pub tiers: Vec<TierCount>,
}

/// Ranked snapshot of a property's visitors. Rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub scheme: &'static str,
    pub ranked: Vec<RankedVisitor>,
    pub stats: LeaderboardStats,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Display-only feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub actor_name: String,
    #[serde(default)]
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalDescription {
    pub icon: &'static str,
    pub message: String,
    pub freshness: String,
}
