//! Ranks visitors by display score and computes cohort statistics.

use chrono::{DateTime, Utc};

use crate::models::{Leaderboard, LeaderboardStats, RankedVisitor, TierCount, VisitorSummary};

/// Display score at which a visitor counts as high priority.
pub const HIGH_PRIORITY_MIN_SCORE: u32 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTier {
    pub label: &'static str,
    pub min_score: u32,
}

/// Named threshold table mapping a 0-100 display score to a label.
///
/// `tiers` is ordered from the highest threshold down; a score below every
/// threshold gets `fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierScheme {
    pub name: &'static str,
    pub tiers: &'static [DisplayTier],
    pub fallback: &'static str,
}

static READINESS_TIERS: [DisplayTier; 2] = [
    DisplayTier {
        label: "high-priority",
        min_score: 75,
    },
    DisplayTier {
        label: "engaged",
        min_score: 50,
    },
];

static INTENT_TIERS: [DisplayTier; 3] = [
    DisplayTier {
        label: "hot lead",
        min_score: 80,
    },
    DisplayTier {
        label: "high intent",
        min_score: 60,
    },
    DisplayTier {
        label: "interested",
        min_score: 40,
    },
];

impl TierScheme {
    /// Buyer-readiness buckets: 75 / 50.
    pub fn readiness() -> Self {
        TierScheme {
            name: "readiness",
            tiers: &READINESS_TIERS,
            fallback: "evaluating",
        }
    }

    /// Purchase-intent buckets: 80 / 60 / 40.
    pub fn intent() -> Self {
        TierScheme {
            name: "intent",
            tiers: &INTENT_TIERS,
            fallback: "browsing",
        }
    }

    pub fn label_for(&self, score: u32) -> &'static str {
        self.tiers
            .iter()
            .find(|tier| score >= tier.min_score)
            .map(|tier| tier.label)
            .unwrap_or(self.fallback)
    }
}

pub fn build_leaderboard(visitors: &[VisitorSummary]) -> Leaderboard {
    build_leaderboard_with(visitors, &TierScheme::readiness())
}

/// Ranks `visitors` by descending display score. Equal scores keep their
/// input order.
pub fn build_leaderboard_with(visitors: &[VisitorSummary], scheme: &TierScheme) -> Leaderboard {
    let mut sorted: Vec<&VisitorSummary> = visitors.iter().collect();
    sorted.sort_by(|a, b| b.engagement_score.cmp(&a.engagement_score));

    let ranked = sorted
        .into_iter()
        .enumerate()
        .map(|(index, visitor)| RankedVisitor {
            rank: index + 1,
            tier: scheme.label_for(visitor.engagement_score),
            time_in_home: format_time_in_home(visitor.time_in_home_minutes),
            visitor: visitor.clone(),
        })
        .collect();

    Leaderboard {
        scheme: scheme.name,
        ranked,
        stats: summarize(visitors, scheme),
    }
}

pub fn summarize(visitors: &[VisitorSummary], scheme: &TierScheme) -> LeaderboardStats {
    let count = visitors.len();
    let score_sum: u64 = visitors.iter().map(|v| u64::from(v.engagement_score)).sum();
    let minutes_sum: u64 = visitors
        .iter()
        .map(|v| u64::from(v.time_in_home_minutes))
        .sum();
    let average_minutes = rounded_average(minutes_sum, count);

    let tiers = scheme
        .tiers
        .iter()
        .map(|tier| {
            let at_or_above = visitors
                .iter()
                .filter(|v| v.engagement_score >= tier.min_score)
                .count();
            TierCount {
                label: tier.label,
                min_score: tier.min_score,
                count: at_or_above,
                percentage: rounded_average(at_or_above as u64 * 100, count),
            }
        })
        .collect();

    LeaderboardStats {
        visitor_count: count,
        average_score: rounded_average(score_sum, count),
        high_priority_count: visitors
            .iter()
            .filter(|v| v.engagement_score >= HIGH_PRIORITY_MIN_SCORE)
            .count(),
        average_time_in_home_minutes: average_minutes,
        average_time_in_home: format_time_in_home(average_minutes),
        total_referrals: visitors.iter().map(|v| v.referrals_sent).sum(),
        tiers,
    }
}

/// `round(sum / count)` with halves rounded up; zero for an empty set.
fn rounded_average(sum: u64, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    let count = count as u64;
    ((2 * sum + count) / (2 * count)) as u32
}

pub fn format_time_in_home(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours}h")
    }
}

/// Whole minutes from check-in to `now`, never negative.
pub fn minutes_between(checked_in_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let minutes = (now - checked_in_at).num_minutes();
    minutes.clamp(0, i64::from(u32::MAX)) as u32
}
