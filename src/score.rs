use std::collections::HashMap;

use crate::models::{EngagementScore, EngagementTier, InteractionEvent};

pub const VERY_HIGH_MIN_POINTS: u32 = 100;
pub const HIGH_MIN_POINTS: u32 = 50;
pub const MEDIUM_MIN_POINTS: u32 = 20;

/// Scores the events belonging to one visitor+property pair. Events for any
/// other pair are ignored.
pub fn compute_score(
    visitor_id: &str,
    property_id: &str,
    events: &[InteractionEvent],
) -> EngagementScore {
    let mut score = EngagementScore {
        visitor_id: visitor_id.to_string(),
        property_id: property_id.to_string(),
        total_points: 0,
        interaction_count: 0,
        engagement_tier: EngagementTier::Low,
        last_interaction_at: None,
    };

    for event in events.iter().filter(|e| e.belongs_to(visitor_id, property_id)) {
        accumulate(&mut score, event);
    }

    score.engagement_tier = tier_for_points(score.total_points);
    score
}

/// Scores every visitor+property pair present in `events`, highest points first.
pub fn score_all(events: &[InteractionEvent]) -> Vec<EngagementScore> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut scores: HashMap<(String, String), EngagementScore> = HashMap::new();

    for event in events {
        let key = (event.visitor_id.clone(), event.property_id.clone());
        let entry = scores.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            EngagementScore {
                visitor_id: event.visitor_id.clone(),
                property_id: event.property_id.clone(),
                total_points: 0,
                interaction_count: 0,
                engagement_tier: EngagementTier::Low,
                last_interaction_at: None,
            }
        });
        accumulate(entry, event);
    }

    let mut values: Vec<EngagementScore> = order
        .into_iter()
        .filter_map(|key| scores.remove(&key))
        .map(|mut score| {
            score.engagement_tier = tier_for_points(score.total_points);
            score
        })
        .collect();
    values.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    values
}

pub fn tier_for_points(total: u32) -> EngagementTier {
    match total {
        t if t >= VERY_HIGH_MIN_POINTS => EngagementTier::VeryHigh,
        t if t >= HIGH_MIN_POINTS => EngagementTier::High,
        t if t >= MEDIUM_MIN_POINTS => EngagementTier::Medium,
        _ => EngagementTier::Low,
    }
}

fn accumulate(score: &mut EngagementScore, event: &InteractionEvent) {
    score.total_points += event.points();
    score.interaction_count += 1;
    score.last_interaction_at = match score.last_interaction_at {
        Some(current) if current >= event.occurred_at => Some(current),
        _ => Some(event.occurred_at),
    };
}
