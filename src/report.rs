use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::events::SignalKind;
use crate::models::{Leaderboard, Signal};
use crate::signals::describe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMix {
    pub kind: SignalKind,
    pub count: usize,
}

pub fn summarize_signal_mix(signals: &[Signal]) -> Vec<SignalMix> {
    let mut map: HashMap<SignalKind, usize> = HashMap::new();
    for signal in signals {
        *map.entry(signal.kind).or_insert(0) += 1;
    }

    // fixed kind order keeps ties deterministic
    let mut mix: Vec<SignalMix> = SignalKind::ALL
        .iter()
        .filter_map(|kind| {
            map.get(kind).map(|count| SignalMix {
                kind: *kind,
                count: *count,
            })
        })
        .collect();
    mix.sort_by(|a, b| b.count.cmp(&a.count));
    mix
}

/// Sorts signals newest first.
pub fn newest_first(signals: &[Signal]) -> Vec<Signal> {
    let mut sorted = signals.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

/// Which report inputs came from the sample fallback rather than the datastore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleData {
    pub visitors: bool,
    pub feed: bool,
}

impl SampleData {
    pub const NONE: SampleData = SampleData {
        visitors: false,
        feed: false,
    };
}

fn write_sample_note(output: &mut String, what: &str) {
    let _ = writeln!(
        output,
        "> Showing {}: no {} were returned for this property.",
        crate::demo::SAMPLE_LABEL,
        what
    );
}

pub fn build_report(
    property: &str,
    generated_at: DateTime<Utc>,
    leaderboard: &Leaderboard,
    signals: &[Signal],
    sample: SampleData,
) -> String {
    let stats = &leaderboard.stats;
    let mut output = String::new();

    let _ = writeln!(output, "# Open House Engagement Report");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        property,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    if sample.visitors {
        let _ = writeln!(output);
        write_sample_note(&mut output, "visitors");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total visitors: {}", stats.visitor_count);
    let _ = writeln!(output, "- Average score: {}", stats.average_score);
    let _ = writeln!(output, "- High-priority: {}", stats.high_priority_count);
    let _ = writeln!(output, "- Average time in home: {}", stats.average_time_in_home);
    let _ = writeln!(output, "- Total referrals: {}", stats.total_referrals);
    for tier in &stats.tiers {
        let _ = writeln!(
            output,
            "- {} ({}+): {} ({}%)",
            tier.label, tier.min_score, tier.count, tier.percentage
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard ({} tiers)", leaderboard.scheme);

    if leaderboard.is_empty() {
        let _ = writeln!(output, "No visitors yet.");
    } else {
        for row in &leaderboard.ranked {
            let _ = writeln!(
                output,
                "{}. {} ({}) score {} [{}], {} in home, {} features, {} referrals",
                row.rank,
                row.visitor.name,
                row.visitor.email,
                row.visitor.engagement_score,
                row.tier,
                row.time_in_home,
                row.visitor.features_found,
                row.visitor.referrals_sent
            );
        }
    }

    let _ = writeln!(output);
    if sample.feed {
        let _ = writeln!(output, "## Signal Mix ({})", crate::demo::SAMPLE_LABEL);
    } else {
        let _ = writeln!(output, "## Signal Mix");
    }
    let mix = summarize_signal_mix(signals);
    if mix.is_empty() {
        let _ = writeln!(output, "No signals yet.");
    } else {
        for entry in &mix {
            let _ = writeln!(output, "- {}: {}", entry.kind, entry.count);
        }
    }

    let _ = writeln!(output);
    if sample.feed {
        let _ = writeln!(output, "## Live Signals ({})", crate::demo::SAMPLE_LABEL);
        write_sample_note(&mut output, "signals");
    } else {
        let _ = writeln!(output, "## Live Signals");
    }
    let recent = newest_first(signals);
    if recent.is_empty() {
        let _ = writeln!(output, "No signals yet.");
    } else {
        for signal in recent.iter().take(10) {
            let description = describe(signal, generated_at);
            let _ = writeln!(
                output,
                "- [{}] {} {} ({})",
                description.icon, signal.actor_name, description.message, description.freshness
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::leaderboard::build_leaderboard;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 19, 16, 0, 0).unwrap()
    }

    #[test]
    fn signal_mix_counts_by_kind() {
        let mix = summarize_signal_mix(&demo::sample_signals(now()));
        assert_eq!(
            mix,
            vec![
                SignalMix {
                    kind: SignalKind::CheckIn,
                    count: 2
                },
                SignalMix {
                    kind: SignalKind::FeatureDiscovered,
                    count: 2
                },
                SignalMix {
                    kind: SignalKind::Referral,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn newest_first_sorts_descending() {
        let mut signals = demo::sample_signals(now());
        signals.reverse();
        let sorted = newest_first(&signals);
        assert_eq!(sorted[0].id, "sig-1");
        assert_eq!(sorted.last().map(|s| s.id.as_str()), Some("sig-5"));
    }

    #[test]
    fn report_lists_ranked_visitors_and_feed() {
        let board = build_leaderboard(&demo::sample_visitors(now()));
        let report = build_report(
            "prop-42",
            now(),
            &board,
            &demo::sample_signals(now()),
            SampleData {
                visitors: true,
                feed: true,
            },
        );

        assert!(report.contains("Generated for prop-42 at 2026-07-19 16:00 UTC"));
        assert!(report.contains("sample data"));
        assert!(report.contains("- Average score: 62"));
        assert!(report.contains("1. Alexandra Chen (alexandra.chen@email.com) score 92 [high-priority]"));
        assert!(report.contains("5. Emily Park"));
        assert!(report.contains("- [users] Alexandra Chen sent a referral invitation (2m ago)"));
        assert!(report.contains("completed Feature Discovery: Chef's Kitchen (9m ago)"));
    }

    #[test]
    fn empty_report_uses_placeholders() {
        let board = build_leaderboard(&[]);
        let report = build_report("prop-1", now(), &board, &[], SampleData::NONE);
        assert!(report.contains("No visitors yet."));
        assert!(report.contains("No signals yet."));
        assert!(report.contains("- Average score: 0"));
        assert!(!report.contains("sample data"));
    }

    #[test]
    fn sample_feed_is_labelled_under_a_real_cohort() {
        let board = build_leaderboard(&demo::sample_visitors(now())[..2]);
        let report = build_report(
            "prop-7",
            now(),
            &board,
            &demo::sample_signals(now()),
            SampleData {
                visitors: false,
                feed: true,
            },
        );

        assert!(!report.contains("no visitors were returned"));
        assert!(report.contains("## Signal Mix (sample data)"));
        assert!(report.contains("## Live Signals (sample data)"));
        assert!(report.contains("> Showing sample data: no signals were returned for this property."));
        let summary = report.split("## Leaderboard").next().unwrap_or_default();
        assert!(!summary.contains("sample data"));
    }
}
