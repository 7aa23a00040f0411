//! Open-house visitor engagement scoring.
//!
//! Interaction events are validated against a fixed point table, reduced into
//! per visitor+property engagement scores, and visitor rows are ranked into a
//! leaderboard with cohort statistics. Display-only signals get a feed
//! description with a freshness label.

pub mod demo;
pub mod error;
pub mod events;
pub mod import;
pub mod leaderboard;
pub mod models;
pub mod report;
pub mod score;
pub mod signals;
pub mod watch;

pub use error::EngagementError;
pub use events::{classify, EventKind, RawEvent, SignalKind, POINT_TABLE};
pub use leaderboard::{build_leaderboard, build_leaderboard_with, TierScheme};
pub use models::{
    EngagementScore, EngagementTier, InteractionEvent, Leaderboard, Signal, VisitorSummary,
};
pub use score::{compute_score, score_all};
pub use signals::describe;
