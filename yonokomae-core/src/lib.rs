//! Yono vs Komae — repository resolution and judgement caching core.
//!
//! Platform-agnostic logic behind the battle-report UI: seed discovery and
//! validation, pure outcome judgement with judge-code bias rules, a
//! collapsing TTL cache around judgement engines, and the mode-keyed
//! factory that wires the pieces together. Rendering and routing live in
//! the presentation layer and consume this crate through the
//! `ReportGenerator` and `JudgementRepository` traits.

pub mod cancel;
pub mod config;
pub mod delay;
pub mod error;
pub mod judgement;
pub mod model;
pub mod repo;
pub mod rng;
pub mod seeds;

// Re-export commonly used types
pub use cancel::{CancelSource, CancelToken};
pub use config::{CoreConfig, ExecMode, parse_bool};
pub use delay::{DelayOption, MAX_DELAY_MS};
pub use error::{CoreError, ValidationFailure, ValidationIssue};
pub use judgement::{Decision, decide, decide_by_power, normalize_judge_code};
pub use model::{
    Battle, BattleFilter, JudgeIdentity, Neta, PublishState, Reason, Significance, Verdict, Winner,
};
pub use repo::cache::{CachedJudgement, JudgementCache, KeyStrategy, LruCache};
pub use repo::engines::{BiasedJudgement, PowerJudgement};
pub use repo::factory::{GameMode, RepoFactory, SEED_ROOTS, demo_battle};
pub use repo::generators::{
    BlendedReportGenerator, FixedReportGenerator, RemoteReportGenerator, RemoteReportSource,
    SeedReportGenerator,
};
pub use repo::timing::TimedJudgement;
pub use repo::{JudgementInput, JudgementRepository, ReportGenerator};
pub use rng::UnitRng;
pub use seeds::{
    BattlePredicate, InMemorySeedSource, LoadRequest, SeedLoader, SeedSource, validate_battle,
};
