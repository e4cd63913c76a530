//! Mode-keyed selection of report generators and decorated judgement
//! repositories.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::delay::DelayOption;
use crate::model::{Battle, Neta, PublishState, Significance};
use crate::repo::cache::{CachedJudgement, JudgementCache, KeyStrategy};
use crate::repo::engines::{BiasedJudgement, PowerJudgement};
use crate::repo::generators::{
    BlendedReportGenerator, FixedReportGenerator, RemoteReportGenerator, RemoteReportSource,
    SeedReportGenerator,
};
use crate::repo::timing::TimedJudgement;
use crate::repo::{JudgementRepository, ReportGenerator};
use crate::rng::UnitRng;
use crate::seeds::{SeedLoader, SeedSource};

/// Closed set of game modes. Unknown mode ids resolve to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Demo,
    HistoricalResearch,
    YkNow,
    YkApi,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Demo,
        GameMode::HistoricalResearch,
        GameMode::YkNow,
        GameMode::YkApi,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            GameMode::Demo => "demo",
            GameMode::HistoricalResearch => "historical-research",
            GameMode::YkNow => "yk-now",
            GameMode::YkApi => "yk-api",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.id().eq_ignore_ascii_case(id.trim()))
    }
}

const DEMO_DELAY: DelayOption = DelayOption::Range { min: 300, max: 900 };
const HISTORICAL_DELAY: DelayOption = DelayOption::Range {
    min: 800,
    max: 1_600,
};
const NEWS_DELAY: DelayOption = DelayOption::Range {
    min: 400,
    max: 1_200,
};
const API_DELAY: DelayOption = DelayOption::Fixed(250);

/// Logical roots probed by seed-driven generators; the legacy namespace
/// comes first so it wins duplicate file names.
pub const SEED_ROOTS: [&str; 2] = ["battle/themes", "battle"];

/// Top-level selector wiring generators, judges, delays and decorators per
/// mode. Holds the process-wide judgement cache service.
pub struct RepoFactory {
    config: CoreConfig,
    cache: JudgementCache,
    seeds: Arc<dyn SeedSource>,
    remote: Option<Arc<dyn RemoteReportSource>>,
    rng: UnitRng,
}

impl RepoFactory {
    #[must_use]
    pub fn new(config: CoreConfig, seeds: Arc<dyn SeedSource>) -> Self {
        let cache = JudgementCache::new(config.judgement_cache_size, config.cache_log);
        Self {
            config,
            cache,
            seeds,
            remote: None,
            rng: UnitRng::default(),
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteReportSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: UnitRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The shared cache service, exposed for cache busting when upstream
    /// data changes invalidate prior verdicts.
    #[must_use]
    pub fn judgement_cache(&self) -> &JudgementCache {
        &self.cache
    }

    /// Resolves the report-generation strategy for `mode`. `seed_override`
    /// pins seed-driven generators to one file.
    #[must_use]
    pub fn report_generator(
        &self,
        mode: Option<GameMode>,
        seed_override: Option<&str>,
    ) -> Arc<dyn ReportGenerator> {
        match mode {
            Some(GameMode::Demo) => Arc::new(FixedReportGenerator::new(
                demo_battle(),
                DEMO_DELAY,
                self.config.exec_mode,
                self.rng.clone(),
            )),
            Some(GameMode::HistoricalResearch) => Arc::new(
                self.seed_generator(HISTORICAL_DELAY, seed_override)
                    .published_only(true),
            ),
            Some(GameMode::YkNow) => {
                let local: Arc<dyn ReportGenerator> =
                    Arc::new(self.seed_generator(NEWS_DELAY, seed_override));
                match self.remote_generator(NEWS_DELAY) {
                    Some(remote) => Arc::new(BlendedReportGenerator::new(
                        local,
                        remote,
                        self.config.remote_weight,
                        self.rng.clone(),
                    )),
                    None => local,
                }
            }
            Some(GameMode::YkApi) => match self.remote_generator(API_DELAY) {
                Some(remote) => remote,
                None => {
                    log::warn!("no remote source configured, falling back to seeds");
                    Arc::new(self.seed_generator(API_DELAY, seed_override))
                }
            },
            None => Arc::new(self.seed_generator(DelayOption::NONE, seed_override)),
        }
    }

    /// Resolves the judgement strategy for `mode`, decorated per mode with
    /// timing instrumentation and the collapsing TTL cache.
    #[must_use]
    pub fn judgement(&self, mode: Option<GameMode>) -> Arc<dyn JudgementRepository> {
        match mode {
            Some(GameMode::Demo) => self.decorate(
                Arc::new(PowerJudgement::new(
                    DEMO_DELAY,
                    self.config.exec_mode,
                    self.rng.clone(),
                )),
                KeyStrategy::General,
            ),
            Some(GameMode::HistoricalResearch) => self.decorate(
                Arc::new(BiasedJudgement::new(
                    HISTORICAL_DELAY,
                    self.config.exec_mode,
                    self.rng.clone(),
                )),
                // Verdicts stay fixed per (battle, judge) in this mode even
                // when powers change later.
                KeyStrategy::PerBattleJudge,
            ),
            Some(GameMode::YkNow) => self.decorate(
                Arc::new(BiasedJudgement::new(
                    NEWS_DELAY,
                    self.config.exec_mode,
                    self.rng.clone(),
                )),
                KeyStrategy::General,
            ),
            Some(GameMode::YkApi) => self.decorate(
                Arc::new(PowerJudgement::new(
                    API_DELAY,
                    self.config.exec_mode,
                    self.rng.clone(),
                )),
                KeyStrategy::General,
            ),
            // Default: plain power comparison, no bias, no special caching.
            None => Arc::new(PowerJudgement::new(
                DelayOption::NONE,
                self.config.exec_mode,
                self.rng.clone(),
            )),
        }
    }

    fn seed_generator(
        &self,
        delay: DelayOption,
        seed_override: Option<&str>,
    ) -> SeedReportGenerator {
        let loader = SeedLoader::new(Arc::clone(&self.seeds), self.rng.clone());
        SeedReportGenerator::new(
            loader,
            SEED_ROOTS.iter().map(ToString::to_string).collect(),
            delay,
            self.config.exec_mode,
            self.rng.clone(),
        )
        .with_file(seed_override.map(str::to_string))
    }

    fn remote_generator(&self, delay: DelayOption) -> Option<Arc<dyn ReportGenerator>> {
        let source = self.remote.as_ref()?;
        Some(Arc::new(RemoteReportGenerator::new(
            Arc::clone(source),
            self.config.remote_ttl,
            delay,
            self.config.exec_mode,
            self.rng.clone(),
        )))
    }

    fn decorate(
        &self,
        engine: Arc<dyn JudgementRepository>,
        keys: KeyStrategy,
    ) -> Arc<dyn JudgementRepository> {
        let inner: Arc<dyn JudgementRepository> = if self.config.timing_log {
            Arc::new(TimedJudgement::new(engine, keys))
        } else {
            engine
        };
        Arc::new(CachedJudgement::new(
            inner,
            self.cache.clone(),
            self.config.effective_judgement_ttl(),
            keys,
        ))
    }
}

/// The canned demo battle served by `GameMode::Demo`.
#[must_use]
pub fn demo_battle() -> Battle {
    Battle {
        id: "demo-opening-skirmish".to_string(),
        title: "Opening Skirmish".to_string(),
        subtitle: "A gentle introduction".to_string(),
        overview: "Yono and Komae size each other up across the river.".to_string(),
        narrative: "Neither side commits; scouts trade taunts at the ford.".to_string(),
        theme_id: "demo".to_string(),
        significance: Significance::Low,
        publish_state: PublishState::Published,
        yono: Neta::new("Yono Vanguard", 52.0),
        komae: Neta::new("Komae Garrison", 48.0),
    }
}
