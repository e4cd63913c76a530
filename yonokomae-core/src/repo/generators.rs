//! Report-generation strategies: fixed template, seed-driven, remote and
//! weighted blend.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::config::ExecMode;
use crate::delay::DelayOption;
use crate::error::CoreError;
use crate::model::{Battle, BattleFilter};
use crate::repo::ReportGenerator;
use crate::repo::cache::LruCache;
use crate::rng::UnitRng;
use crate::seeds::{LoadRequest, SeedLoader};

const REMOTE_MEMO_SIZE: usize = 32;

/// Serves one templated battle after the configured delay.
pub struct FixedReportGenerator {
    template: Battle,
    delay: DelayOption,
    mode: ExecMode,
    rng: UnitRng,
}

impl FixedReportGenerator {
    pub fn new(template: Battle, delay: DelayOption, mode: ExecMode, rng: UnitRng) -> Self {
        Self {
            template,
            delay,
            mode,
            rng,
        }
    }
}

#[async_trait]
impl ReportGenerator for FixedReportGenerator {
    async fn generate(
        &self,
        filter: &BattleFilter,
        cancel: Option<&CancelToken>,
    ) -> Result<Battle, CoreError> {
        self.delay.apply(self.mode, &self.rng, cancel).await?;
        if filter.matches(&self.template) {
            Ok(self.template.clone())
        } else {
            Err(CoreError::NotFound(format!(
                "fixed battle `{}` does not match the requested filter",
                self.template.id
            )))
        }
    }
}

/// Random (or pinned-file) selection from the seed store.
pub struct SeedReportGenerator {
    loader: SeedLoader,
    roots: Vec<String>,
    file: Option<String>,
    published_only: bool,
    delay: DelayOption,
    mode: ExecMode,
    rng: UnitRng,
}

impl SeedReportGenerator {
    pub fn new(
        loader: SeedLoader,
        roots: Vec<String>,
        delay: DelayOption,
        mode: ExecMode,
        rng: UnitRng,
    ) -> Self {
        Self {
            loader,
            roots,
            file: None,
            published_only: false,
            delay,
            mode,
            rng,
        }
    }

    /// Pins selection to one seed file instead of drawing at random.
    #[must_use]
    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    #[must_use]
    pub fn published_only(mut self, gate: bool) -> Self {
        self.published_only = gate;
        self
    }
}

#[async_trait]
impl ReportGenerator for SeedReportGenerator {
    async fn generate(
        &self,
        filter: &BattleFilter,
        cancel: Option<&CancelToken>,
    ) -> Result<Battle, CoreError> {
        self.delay.apply(self.mode, &self.rng, cancel).await?;
        let mut request =
            LoadRequest::new(self.roots.clone()).published_only(self.published_only);
        request.file = self.file.clone();
        if !filter.is_empty() {
            let filter = filter.clone();
            request = request.with_predicate(move |battle| filter.matches(battle));
        }
        self.loader.load_one(&request)
    }
}

/// External battle source, e.g. an HTTP API behind the configured base URL.
/// Treated as a collaborator boundary; implementations live outside the core.
#[async_trait]
pub trait RemoteReportSource: Send + Sync {
    /// # Errors
    ///
    /// Any failure of the remote collaborator, surfaced unchanged.
    async fn fetch(&self, filter: &BattleFilter) -> Result<Battle, CoreError>;
}

/// Wraps a remote source with the shared delay/cancellation contract and a
/// small per-filter TTL memo.
pub struct RemoteReportGenerator {
    source: Arc<dyn RemoteReportSource>,
    memo: Mutex<LruCache<(Battle, Instant)>>,
    ttl: std::time::Duration,
    delay: DelayOption,
    mode: ExecMode,
    rng: UnitRng,
}

impl RemoteReportGenerator {
    pub fn new(
        source: Arc<dyn RemoteReportSource>,
        ttl: std::time::Duration,
        delay: DelayOption,
        mode: ExecMode,
        rng: UnitRng,
    ) -> Self {
        Self {
            source,
            memo: Mutex::new(LruCache::new(REMOTE_MEMO_SIZE)),
            ttl,
            delay,
            mode,
            rng,
        }
    }
}

#[async_trait]
impl ReportGenerator for RemoteReportGenerator {
    async fn generate(
        &self,
        filter: &BattleFilter,
        cancel: Option<&CancelToken>,
    ) -> Result<Battle, CoreError> {
        self.delay.apply(self.mode, &self.rng, cancel).await?;
        let key = filter.cache_key();
        {
            let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((battle, expires_at)) = memo.get_mut(&key)
                && *expires_at > Instant::now()
            {
                return Ok(battle.clone());
            }
        }
        let fetch = self.source.fetch(filter);
        let battle = match cancel {
            Some(token) => {
                tokio::select! {
                    result = fetch => result?,
                    () = token.cancelled() => return Err(CoreError::Cancelled),
                }
            }
            None => fetch.await?,
        };
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        memo.insert(key, (battle.clone(), Instant::now() + self.ttl));
        Ok(battle)
    }
}

/// Samples a weighted coin per call and delegates entirely to the chosen
/// source for that call; partial results are never merged.
pub struct BlendedReportGenerator {
    local: Arc<dyn ReportGenerator>,
    remote: Arc<dyn ReportGenerator>,
    remote_weight: f64,
    rng: UnitRng,
}

impl BlendedReportGenerator {
    pub fn new(
        local: Arc<dyn ReportGenerator>,
        remote: Arc<dyn ReportGenerator>,
        remote_weight: f64,
        rng: UnitRng,
    ) -> Self {
        Self {
            local,
            remote,
            remote_weight: remote_weight.clamp(0.0, 1.0),
            rng,
        }
    }
}

#[async_trait]
impl ReportGenerator for BlendedReportGenerator {
    async fn generate(
        &self,
        filter: &BattleFilter,
        cancel: Option<&CancelToken>,
    ) -> Result<Battle, CoreError> {
        if self.rng.sample() < self.remote_weight {
            self.remote.generate(filter, cancel).await
        } else {
            self.local.generate(filter, cancel).await
        }
    }
}
