//! TTL cache and request collapsing around a judgement engine.
//!
//! Invariants: at most one underlying call is in flight per key; every
//! caller collapsed onto that call observes the same resolved value or the
//! same rejection; a caller's cancellation aborts only its own wait; failed
//! entries are deleted outright so the next call retries cleanly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::cancel::CancelToken;
use crate::error::CoreError;
use crate::model::Verdict;
use crate::repo::{JudgementInput, JudgementRepository};

/// Bounded map with true least-recently-used eviction: reads refresh
/// recency, so an entry touched via `get_mut` outlives newer inserts.
#[derive(Debug)]
pub struct LruCache<V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, Slot<V>>,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    last_used: u64,
}

impl<V> LruCache<V> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            entries: HashMap::new(),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|slot| {
            slot.last_used = tick;
            &mut slot.value
        })
    }

    /// Inserts `value`, returning the evicted key when the store was full.
    pub fn insert(&mut self, key: String, value: V) -> Option<String> {
        self.tick += 1;
        let tick = self.tick;
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.value = value;
            slot.last_used = tick;
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(victim) = &victim {
                self.entries.remove(victim);
            }
            victim
        } else {
            None
        };
        self.entries.insert(key, Slot { value, last_used: tick });
        evicted
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|slot| slot.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// How the cache key is derived from a judgement input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Judge id + battle id + both contestants' title and power.
    General,
    /// Judge id + battle id only. Used where the outcome is RNG-driven and
    /// must stay fixed per (battle, judge) pair regardless of later power
    /// changes.
    PerBattleJudge,
}

impl KeyStrategy {
    #[must_use]
    pub fn key(&self, input: &JudgementInput) -> String {
        let judge = &input.judge;
        let battle = &input.battle;
        match self {
            KeyStrategy::PerBattleJudge => format!("{}::{}", judge.id, battle.id),
            KeyStrategy::General => format!(
                "{}::{}::{}:{}::{}:{}",
                judge.id,
                battle.id,
                battle.yono.title,
                battle.yono.power,
                battle.komae.title,
                battle.komae.power,
            ),
        }
    }
}

type SharedVerdict = Shared<BoxFuture<'static, Result<Verdict, CoreError>>>;

/// One slot in the judgement cache. Created on miss with the in-flight
/// handle set; flips to a resolved value with a fresh deadline on success;
/// deleted on failure.
pub(crate) struct CacheEntry {
    shared: Option<SharedVerdict>,
    value: Option<Verdict>,
    expires_at: Option<Instant>,
}

/// Explicit, injectable cache service. Constructed once at process start in
/// production, fresh per test; shared by every decorator instance.
#[derive(Clone)]
pub struct JudgementCache {
    store: Arc<Mutex<LruCache<CacheEntry>>>,
    log: bool,
}

impl JudgementCache {
    #[must_use]
    pub fn new(max_size: usize, log: bool) -> Self {
        Self {
            store: Arc::new(Mutex::new(LruCache::new(max_size))),
            log,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheEntry>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deletes one computed key.
    pub fn invalidate(&self, key: &str) {
        if self.lock().remove(key).is_some() && self.log {
            log::debug!("judgement cache invalidate {key}");
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut store = self.lock();
        if self.log && !store.is_empty() {
            log::debug!("judgement cache clear ({} entries)", store.len());
        }
        store.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn store_value(&self, key: &str, verdict: Verdict, ttl: Duration) {
        let mut store = self.lock();
        let entry = CacheEntry {
            shared: None,
            value: Some(verdict),
            expires_at: Some(Instant::now() + ttl),
        };
        if let Some(slot) = store.get_mut(key) {
            *slot = entry;
        } else if let Some(evicted) = store.insert(key.to_string(), entry)
            && self.log
        {
            log::debug!("judgement cache evicted {evicted}");
        }
    }

    fn drop_entry(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Collapsing + TTL-cache decorator, applied outermost.
pub struct CachedJudgement {
    inner: Arc<dyn JudgementRepository>,
    cache: JudgementCache,
    ttl: Duration,
    keys: KeyStrategy,
    enabled: bool,
}

impl CachedJudgement {
    pub fn new(
        inner: Arc<dyn JudgementRepository>,
        cache: JudgementCache,
        ttl: Duration,
        keys: KeyStrategy,
    ) -> Self {
        Self {
            inner,
            cache,
            ttl,
            keys,
            enabled: true,
        }
    }

    /// `enabled = false` calls straight through with no caching at all.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Spawns the underlying call as a detached task. The task owns the
    /// cache write-back, so it runs to completion even if every waiter
    /// cancels; the caller's token is never handed down.
    fn spawn_underlying(&self, key: &str, input: &JudgementInput) -> SharedVerdict {
        let inner = Arc::clone(&self.inner);
        let cache = self.cache.clone();
        let key = key.to_string();
        let input = input.clone();
        let ttl = self.ttl;
        let handle = tokio::spawn(async move {
            let result = inner.determine_winner(&input, None).await;
            match &result {
                Ok(verdict) => cache.store_value(&key, verdict.clone(), ttl),
                Err(_) => cache.drop_entry(&key),
            }
            result
        });
        handle
            .map(|joined| match joined {
                Ok(result) => result,
                Err(err) => Err(CoreError::internal(anyhow::anyhow!(
                    "judgement task aborted: {err}"
                ))),
            })
            .boxed()
            .shared()
    }
}

#[async_trait]
impl JudgementRepository for CachedJudgement {
    async fn determine_winner(
        &self,
        input: &JudgementInput,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, CoreError> {
        if !self.enabled {
            return self.inner.determine_winner(input, cancel).await;
        }
        let key = self.keys.key(input);
        // Lookup, in-flight registration and insert happen in one critical
        // section; the lock is never held across an await.
        let shared = {
            let mut store = self.cache.lock();
            let now = Instant::now();
            if let Some(entry) = store.get_mut(&key) {
                if let (Some(value), Some(expires_at)) = (&entry.value, entry.expires_at)
                    && expires_at > now
                {
                    if self.cache.log {
                        log::debug!("judgement cache hit {key}");
                    }
                    return Ok(value.clone());
                }
                if let Some(shared) = &entry.shared {
                    shared.clone()
                } else {
                    let shared = self.spawn_underlying(&key, input);
                    entry.shared = Some(shared.clone());
                    entry.value = None;
                    entry.expires_at = None;
                    shared
                }
            } else {
                let shared = self.spawn_underlying(&key, input);
                let entry = CacheEntry {
                    shared: Some(shared.clone()),
                    value: None,
                    expires_at: None,
                };
                if let Some(evicted) = store.insert(key.clone(), entry)
                    && self.cache.log
                {
                    log::debug!("judgement cache evicted {evicted}");
                }
                shared
            }
        };
        match cancel {
            Some(token) => {
                tokio::select! {
                    result = shared => result,
                    () = token.cancelled() => Err(CoreError::Cancelled),
                }
            }
            None => shared.await,
        }
    }
}
