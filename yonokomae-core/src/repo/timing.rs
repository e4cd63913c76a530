//! Timing and duplicate-invocation instrumentation.
//!
//! Purely observational: never alters control flow, results or timing.

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use twox_hash::XxHash64;

use crate::cancel::CancelToken;
use crate::error::CoreError;
use crate::model::Verdict;
use crate::repo::cache::KeyStrategy;
use crate::repo::{JudgementInput, JudgementRepository};

const LABEL_SEED: u64 = 0x594b; // "YK"

/// Short deterministic label for a canonical request key.
#[must_use]
pub fn key_label(key: &str) -> String {
    let mut hasher = XxHash64::with_seed(LABEL_SEED);
    hasher.write(key.as_bytes());
    format!("{:08x}", hasher.finish() as u32)
}

/// Wraps a judgement engine, logging wall-clock duration per call and
/// flagging repeated invocations of the same key.
pub struct TimedJudgement {
    inner: Arc<dyn JudgementRepository>,
    keys: KeyStrategy,
    seen: Mutex<HashMap<String, u32>>,
}

impl TimedJudgement {
    pub fn new(inner: Arc<dyn JudgementRepository>, keys: KeyStrategy) -> Self {
        Self {
            inner,
            keys,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// How many times this input's key has been observed so far.
    #[must_use]
    pub fn observed_calls(&self, input: &JudgementInput) -> u32 {
        let label = key_label(&self.keys.key(input));
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&label)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl JudgementRepository for TimedJudgement {
    async fn determine_winner(
        &self,
        input: &JudgementInput,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, CoreError> {
        let label = key_label(&self.keys.key(input));
        let count = {
            let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            let count = seen.entry(label.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let started = Instant::now();
        let result = self.inner.determine_winner(input, cancel).await;
        let elapsed_ms = started.elapsed().as_millis();
        if count > 1 {
            log::debug!("judgement {label} took {elapsed_ms}ms (call #{count}, repeat)");
        } else {
            log::debug!("judgement {label} took {elapsed_ms}ms");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecMode;
    use crate::delay::DelayOption;
    use crate::model::{Battle, JudgeIdentity, Neta, PublishState, Reason, Significance, Winner};
    use crate::repo::engines::PowerJudgement;
    use crate::rng::UnitRng;

    fn input() -> JudgementInput {
        JudgementInput {
            battle: Battle {
                id: "b-1".to_string(),
                title: "T".to_string(),
                subtitle: String::new(),
                overview: String::new(),
                narrative: String::new(),
                theme_id: "history".to_string(),
                significance: Significance::Low,
                publish_state: PublishState::Published,
                yono: Neta::new("Yono", 60.0),
                komae: Neta::new("Komae", 40.0),
            },
            judge: JudgeIdentity::new("j-1", "Judge", "X"),
        }
    }

    #[test]
    fn labels_are_short_and_deterministic() {
        let label = key_label("j-1::b-1");
        assert_eq!(label.len(), 8);
        assert_eq!(label, key_label("j-1::b-1"));
        assert_ne!(label, key_label("j-1::b-2"));
    }

    #[tokio::test]
    async fn timing_is_transparent_and_counts_repeats() {
        let engine = Arc::new(PowerJudgement::new(
            DelayOption::NONE,
            ExecMode::Test,
            UnitRng::fixed(0.0),
        ));
        let timed = TimedJudgement::new(engine, KeyStrategy::PerBattleJudge);
        let input = input();
        assert_eq!(timed.observed_calls(&input), 0);

        let first = timed.determine_winner(&input, None).await.unwrap();
        assert_eq!(first.winner, Winner::Yono);
        assert_eq!(first.reason, Reason::Power);
        assert_eq!(timed.observed_calls(&input), 1);

        let second = timed.determine_winner(&input, None).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(timed.observed_calls(&input), 2);
    }
}
