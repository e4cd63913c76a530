//! Base judgement engines wrapped by the decorator stack.

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::config::ExecMode;
use crate::delay::DelayOption;
use crate::error::CoreError;
use crate::judgement::{decide, decide_by_power, normalize_judge_code};
use crate::model::{Reason, Verdict};
use crate::repo::{JudgementInput, JudgementRepository};
use crate::rng::UnitRng;

/// Plain power comparison with no bias and no RNG involvement.
pub struct PowerJudgement {
    delay: DelayOption,
    mode: ExecMode,
    rng: UnitRng,
}

impl PowerJudgement {
    pub fn new(delay: DelayOption, mode: ExecMode, rng: UnitRng) -> Self {
        Self { delay, mode, rng }
    }
}

#[async_trait]
impl JudgementRepository for PowerJudgement {
    async fn determine_winner(
        &self,
        input: &JudgementInput,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, CoreError> {
        self.delay.apply(self.mode, &self.rng, cancel).await?;
        let yono = input.battle.yono.power;
        let komae = input.battle.komae.power;
        Ok(Verdict {
            winner: decide_by_power(yono, komae),
            reason: Reason::Power,
            judge_code: normalize_judge_code(&input.judge.code_name),
            rng: None,
            power_diff: yono - komae,
        })
    }
}

/// Probabilistic engine: samples the injected RNG once per call and applies
/// the judge-code bias table.
pub struct BiasedJudgement {
    delay: DelayOption,
    mode: ExecMode,
    rng: UnitRng,
}

impl BiasedJudgement {
    pub fn new(delay: DelayOption, mode: ExecMode, rng: UnitRng) -> Self {
        Self { delay, mode, rng }
    }
}

#[async_trait]
impl JudgementRepository for BiasedJudgement {
    async fn determine_winner(
        &self,
        input: &JudgementInput,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, CoreError> {
        self.delay.apply(self.mode, &self.rng, cancel).await?;
        let yono = input.battle.yono.power;
        let komae = input.battle.komae.power;
        let sample = self.rng.sample();
        let decision = decide(&input.judge.code_name, sample, yono, komae);
        Ok(Verdict {
            winner: decision.winner,
            reason: decision.reason,
            judge_code: normalize_judge_code(&input.judge.code_name),
            rng: Some(sample),
            power_diff: yono - komae,
        })
    }
}
