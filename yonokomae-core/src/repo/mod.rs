//! Repository traits consumed by the presentation layer, their concrete
//! engines and the decorator stack composed around them.

pub mod cache;
pub mod engines;
pub mod factory;
pub mod generators;
pub mod timing;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::error::CoreError;
use crate::model::{Battle, BattleFilter, JudgeIdentity, Verdict};

/// One judgement request: the battle under dispute plus the judging identity.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgementInput {
    pub battle: Battle,
    pub judge: JudgeIdentity,
}

/// Produces one battle report per call.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// # Errors
    ///
    /// `NotFound` when no battle satisfies `filter`, `Cancelled` when the
    /// caller's token fires, `Validation`/`Internal` from the underlying
    /// source.
    async fn generate(
        &self,
        filter: &BattleFilter,
        cancel: Option<&CancelToken>,
    ) -> Result<Battle, CoreError>;
}

/// Decides a winner for one battle/judge pair.
#[async_trait]
pub trait JudgementRepository: Send + Sync {
    /// # Errors
    ///
    /// `Cancelled` when the caller's token fires; other failures propagate
    /// unchanged through the decorator stack.
    async fn determine_winner(
        &self,
        input: &JudgementInput,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, CoreError>;
}
