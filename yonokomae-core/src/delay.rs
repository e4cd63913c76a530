//! Artificial latency windows used by every report generator and judge.

use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::ExecMode;
use crate::error::CoreError;
use crate::rng::UnitRng;

/// Hard ceiling on any simulated delay.
pub const MAX_DELAY_MS: u64 = 5_000;

/// Either a fixed millisecond value or an inclusive `{min, max}` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOption {
    Fixed(u64),
    Range { min: u64, max: u64 },
}

impl DelayOption {
    pub const NONE: DelayOption = DelayOption::Fixed(0);

    /// Draws the delay for one call. Fixed values are clamped to
    /// `[0, MAX_DELAY_MS]`; ranges clamp `min` first, then force
    /// `max >= min`, and draw uniformly inclusive of both bounds.
    #[must_use]
    pub fn compute_delay_ms(&self, rng: &UnitRng) -> u64 {
        match *self {
            DelayOption::Fixed(ms) => clamp_ms(ms),
            DelayOption::Range { min, max } => {
                let min = clamp_ms(min);
                let max = clamp_ms(max).max(min);
                let span = max - min + 1;
                let offset = (rng.sample() * span as f64) as u64;
                min + offset.min(span - 1)
            }
        }
    }

    /// Waits out the drawn delay, or returns immediately in test mode.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Cancelled` when the caller's token fires before
    /// the delay elapses.
    pub async fn apply(
        &self,
        mode: ExecMode,
        rng: &UnitRng,
        cancel: Option<&CancelToken>,
    ) -> Result<(), CoreError> {
        if mode == ExecMode::Test {
            return Ok(());
        }
        if let Some(token) = cancel
            && token.is_cancelled()
        {
            return Err(CoreError::Cancelled);
        }
        let ms = self.compute_delay_ms(rng);
        if ms == 0 {
            return Ok(());
        }
        let wait = tokio::time::sleep(Duration::from_millis(ms));
        match cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => Err(CoreError::Cancelled),
                    () = wait => Ok(()),
                }
            }
            None => {
                wait.await;
                Ok(())
            }
        }
    }
}

fn clamp_ms(ms: u64) -> u64 {
    if ms > MAX_DELAY_MS {
        log::warn!("delay {ms}ms exceeds ceiling {MAX_DELAY_MS}ms, truncating");
        MAX_DELAY_MS
    } else {
        ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSource;

    #[test]
    fn fixed_delay_is_clamped_to_ceiling() {
        let rng = UnitRng::fixed(0.5);
        assert_eq!(DelayOption::Fixed(120).compute_delay_ms(&rng), 120);
        assert_eq!(DelayOption::Fixed(9_999).compute_delay_ms(&rng), MAX_DELAY_MS);
        assert_eq!(DelayOption::NONE.compute_delay_ms(&rng), 0);
    }

    #[test]
    fn range_draw_includes_both_bounds() {
        let range = DelayOption::Range { min: 10, max: 12 };
        assert_eq!(range.compute_delay_ms(&UnitRng::fixed(0.0)), 10);
        assert_eq!(range.compute_delay_ms(&UnitRng::fixed(0.999_999)), 12);
        assert_eq!(range.compute_delay_ms(&UnitRng::fixed(0.5)), 11);
    }

    #[test]
    fn range_clamps_min_first_then_orders_max() {
        let inverted = DelayOption::Range { min: 30, max: 5 };
        for sample in [0.0, 0.5, 0.999] {
            assert_eq!(inverted.compute_delay_ms(&UnitRng::fixed(sample)), 30);
        }
        let oversized = DelayOption::Range {
            min: 6_000,
            max: 9_000,
        };
        assert_eq!(
            oversized.compute_delay_ms(&UnitRng::fixed(0.0)),
            MAX_DELAY_MS
        );
    }

    #[tokio::test]
    async fn test_mode_skips_delays_entirely() {
        let rng = UnitRng::fixed(0.5);
        let delay = DelayOption::Fixed(MAX_DELAY_MS);
        delay.apply(ExecMode::Test, &rng, None).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_token_rejects_the_wait() {
        let rng = UnitRng::fixed(0.5);
        let (source, token) = CancelSource::new();
        source.cancel();
        let err = DelayOption::Fixed(MAX_DELAY_MS)
            .apply(ExecMode::Normal, &rng, Some(&token))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn zero_delay_resolves_without_sleeping() {
        let rng = UnitRng::fixed(0.0);
        DelayOption::NONE
            .apply(ExecMode::Normal, &rng, None)
            .await
            .unwrap();
    }
}
