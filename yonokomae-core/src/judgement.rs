//! Pure outcome judgement: power comparison plus judge-specific bias rules.
//!
//! No I/O, no caching, no delay. Those concerns live in the repository
//! decorators and the delay simulator.

use crate::model::{Reason, Winner};

/// Probability that codes `O`/`U` force a YONO win.
pub const YONO_BIAS_P: f64 = 0.20;
/// Probability that codes `S`/`C` force a KOMAE win.
pub const KOMAE_BIAS_P: f64 = 0.20;
/// Probability that code `KK` forces a KOMAE win.
pub const KK_KOMAE_P: f64 = 0.90;

/// Outcome of a single judgement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub winner: Winner,
    pub reason: Reason,
}

/// Canonical form of a judge code: trimmed and uppercased.
#[must_use]
pub fn normalize_judge_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Baseline rule: higher power wins, equal powers draw.
#[must_use]
pub fn decide_by_power(yono_power: f64, komae_power: f64) -> Winner {
    if yono_power > komae_power {
        Winner::Yono
    } else if yono_power < komae_power {
        Winner::Komae
    } else {
        Winner::Draw
    }
}

/// Applies the bias table for `judge_code`, falling back to the baseline
/// power comparison when no bias branch fires. `reason` is `BiasHit` exactly
/// when a branch fired, not merely when one was evaluated.
#[must_use]
pub fn decide(judge_code: &str, rng_sample: f64, yono_power: f64, komae_power: f64) -> Decision {
    let forced = match normalize_judge_code(judge_code).as_str() {
        "O" | "U" if rng_sample < YONO_BIAS_P => Some(Winner::Yono),
        "S" | "C" if rng_sample < KOMAE_BIAS_P => Some(Winner::Komae),
        "KK" if rng_sample < KK_KOMAE_P => Some(Winner::Komae),
        _ => None,
    };
    match forced {
        Some(winner) => Decision {
            winner,
            reason: Reason::BiasHit,
        },
        None => Decision {
            winner: decide_by_power(yono_power, komae_power),
            reason: Reason::Power,
        },
    }
}
