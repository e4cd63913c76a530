//! Core data model: battles, contestants, judges and verdicts.

use serde::{Deserialize, Serialize};

/// Lifecycle tag gating seed visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Draft,
    Review,
    Published,
    Archived,
}

impl PublishState {
    pub const ALL: [PublishState; 4] = [
        PublishState::Draft,
        PublishState::Review,
        PublishState::Published,
        PublishState::Archived,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PublishState::Draft => "draft",
            PublishState::Review => "review",
            PublishState::Published => "published",
            PublishState::Archived => "archived",
        }
    }

    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

/// Narrative weight tier of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Low,
    Medium,
    High,
    Legendary,
}

impl Significance {
    pub const ALL: [Significance; 4] = [
        Significance::Low,
        Significance::Medium,
        Significance::High,
        Significance::Legendary,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Significance::Low => "low",
            Significance::Medium => "medium",
            Significance::High => "high",
            Significance::Legendary => "legendary",
        }
    }

    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

/// A contestant descriptor. `power` is unitless and unbounded; it is used
/// only as comparison input to judgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neta {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub power: f64,
}

impl Neta {
    #[must_use]
    pub fn new(title: impl Into<String>, power: f64) -> Self {
        Self {
            title: title.into(),
            subtitle: String::new(),
            description: String::new(),
            image_url: None,
            power,
        }
    }
}

/// An immutable battle report record. Once validated by the seed loader,
/// every required field is present and typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub narrative: String,
    pub theme_id: String,
    pub significance: Significance,
    pub publish_state: PublishState,
    pub yono: Neta,
    pub komae: Neta,
}

/// Identity of a judge. `code_name` selects the probabilistic bias rule and
/// is matched case-insensitively after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeIdentity {
    pub id: String,
    pub name: String,
    pub code_name: String,
}

impl JudgeIdentity {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        code_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code_name: code_name.into(),
        }
    }
}

/// Which side a verdict favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Winner {
    Yono,
    Komae,
    Draw,
}

/// Whether the verdict came from a bias rule or a plain power comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    BiasHit,
    Power,
}

/// Produced once per judgement call; immutable and safe to cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub winner: Winner,
    pub reason: Reason,
    pub judge_code: String,
    pub rng: Option<f64>,
    pub power_diff: f64,
}

/// Narrows report generation by theme, significance, publish state or id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleFilter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub significance: Option<Significance>,
    #[serde(default)]
    pub publish_state: Option<PublishState>,
}

impl BattleFilter {
    #[must_use]
    pub fn matches(&self, battle: &Battle) -> bool {
        self.id.as_ref().is_none_or(|id| *id == battle.id)
            && self
                .theme_id
                .as_ref()
                .is_none_or(|theme| *theme == battle.theme_id)
            && self
                .significance
                .is_none_or(|tier| tier == battle.significance)
            && self
                .publish_state
                .is_none_or(|state| state == battle.publish_state)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.theme_id.is_none()
            && self.significance.is_none()
            && self.publish_state.is_none()
    }

    /// Stable key for memoising filter-shaped lookups.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.id.as_deref().unwrap_or("*"),
            self.theme_id.as_deref().unwrap_or("*"),
            self.significance.map_or("*", Significance::as_str),
            self.publish_state.map_or("*", PublishState::as_str),
        )
    }
}
