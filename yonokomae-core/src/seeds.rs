//! Seed discovery, filtering, deterministic selection and validation.
//!
//! The data source is an opaque keyed record store reachable via logical
//! "root" strings; the same underlying record set may be exposed under a
//! legacy and a current root namespace.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{CoreError, ValidationFailure, ValidationIssue};
use crate::model::{Battle, PublishState, Significance};
use crate::rng::UnitRng;

/// Opaque keyed record store.
pub trait SeedSource: Send + Sync {
    /// File names under a logical root. Order is not significant; the loader
    /// sorts lexicographically before indexing. Unknown roots yield an empty
    /// list.
    fn list(&self, root: &str) -> Vec<String>;

    /// Raw record under `root`/`file`, if present.
    fn read(&self, root: &str, file: &str) -> Option<Value>;
}

/// In-memory seed store for embedded packs and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemorySeedSource {
    roots: BTreeMap<String, BTreeMap<String, Value>>,
}

impl InMemorySeedSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, root: &str, file: &str, record: Value) {
        self.roots
            .entry(root.to_string())
            .or_default()
            .insert(file.to_string(), record);
    }

    /// Convenience for seeding already-typed battles.
    ///
    /// # Panics
    ///
    /// Never panics: `Battle` always serializes.
    pub fn insert_battle(&mut self, root: &str, file: &str, battle: &Battle) {
        let value = serde_json::to_value(battle).expect("battle serializes");
        self.insert(root, file, value);
    }
}

impl SeedSource for InMemorySeedSource {
    fn list(&self, root: &str) -> Vec<String> {
        self.roots
            .get(root)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read(&self, root: &str, file: &str) -> Option<Value> {
        self.roots.get(root)?.get(file).cloned()
    }
}

/// Composable record predicate.
pub type BattlePredicate = Arc<dyn Fn(&Battle) -> bool + Send + Sync>;

/// One `load_one` request.
#[derive(Clone)]
pub struct LoadRequest {
    pub roots: Vec<String>,
    pub file: Option<String>,
    pub predicate: Option<BattlePredicate>,
    pub published_only: bool,
}

impl LoadRequest {
    #[must_use]
    pub fn new(roots: Vec<String>) -> Self {
        Self {
            roots,
            file: None,
            predicate: None,
            published_only: false,
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&Battle) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn published_only(mut self, gate: bool) -> Self {
        self.published_only = gate;
        self
    }

    fn admits(&self, battle: &Battle) -> bool {
        if self.published_only && battle.publish_state != PublishState::Published {
            return false;
        }
        self.predicate.as_ref().is_none_or(|pred| pred(battle))
    }
}

/// Deterministic-or-random seed selection over a `SeedSource`.
#[derive(Clone)]
pub struct SeedLoader {
    source: Arc<dyn SeedSource>,
    rng: UnitRng,
}

impl SeedLoader {
    pub fn new(source: Arc<dyn SeedSource>, rng: UnitRng) -> Self {
        Self { source, rng }
    }

    /// Resolves exactly one validated battle for `request`.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` when no candidate matches the requested
    /// root/file/predicate/publish-state combination, and
    /// `CoreError::Validation` when a selected record fails the schema.
    /// An explicitly named file is never silently substituted.
    pub fn load_one(&self, request: &LoadRequest) -> Result<Battle, CoreError> {
        match &request.file {
            Some(file) => self.load_named(request, file),
            None => self.load_random(request),
        }
    }

    fn load_named(&self, request: &LoadRequest, file: &str) -> Result<Battle, CoreError> {
        for root in &request.roots {
            let Some(value) = self.source.read(root, file) else {
                continue;
            };
            let battle = validate_battle(&value).map_err(CoreError::Validation)?;
            if !request.admits(&battle) {
                return Err(CoreError::NotFound(format!(
                    "seed `{file}` under root `{root}` does not satisfy the requested filter"
                )));
            }
            return Ok(battle);
        }
        Err(CoreError::NotFound(format!(
            "seed `{file}` not found under roots {:?}",
            request.roots
        )))
    }

    fn load_random(&self, request: &LoadRequest) -> Result<Battle, CoreError> {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for root in &request.roots {
            let mut files = self.source.list(root);
            files.sort();
            for file in files {
                // First root wins when the same file name exists under a
                // legacy and a current namespace.
                if !seen.insert(file.clone()) {
                    continue;
                }
                let Some(value) = self.source.read(root, &file) else {
                    continue;
                };
                let battle = match validate_battle(&value) {
                    Ok(battle) => battle,
                    Err(failure) => {
                        log::warn!("skipping invalid seed {root}/{file}: {failure}");
                        continue;
                    }
                };
                if request.admits(&battle) {
                    matched.push(battle);
                }
            }
        }
        if matched.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no battle seed matched under roots {:?}",
                request.roots
            )));
        }
        let idx = ((self.rng.sample() * matched.len() as f64) as usize).min(matched.len() - 1);
        Ok(matched.swap_remove(idx))
    }
}

/// Validates a raw record into a `Battle`, collecting every field-level
/// issue rather than stopping at the first one.
///
/// # Errors
///
/// Returns the full `(path, message)` issue list when the record does not
/// satisfy the schema.
pub fn validate_battle(value: &Value) -> Result<Battle, ValidationFailure> {
    let mut issues = Vec::new();
    let Some(record) = value.as_object() else {
        return Err(ValidationFailure {
            issues: vec![ValidationIssue::new("", "expected a JSON object")],
        });
    };

    for field in ["id", "title", "themeId"] {
        match record.get(field) {
            Some(Value::String(text)) if !text.trim().is_empty() => {}
            Some(Value::String(_)) => {
                issues.push(ValidationIssue::new(field, "must not be empty"));
            }
            Some(_) => issues.push(ValidationIssue::new(field, "expected a string")),
            None => issues.push(ValidationIssue::new(field, "missing required field")),
        }
    }

    check_enum(record.get("significance"), "significance", &mut issues, |s| {
        Significance::parse(s).is_some()
    });
    check_enum(record.get("publishState"), "publishState", &mut issues, |s| {
        PublishState::parse(s).is_some()
    });

    check_neta(record.get("yono"), "yono", &mut issues);
    check_neta(record.get("komae"), "komae", &mut issues);

    if !issues.is_empty() {
        return Err(ValidationFailure { issues });
    }

    serde_json::from_value(value.clone()).map_err(|err| ValidationFailure {
        issues: vec![ValidationIssue::new("", err.to_string())],
    })
}

fn check_enum(
    value: Option<&Value>,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
    accepts: impl Fn(&str) -> bool,
) {
    match value {
        Some(Value::String(label)) if accepts(label) => {}
        Some(Value::String(label)) => {
            issues.push(ValidationIssue::new(path, format!("unknown value `{label}`")));
        }
        Some(_) => issues.push(ValidationIssue::new(path, "expected a string")),
        None => issues.push(ValidationIssue::new(path, "missing required field")),
    }
}

fn check_neta(value: Option<&Value>, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(value) = value else {
        issues.push(ValidationIssue::new(path, "missing required field"));
        return;
    };
    let Some(neta) = value.as_object() else {
        issues.push(ValidationIssue::new(path, "expected an object"));
        return;
    };
    match neta.get("title") {
        Some(Value::String(text)) if !text.trim().is_empty() => {}
        Some(Value::String(_)) => {
            issues.push(ValidationIssue::new(format!("{path}.title"), "must not be empty"));
        }
        Some(_) => issues.push(ValidationIssue::new(format!("{path}.title"), "expected a string")),
        None => issues.push(ValidationIssue::new(
            format!("{path}.title"),
            "missing required field",
        )),
    }
    match neta.get("power") {
        Some(Value::Number(_)) => {}
        Some(_) => issues.push(ValidationIssue::new(format!("{path}.power"), "expected a number")),
        None => issues.push(ValidationIssue::new(
            format!("{path}.power"),
            "missing required field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Neta;
    use serde_json::json;

    fn battle(id: &str, theme: &str, state: PublishState, tier: Significance) -> Battle {
        Battle {
            id: id.to_string(),
            title: format!("Battle {id}"),
            subtitle: String::new(),
            overview: String::new(),
            narrative: String::new(),
            theme_id: theme.to_string(),
            significance: tier,
            publish_state: state,
            yono: Neta::new("Yono", 50.0),
            komae: Neta::new("Komae", 48.0),
        }
    }

    fn loader_with(battles: &[(&str, &str, &Battle)], rng: UnitRng) -> SeedLoader {
        let mut source = InMemorySeedSource::new();
        for (root, file, battle) in battles {
            source.insert_battle(root, file, battle);
        }
        SeedLoader::new(Arc::new(source), rng)
    }

    #[test]
    fn explicit_file_is_probed_across_roots_in_order() {
        let legacy = battle("legacy-one", "history", PublishState::Published, Significance::Low);
        let current = battle("current-one", "history", PublishState::Published, Significance::Low);
        let loader = loader_with(
            &[
                ("battle/themes", "one.json", &legacy),
                ("battle", "one.json", &current),
            ],
            UnitRng::fixed(0.0),
        );
        let request =
            LoadRequest::new(vec!["battle/themes".to_string(), "battle".to_string()])
                .with_file("one.json");
        assert_eq!(loader.load_one(&request).unwrap().id, "legacy-one");
    }

    #[test]
    fn explicit_file_failing_predicate_is_not_found_never_substituted() {
        let named = battle("named", "history", PublishState::Published, Significance::Low);
        let other = battle("other", "technology", PublishState::Published, Significance::Low);
        let loader = loader_with(
            &[("battle", "named.json", &named), ("battle", "other.json", &other)],
            UnitRng::fixed(0.0),
        );
        let request = LoadRequest::new(vec!["battle".to_string()])
            .with_file("named.json")
            .with_predicate(|b| b.theme_id == "technology");
        let err = loader.load_one(&request).unwrap_err();
        assert!(err.is_not_found(), "got {err}");
    }

    #[test]
    fn missing_file_is_not_found() {
        let loader = loader_with(&[], UnitRng::fixed(0.0));
        let request = LoadRequest::new(vec!["battle".to_string()]).with_file("nope.json");
        assert!(loader.load_one(&request).unwrap_err().is_not_found());
    }

    #[test]
    fn published_gate_rejects_even_when_predicate_matches() {
        let draft = battle("draft-tech", "technology", PublishState::Draft, Significance::Low);
        let loader = loader_with(&[("battle", "draft.json", &draft)], UnitRng::fixed(0.0));
        let request = LoadRequest::new(vec!["battle".to_string()])
            .with_predicate(|b| b.theme_id == "technology")
            .published_only(true);
        assert!(loader.load_one(&request).unwrap_err().is_not_found());
    }

    #[test]
    fn rng_zero_selects_first_sorted_candidate() {
        let a = battle("alpha", "history", PublishState::Published, Significance::Low);
        let b = battle("beta", "history", PublishState::Published, Significance::Low);
        let c = battle("gamma", "history", PublishState::Published, Significance::Low);
        // Insertion order deliberately scrambled; sorting decides.
        let loader = loader_with(
            &[
                ("battle", "c.json", &c),
                ("battle", "a.json", &a),
                ("battle", "b.json", &b),
            ],
            UnitRng::fixed(0.0),
        );
        let request = LoadRequest::new(vec!["battle".to_string()]);
        assert_eq!(loader.load_one(&request).unwrap().id, "alpha");
    }

    #[test]
    fn filtered_selection_matches_the_documented_scenario() {
        let pub_history = battle(
            "pub-history-low",
            "history",
            PublishState::Published,
            Significance::Low,
        );
        let rev_tech = battle(
            "rev-tech-medium",
            "technology",
            PublishState::Review,
            Significance::Medium,
        );
        let loader = loader_with(
            &[
                ("battle", "pub-history-low.json", &pub_history),
                ("battle", "rev-tech-medium.json", &rev_tech),
            ],
            UnitRng::fixed(0.0),
        );
        let request = LoadRequest::new(vec!["battle".to_string()]).with_predicate(|b| {
            b.publish_state == PublishState::Review && b.theme_id == "technology"
        });
        assert_eq!(loader.load_one(&request).unwrap().id, "rev-tech-medium");
    }

    #[test]
    fn empty_filtered_set_is_not_found() {
        let a = battle("alpha", "history", PublishState::Published, Significance::Low);
        let loader = loader_with(&[("battle", "a.json", &a)], UnitRng::fixed(0.0));
        let request =
            LoadRequest::new(vec!["battle".to_string()]).with_predicate(|b| b.theme_id == "sports");
        assert!(loader.load_one(&request).unwrap_err().is_not_found());
    }

    #[test]
    fn duplicate_file_names_count_once_with_first_root_winning() {
        let legacy = battle("legacy", "history", PublishState::Published, Significance::Low);
        let current = battle("current", "history", PublishState::Published, Significance::Low);
        let loader = loader_with(
            &[
                ("battle/themes", "same.json", &legacy),
                ("battle", "same.json", &current),
            ],
            UnitRng::fixed(0.0),
        );
        let request =
            LoadRequest::new(vec!["battle/themes".to_string(), "battle".to_string()]);
        assert_eq!(loader.load_one(&request).unwrap().id, "legacy");
    }

    #[test]
    fn explicit_file_validation_failure_is_distinct_from_not_found() {
        let mut source = InMemorySeedSource::new();
        source.insert(
            "battle",
            "broken.json",
            json!({
                "id": "broken",
                "title": "Broken",
                "themeId": "history",
                "significance": "low",
                "publishState": "live",
                "yono": { "title": "Yono", "power": 1.0 },
                "komae": { "title": "Komae" }
            }),
        );
        let loader = SeedLoader::new(Arc::new(source), UnitRng::fixed(0.0));
        let request = LoadRequest::new(vec!["battle".to_string()]).with_file("broken.json");
        let err = loader.load_one(&request).unwrap_err();
        let CoreError::Validation(failure) = err else {
            panic!("expected validation error, got {err}");
        };
        let paths: Vec<_> = failure.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["publishState", "komae.power"]);
    }

    #[test]
    fn random_path_skips_invalid_records() {
        let good = battle("good", "history", PublishState::Published, Significance::Low);
        let mut source = InMemorySeedSource::new();
        source.insert("battle", "a-broken.json", json!({ "id": 7 }));
        source.insert_battle("battle", "b-good.json", &good);
        let loader = SeedLoader::new(Arc::new(source), UnitRng::fixed(0.0));
        let request = LoadRequest::new(vec!["battle".to_string()]);
        assert_eq!(loader.load_one(&request).unwrap().id, "good");
    }

    #[test]
    fn validator_collects_every_issue() {
        let err = validate_battle(&json!({ "title": "", "yono": 3 })).unwrap_err();
        let paths: Vec<_> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"id"));
        assert!(paths.contains(&"title"));
        assert!(paths.contains(&"themeId"));
        assert!(paths.contains(&"significance"));
        assert!(paths.contains(&"publishState"));
        assert!(paths.contains(&"yono"));
        assert!(paths.contains(&"komae"));
    }
}
