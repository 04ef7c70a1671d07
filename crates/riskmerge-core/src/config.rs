//! Consolidation run configuration.
//!
//! A [`ConsolidationConfig`] is built once by the caller (defaults, a
//! persisted TOML file, environment overrides) and passed by reference into a
//! run. Nothing in the engine reads configuration from anywhere else.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::risk::Tier;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_TITLE_WEIGHT: f64 = 0.4;
pub const DEFAULT_DESCRIPTION_WEIGHT: f64 = 0.4;
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 0.2;

/// Forced classification for one incoming/candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideVerdict {
    /// Treat the pair as duplicates regardless of score.
    Duplicate,
    /// Never match the pair, even above threshold.
    Distinct,
}

/// A caller-supplied classification for a specific pair.
///
/// `incoming_id` names a risk from the tier being folded in (restricted to
/// `tier` when set). `candidate_id` names a risk already in the result set,
/// restricted to entries seeded by `candidate_tier` when set. Ids are only
/// unique within a tier, so set `candidate_tier` whenever two tiers share an
/// id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    pub incoming_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_tier: Option<Tier>,
    pub candidate_id: u64,
    pub verdict: OverrideVerdict,
}

impl ManualOverride {
    /// Whether this override names the given pair. A `None` on either side
    /// of a tier comparison matches any tier.
    pub fn applies_to(
        &self,
        tier: Option<Tier>,
        incoming_id: u64,
        candidate_tier: Option<Tier>,
        candidate_id: u64,
    ) -> bool {
        tier_matches(self.tier, tier)
            && tier_matches(self.candidate_tier, candidate_tier)
            && self.incoming_id == incoming_id
            && self.candidate_id == candidate_id
    }
}

fn tier_matches(want: Option<Tier>, got: Option<Tier>) -> bool {
    match (want, got) {
        (Some(want), Some(got)) => want == got,
        _ => true,
    }
}

/// Field weights normalised to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub title: f64,
    pub description: f64,
    pub category: f64,
}

/// Per-run consolidation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Duplicates must meet or exceed this overall similarity.
    pub similarity_threshold: f64,
    pub title_weight: f64,
    pub description_weight: f64,
    pub category_weight: f64,
    /// Honour `overrides`. When false they are ignored.
    pub enable_manual_overrides: bool,
    pub overrides: Vec<ManualOverride>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            title_weight: DEFAULT_TITLE_WEIGHT,
            description_weight: DEFAULT_DESCRIPTION_WEIGHT,
            category_weight: DEFAULT_CATEGORY_WEIGHT,
            enable_manual_overrides: false,
            overrides: Vec::new(),
        }
    }
}

impl ConsolidationConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that scoring is well defined under this config.
    ///
    /// The threshold must lie in [0, 1], every weight must be finite and
    /// non-negative, and at least one weight must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.similarity_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::ThresholdOutOfRange(t));
        }

        for (field, value) in [
            ("title_weight", self.title_weight),
            ("description_weight", self.description_weight),
            ("category_weight", self.category_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { field, value });
            }
        }

        if self.title_weight + self.description_weight + self.category_weight <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }
        Ok(())
    }

    /// Weights divided by their sum. All zero when the sum is not positive.
    pub fn weights(&self) -> Weights {
        let sum = self.title_weight + self.description_weight + self.category_weight;
        if !sum.is_finite() || sum <= 0.0 {
            return Weights {
                title: 0.0,
                description: 0.0,
                category: 0.0,
            };
        }
        Weights {
            title: self.title_weight / sum,
            description: self.description_weight / sum,
            category: self.category_weight / sum,
        }
    }

    /// The first active override naming the pair, if any.
    pub fn override_for(
        &self,
        tier: Option<Tier>,
        incoming_id: u64,
        candidate_tier: Option<Tier>,
        candidate_id: u64,
    ) -> Option<OverrideVerdict> {
        if !self.enable_manual_overrides {
            return None;
        }
        self.overrides
            .iter()
            .find(|o| o.applies_to(tier, incoming_id, candidate_tier, candidate_id))
            .map(|o| o.verdict)
    }
}
