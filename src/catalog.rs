//! Priority-ordered catalog of candidate backend models.
//!
//! The catalog is assembled once at startup and never mutated: tiers are
//! scanned best-quality first, and the flattened order is the default scan
//! order for the dispatch loop.

use serde::{Deserialize, Serialize};

/// A named priority bucket of interchangeable model ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub models: Vec<String>,
}

/// The flattened, tier-ordered model list plus a reverse tier lookup.
pub struct ModelCatalog {
    tiers: Vec<TierConfig>,
    ordered: Vec<String>,
}

impl ModelCatalog {
    /// Build a catalog from configured tiers, falling back to the built-in
    /// catalog when the config names none. The result is never empty.
    pub fn new(tiers: Vec<TierConfig>) -> Self {
        let tiers = if tiers.iter().any(|t| !t.models.is_empty()) {
            tiers
        } else {
            default_tiers()
        };
        let ordered = tiers.iter().flat_map(|t| t.models.iter().cloned()).collect();
        Self { tiers, ordered }
    }

    /// All candidate models, best tier first. Stable across calls.
    pub fn ordered_models(&self) -> &[String] {
        &self.ordered
    }

    /// The highest-priority catalog entry.
    pub fn first(&self) -> &str {
        &self.ordered[0]
    }

    /// Which tier a model belongs to. Informational only.
    pub fn tier_of(&self, model: &str) -> Option<&str> {
        self.tiers
            .iter()
            .find(|t| t.models.iter().any(|m| m == model))
            .map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }
}

/// Built-in catalog of free-tier endpoints, best quality first. The last
/// tiers are emergency picks: small or dated models that are rarely
/// saturated when everything above them is rate-limited.
fn default_tiers() -> Vec<TierConfig> {
    let tier = |name: &str, models: &[&str]| TierConfig {
        name: name.to_string(),
        models: models.iter().map(|m| m.to_string()).collect(),
    };

    vec![
        tier(
            "frontier",
            &[
                "deepseek/deepseek-chat-v3-0324:free",
                "deepseek/deepseek-r1:free",
                "qwen/qwen3-235b-a22b:free",
            ],
        ),
        tier(
            "strong",
            &[
                "meta-llama/llama-3.3-70b-instruct:free",
                "qwen/qwen-2.5-72b-instruct:free",
                "google/gemma-3-27b-it:free",
            ],
        ),
        tier(
            "standard",
            &[
                "mistralai/mistral-small-3.1-24b-instruct:free",
                "qwen/qwen3-14b:free",
                "thudm/glm-4-32b:free",
            ],
        ),
        tier(
            "light",
            &[
                "meta-llama/llama-3.2-3b-instruct:free",
                "google/gemma-3-4b-it:free",
                "mistralai/mistral-7b-instruct:free",
            ],
        ),
        tier(
            "emergency",
            &[
                "gryphe/mythomax-l2-13b:free",
                "huggingfaceh4/zephyr-7b-beta:free",
            ],
        ),
    ]
}
