//! Seed prompt analysis produced by the bootstrap.

use serde::{Deserialize, Serialize};

/// Assessed project complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Few features, no heavy indicators.
    Simple,
    /// Moderate feature count.
    Medium,
    /// Many features or heavyweight indicators (ML, distributed, ...).
    Complex,
}

impl Complexity {
    /// The complexity's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic analysis of a seed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAnalysis {
    /// Detected project domain (saas, ecommerce, content, marketplace,
    /// devtool, mobile-app).
    pub domain: String,

    /// Who the target customer is.
    pub target_audience: String,

    /// Inferred key features, capped at eight.
    pub key_features: Vec<String>,

    /// Assessed complexity.
    pub complexity: Complexity,

    /// Whether the project needs a user interface.
    pub needs_ui: bool,

    /// Whether the project needs pricing/payment.
    pub needs_monetization: bool,

    /// Whether the project needs marketing strategy.
    pub needs_marketing: bool,

    /// Company name synthesized from the seed.
    pub company_name: String,
}
