//! Provider configuration for external AI engines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported AI engine CLIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// The `claude` CLI.
    Claude,
    /// The `codex` CLI.
    Codex,
}

impl Engine {
    /// The executable name of the engine CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::Claude
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable provider configuration.
///
/// Identity is value-equality over all fields; `priority` is used purely
/// for tie-breaking during routing (higher wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Engine CLI backing this provider.
    #[serde(default)]
    pub engine: Engine,

    /// Model name or tier alias (e.g. "opus", "sonnet", "gpt-5.3-codex").
    #[serde(default = "default_provider_model")]
    pub model: String,

    /// Environment variable holding the API key, empty when not required.
    #[serde(default)]
    pub api_key_env: String,

    /// Custom endpoint URL, empty for the engine default.
    #[serde(default)]
    pub endpoint: String,

    /// Tie-breaking priority; higher wins.
    #[serde(default)]
    pub priority: i32,
}

fn default_provider_model() -> String {
    "opus".to_string()
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            model: default_provider_model(),
            api_key_env: String::new(),
            endpoint: String::new(),
            priority: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_is_claude_opus() {
        let provider = Provider::default();
        assert_eq!(provider.engine, Engine::Claude);
        assert_eq!(provider.model, "opus");
        assert_eq!(provider.priority, 0);
    }

    #[test]
    fn test_provider_value_equality() {
        let a = Provider::default();
        let mut b = Provider::default();
        assert_eq!(a, b);

        b.priority = 1;
        assert_ne!(a, b, "priority participates in identity");
    }

    #[test]
    fn test_engine_yaml_roundtrip() {
        let engine: Engine = serde_yaml::from_str("codex").unwrap();
        assert_eq!(engine, Engine::Codex);
        assert_eq!(serde_yaml::to_string(&engine).unwrap().trim(), "codex");
    }
}
