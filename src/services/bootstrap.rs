//! Seed prompt to company configuration, deterministically.
//!
//! Rule-based analysis of a seed prompt decides domain, audience,
//! features, complexity, and team composition. No AI-engine calls are
//! involved — bootstrapping is fast and reproducible. The role/persona/
//! layer/tier mappings are lookup tables so the policy stays auditable.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::domain::models::{
    AgentConfig, BudgetConfig, CompanyConfig, Complexity, FoundryConfig, GuardrailConfig,
    ModelTier, OrgConfig, PersonaRef, Provider, RuntimeConfig, SeedAnalysis, WorkflowConfig,
};

const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "saas",
        &["saas", "subscription", "dashboard", "analytics", "tracking", "management", "platform", "tool", "app"],
    ),
    (
        "ecommerce",
        &["shop", "store", "ecommerce", "e-commerce", "sell", "marketplace", "product listing"],
    ),
    ("content", &["blog", "content", "media", "publishing", "newsletter", "cms"]),
    (
        "marketplace",
        &["marketplace", "two-sided", "matching", "connect buyers", "connect sellers"],
    ),
    (
        "devtool",
        &["developer", "api", "sdk", "cli", "library", "framework", "devtool", "open source"],
    ),
    ("mobile-app", &["mobile", "ios", "android", "app store"]),
];

const AUDIENCE_KEYWORDS: &[(&str, &[&str])] = &[
    ("freelancers", &["freelancer", "freelance", "independent"]),
    ("small businesses", &["small business", "smb", "startup", "small team"]),
    ("enterprises", &["enterprise", "corporate", "large organization"]),
    ("developers", &["developer", "programmer", "engineer", "devs"]),
    ("creators", &["creator", "artist", "designer", "content creator"]),
    ("students", &["student", "education", "learning", "academic"]),
    ("general consumers", &["consumer", "everyone", "personal", "individual"]),
];

const FEATURE_KEYWORDS: &[(&str, &[&str])] = &[
    ("Real-time notifications", &["real-time", "notification", "alert"]),
    ("Analytics dashboard", &["analytics", "metrics", "reporting", "tracking"]),
    ("Team collaboration", &["team", "collaboration", "shared", "multi-user"]),
    ("API integration", &["api", "integration", "connect", "webhook"]),
    ("Mobile responsive", &["mobile", "responsive", "cross-platform"]),
    ("Payment processing", &["payment", "billing", "subscription", "pricing"]),
    ("Search functionality", &["search", "filter", "find"]),
    ("Export and reporting", &["export", "report", "csv", "pdf"]),
];

const DOMAIN_DEFAULT_FEATURES: &[(&str, &[&str])] = &[
    ("saas", &["User authentication", "Dashboard", "Data management"]),
    ("ecommerce", &["Product catalog", "Shopping cart", "Payment processing"]),
    ("content", &["Content editor", "Publishing workflow", "SEO optimization"]),
    ("devtool", &["CLI interface", "API documentation", "Package management"]),
    ("marketplace", &["User profiles", "Search and discovery", "Transaction management"]),
    ("mobile-app", &["User authentication", "Push notifications", "Offline support"]),
];

const COMPLEXITY_INDICATORS: &[&str] =
    &["enterprise", "real-time", "machine learning", "ai", "blockchain", "distributed"];

const NO_UI_INDICATORS: &[&str] = &["api", "cli", "sdk", "library", "backend", "service"];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "for", "to", "and", "or", "in", "on", "at", "by", "with", "that", "this",
    "is", "build", "create", "make", "develop",
];

const MAX_FEATURES: usize = 8;

// Word-boundary patterns avoid false matches (e.g. "free" in "freelancer").
static FREE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\bopen source\b", r"\bfree\b", r"\bnon-profit\b", r"\binternal tool\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static NO_MARKETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\binternal\b", r"\bprivate\b", r"\bpersonal\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Roles every company gets regardless of analysis.
const MINIMUM_ROLES: &[&str] = &["ceo", "fullstack", "devops"];

/// Conditional roles: each pairs a role with the predicate that earns it
/// a seat.
const ROLE_CONDITIONS: &[(&str, fn(&SeedAnalysis) -> bool)] = &[
    ("critic", |a| matches!(a.complexity, Complexity::Medium | Complexity::Complex)),
    ("cto", |a| a.complexity == Complexity::Complex),
    ("product", |a| a.needs_ui),
    ("ui", |a| a.needs_ui),
    ("interaction", |a| a.needs_ui && a.complexity == Complexity::Complex),
    ("qa", |a| matches!(a.complexity, Complexity::Medium | Complexity::Complex)),
    ("marketing", |a| a.needs_marketing),
    ("operations", |a| a.needs_marketing),
    ("sales", |a| a.needs_monetization),
    ("cfo", |a| a.needs_monetization),
    ("research", |a| matches!(a.complexity, Complexity::Medium | Complexity::Complex)),
];

const ROLE_TO_PERSONA: &[(&str, &str)] = &[
    ("ceo", "jeff-bezos"),
    ("cto", "werner-vogels"),
    ("critic", "charlie-munger"),
    ("product", "don-norman"),
    ("ui", "matias-duarte"),
    ("interaction", "alan-cooper"),
    ("fullstack", "dhh"),
    ("qa", "james-bach"),
    ("devops", "kelsey-hightower"),
    ("marketing", "seth-godin"),
    ("operations", "paul-graham"),
    ("sales", "aaron-ross"),
    ("cfo", "patrick-campbell"),
    ("research", "ben-thompson"),
];

const ROLE_LAYERS: &[(&str, &str)] = &[
    ("ceo", "strategy"),
    ("cto", "strategy"),
    ("critic", "strategy"),
    ("product", "product"),
    ("ui", "product"),
    ("interaction", "product"),
    ("fullstack", "engineering"),
    ("qa", "engineering"),
    ("devops", "engineering"),
    ("marketing", "business"),
    ("operations", "business"),
    ("sales", "business"),
    ("cfo", "business"),
    ("research", "intelligence"),
];

const ROLE_MODELS: &[(&str, ModelTier)] = &[
    ("ceo", ModelTier::Opus),
    ("cto", ModelTier::Opus),
    ("critic", ModelTier::Opus),
    ("research", ModelTier::Opus),
    ("product", ModelTier::Sonnet),
    ("ui", ModelTier::Sonnet),
    ("interaction", ModelTier::Sonnet),
    ("fullstack", ModelTier::Sonnet),
    ("qa", ModelTier::Sonnet),
    ("devops", ModelTier::Sonnet),
    ("marketing", ModelTier::Sonnet),
    ("operations", ModelTier::Sonnet),
    ("sales", ModelTier::Haiku),
    ("cfo", ModelTier::Sonnet),
];

/// Workflow YAML role names mapped to internal role identifiers.
const WORKFLOW_ROLE_ALIASES: &[(&str, &str)] = &[
    ("research-analyst", "research"),
    ("product-designer", "product"),
    ("interaction-designer", "interaction"),
    ("lead-developer", "fullstack"),
    ("qa-lead", "qa"),
    ("devops-sre", "devops"),
    ("cmo", "marketing"),
    ("sales-lead", "sales"),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(name, _)| *name == key).map(|(_, value)| *value)
}

/// Analyze a seed prompt into domain, audience, features, and complexity.
pub fn analyze_seed(seed_prompt: &str) -> SeedAnalysis {
    let seed_lower = seed_prompt.to_lowercase();

    let domain = detect_domain(&seed_lower);
    let key_features = detect_features(&seed_lower, domain);
    let complexity = assess_complexity(&seed_lower, &key_features);

    SeedAnalysis {
        domain: domain.to_string(),
        target_audience: detect_audience(&seed_lower).to_string(),
        key_features,
        complexity,
        needs_ui: !NO_UI_INDICATORS.iter().any(|ind| seed_lower.contains(ind)),
        needs_monetization: !FREE_PATTERNS.iter().any(|p| p.is_match(&seed_lower)),
        needs_marketing: !NO_MARKETING_PATTERNS.iter().any(|p| p.is_match(&seed_lower)),
        company_name: generate_company_name(seed_prompt),
    }
}

/// Highest-scoring domain; "saas" when nothing matches.
fn detect_domain(seed_lower: &str) -> &'static str {
    let mut best = ("saas", 0_usize);
    for &(domain, keywords) in DOMAIN_KEYWORDS {
        let score = keywords.iter().filter(|kw| seed_lower.contains(*kw)).count();
        if score > best.1 {
            best = (domain, score);
        }
    }
    best.0
}

fn detect_audience(seed_lower: &str) -> &'static str {
    AUDIENCE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| seed_lower.contains(kw)))
        .map_or("general users", |&(audience, _)| audience)
}

/// Domain defaults first, then keyword-matched features, capped at eight.
fn detect_features(seed_lower: &str, domain: &str) -> Vec<String> {
    let mut features: Vec<String> = DOMAIN_DEFAULT_FEATURES
        .iter()
        .find(|(name, _)| *name == domain)
        .map(|(_, defaults)| defaults.iter().map(|f| (*f).to_string()).collect())
        .unwrap_or_default();

    for &(feature, keywords) in FEATURE_KEYWORDS {
        if keywords.iter().any(|kw| seed_lower.contains(kw))
            && !features.iter().any(|f| f == feature)
        {
            features.push(feature.to_string());
        }
    }

    features.truncate(MAX_FEATURES);
    features
}

fn assess_complexity(seed_lower: &str, features: &[String]) -> Complexity {
    let mut score = features.len();
    score += 2 * COMPLEXITY_INDICATORS.iter().filter(|ind| seed_lower.contains(*ind)).count();

    if score <= 3 {
        Complexity::Simple
    } else if score <= 6 {
        Complexity::Medium
    } else {
        Complexity::Complex
    }
}

/// Synthesize a company name from the first meaningful seed words.
fn generate_company_name(seed_prompt: &str) -> String {
    let words: Vec<&str> = seed_prompt
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    match words.as_slice() {
        [first, second, ..] => format!("{}{} AI Co.", capitalize(first), capitalize(second)),
        [first] => format!("{} AI Co.", capitalize(first)),
        [] => "AutoFoundry AI Co.".to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Select which roles the analysis earns, minimum roles first.
pub fn select_roles(analysis: &SeedAnalysis) -> Vec<String> {
    let mut roles: Vec<String> = MINIMUM_ROLES.iter().map(|r| (*r).to_string()).collect();

    for &(role, condition) in ROLE_CONDITIONS {
        if !roles.iter().any(|r| r == role) && condition(analysis) {
            roles.push(role.to_string());
        }
    }

    roles
}

/// Build agent configurations from selected roles.
///
/// Persona skills are loaded from `library/personas/<id>.yaml` when the
/// file exists; an absent library entry just means no preloaded skills.
pub fn build_agents(roles: &[String], library_dir: &Path) -> Vec<AgentConfig> {
    roles
        .iter()
        .map(|role| {
            let persona_id = lookup(ROLE_TO_PERSONA, role).unwrap_or(role.as_str());
            AgentConfig {
                role: role.clone(),
                persona: PersonaRef::new(persona_id),
                skills: load_persona_skills(persona_id, library_dir),
                model: lookup(ROLE_MODELS, role).unwrap_or_default(),
                layer: lookup(ROLE_LAYERS, role).unwrap_or("engineering").to_string(),
                decides: vec![],
            }
        })
        .collect()
}

fn load_persona_skills(persona_id: &str, library_dir: &Path) -> Vec<String> {
    let path = library_dir.join("personas").join(format!("{persona_id}.yaml"));
    let Ok(content) = std::fs::read_to_string(&path) else {
        return vec![];
    };

    let Ok(data) = serde_yaml::from_str::<serde_yaml::Value>(&content) else {
        warn!(path = %path.display(), "Unparsable persona file, skipping skills");
        return vec![];
    };

    data.get("recommended_skills")
        .and_then(|skills| skills.as_sequence())
        .map(|seq| {
            seq.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Load library workflows whose whole chain is covered by the roles.
pub fn select_workflows(roles: &[String], library_dir: &Path) -> Vec<WorkflowConfig> {
    let workflow_dir = library_dir.join("workflows");
    let Ok(entries) = std::fs::read_dir(&workflow_dir) else {
        return vec![];
    };

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    paths.sort();

    let mut workflows: Vec<WorkflowConfig> = Vec::new();
    for path in paths {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(data) = serde_yaml::from_str::<serde_yaml::Value>(&content) else {
            warn!(path = %path.display(), "Unparsable workflow file, skipping");
            continue;
        };

        let chain: Vec<String> = data
            .get("chain")
            .and_then(|c| c.as_sequence())
            .map(|seq| seq.iter().filter_map(chain_role).collect())
            .unwrap_or_default();
        let normalized: Vec<String> = chain
            .iter()
            .map(|role| lookup(WORKFLOW_ROLE_ALIASES, role).unwrap_or(role.as_str()).to_string())
            .collect();

        if normalized.is_empty() || !normalized.iter().all(|role| roles.contains(role)) {
            continue;
        }

        let Some(id) = data.get("id").and_then(|v| v.as_str()) else {
            continue;
        };
        let Some(name) = data.get("name").and_then(|v| v.as_str()) else {
            continue;
        };

        workflows.push(WorkflowConfig {
            id: id.to_string(),
            name: name.to_string(),
            description: data
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            chain: normalized,
            convergence_cycles: data
                .get("convergence_cycles")
                .and_then(serde_yaml::Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(3),
        });
    }

    workflows
}

/// A chain entry is either a bare role string or a mapping with a `role`
/// key.
fn chain_role(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(role) => Some(role.clone()),
        serde_yaml::Value::Mapping(_) => value
            .get("role")
            .and_then(|v| v.as_str())
            .filter(|role| !role.is_empty())
            .map(String::from),
        _ => None,
    }
}

/// Bootstrap a complete configuration from a seed prompt.
pub fn generate_config(seed_prompt: &str, library_dir: &Path) -> FoundryConfig {
    let analysis = analyze_seed(seed_prompt);
    let roles = select_roles(&analysis);
    let agents = build_agents(&roles, library_dir);
    let workflows = select_workflows(&roles, library_dir);

    FoundryConfig {
        company: CompanyConfig {
            name: analysis.company_name.clone(),
            mission: format!(
                "Build and ship a profitable {} product: {seed_prompt}",
                analysis.domain
            ),
            description: format!(
                "Domain: {}. Target: {}. Complexity: {}.",
                analysis.domain, analysis.target_audience, analysis.complexity
            ),
            seed_prompt: seed_prompt.to_string(),
        },
        org: OrgConfig { agents },
        workflows,
        runtime: RuntimeConfig {
            providers: vec![Provider::default()],
            budget: BudgetConfig::default(),
            ..Default::default()
        },
        guardrails: GuardrailConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_domain_by_keyword_score() {
        let analysis = analyze_seed("An online shop to sell handmade products with a store front");
        assert_eq!(analysis.domain, "ecommerce");
    }

    #[test]
    fn test_unmatched_domain_defaults_to_saas() {
        let analysis = analyze_seed("Something wonderful and unprecedented");
        assert_eq!(analysis.domain, "saas");
    }

    #[test]
    fn test_audience_detection() {
        let analysis = analyze_seed("Invoice tracking for freelancers");
        assert_eq!(analysis.target_audience, "freelancers");

        let analysis = analyze_seed("A thing with no audience keywords");
        assert_eq!(analysis.target_audience, "general users");
    }

    #[test]
    fn test_free_word_boundary_does_not_match_freelancer() {
        let analysis = analyze_seed("Invoice tracking for freelancers");
        assert!(analysis.needs_monetization, "'freelancer' must not match 'free'");

        let analysis = analyze_seed("A free invoice tool");
        assert!(!analysis.needs_monetization);
    }

    #[test]
    fn test_cli_seed_needs_no_ui() {
        let analysis = analyze_seed("A cli for parsing logs");
        assert!(!analysis.needs_ui);
    }

    #[test]
    fn test_features_capped_at_eight() {
        let analysis = analyze_seed(
            "analytics tracking dashboard with real-time alerts, team collaboration, \
             api integration, mobile support, payment billing, search filters, csv export",
        );
        assert!(analysis.key_features.len() <= 8);
    }

    #[test]
    fn test_company_name_skips_stop_words() {
        let analysis = analyze_seed("Build a recipe sharing platform");
        assert_eq!(analysis.company_name, "RecipeSharing AI Co.");
    }

    #[test]
    fn test_company_name_empty_seed_fallback() {
        let analysis = analyze_seed("a to the");
        assert_eq!(analysis.company_name, "AutoFoundry AI Co.");
    }

    #[test]
    fn test_minimum_roles_always_present() {
        let analysis = analyze_seed("tiny internal cli");
        let roles = select_roles(&analysis);
        for required in MINIMUM_ROLES {
            assert!(roles.iter().any(|r| r == required), "missing {required}");
        }
    }

    #[test]
    fn test_complex_ui_seed_selects_full_team() {
        let analysis = analyze_seed(
            "Enterprise real-time machine learning analytics platform with dashboards, \
             team collaboration, billing, and mobile apps for large organizations",
        );
        assert_eq!(analysis.complexity, Complexity::Complex);

        let roles = select_roles(&analysis);
        for expected in ["cto", "critic", "product", "ui", "interaction", "qa", "research"] {
            assert!(roles.iter().any(|r| r == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_build_agents_uses_lookup_tables() {
        let dir = tempfile::tempdir().unwrap();
        let roles = vec!["ceo".to_string(), "sales".to_string(), "mystery".to_string()];
        let agents = build_agents(&roles, dir.path());

        assert_eq!(agents[0].persona.id, "jeff-bezos");
        assert_eq!(agents[0].layer, "strategy");
        assert_eq!(agents[0].model, ModelTier::Opus);

        assert_eq!(agents[1].model, ModelTier::Haiku);

        // Unknown roles fall back to themselves and engineering/sonnet.
        assert_eq!(agents[2].persona.id, "mystery");
        assert_eq!(agents[2].layer, "engineering");
        assert_eq!(agents[2].model, ModelTier::Sonnet);
    }

    #[test]
    fn test_persona_skills_loaded_from_library() {
        let dir = tempfile::tempdir().unwrap();
        let personas = dir.path().join("personas");
        std::fs::create_dir_all(&personas).unwrap();
        std::fs::write(
            personas.join("dhh.yaml"),
            "id: dhh\nrecommended_skills:\n  - rails-doctrine\n  - shipping\n",
        )
        .unwrap();

        let agents = build_agents(&["fullstack".to_string()], dir.path());
        assert_eq!(agents[0].skills, vec!["rails-doctrine", "shipping"]);
    }

    #[test]
    fn test_select_workflows_requires_full_chain_coverage() {
        let dir = tempfile::tempdir().unwrap();
        let workflows_dir = dir.path().join("workflows");
        std::fs::create_dir_all(&workflows_dir).unwrap();
        std::fs::write(
            workflows_dir.join("ship.yaml"),
            "id: ship\nname: Ship It\nchain:\n  - ceo\n  - lead-developer\nconvergence_cycles: 2\n",
        )
        .unwrap();
        std::fs::write(
            workflows_dir.join("launch.yaml"),
            "id: launch\nname: Launch\nchain:\n  - cmo\n",
        )
        .unwrap();

        let roles = vec!["ceo".to_string(), "fullstack".to_string()];
        let workflows = select_workflows(&roles, dir.path());

        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].id, "ship");
        assert_eq!(workflows[0].chain, vec!["ceo", "fullstack"]);
        assert_eq!(workflows[0].convergence_cycles, 2);
    }

    #[test]
    fn test_select_workflows_accepts_mapping_chain_entries() {
        let dir = tempfile::tempdir().unwrap();
        let workflows_dir = dir.path().join("workflows");
        std::fs::create_dir_all(&workflows_dir).unwrap();
        std::fs::write(
            workflows_dir.join("review.yaml"),
            "id: review\nname: Review\nchain:\n  - role: ceo\n  - role: qa-lead\n",
        )
        .unwrap();

        let roles = vec!["ceo".to_string(), "qa".to_string()];
        let workflows = select_workflows(&roles, dir.path());
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].chain, vec!["ceo", "qa"]);
    }

    #[test]
    fn test_generate_config_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let config = generate_config("A subscription dashboard for small businesses", dir.path());

        assert!(config.company.name.ends_with("AI Co."));
        assert!(config.company.mission.contains("saas"));
        assert!(!config.org.agents.is_empty());
        assert_eq!(config.runtime.providers.len(), 1);
        assert!(!config.guardrails.forbidden.is_empty());
    }
}
