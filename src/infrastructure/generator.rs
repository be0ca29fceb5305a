//! Renders a configuration into the on-disk runtime artifacts.
//!
//! Produces the agent workspace: `CLAUDE.md`, `PROMPT.md`, per-agent
//! definitions, skill files, settings, the initial consensus document,
//! and the driver scripts the loop runtime launches. Everything is
//! code-rendered markdown; the formats of the state file, PID file, and
//! cycle logs written by the driver script are contractual.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::domain::models::{AgentConfig, FoundryConfig, WorkflowConfig};

/// Summary of a generation run.
#[derive(Debug, Serialize)]
pub struct GenerateReport {
    /// Every file written, in creation order.
    pub files_created: Vec<PathBuf>,
    /// Number of agent definitions written.
    pub agent_count: usize,
    /// Number of unique skill files written.
    pub skill_count: usize,
    /// Number of workflow documents written.
    pub workflow_count: usize,
}

/// Generate all runtime artifacts for a configuration.
pub fn generate_all(config: &FoundryConfig, output_dir: &Path) -> Result<GenerateReport> {
    create_directories(config, output_dir)?;

    let mut files_created: Vec<PathBuf> = Vec::new();
    let mut write = |path: PathBuf, content: String| -> Result<()> {
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        files_created.push(path);
        Ok(())
    };

    write(output_dir.join("CLAUDE.md"), render_claude_md(config))?;
    write(output_dir.join("PROMPT.md"), render_prompt_md(config))?;

    for agent in &config.org.agents {
        let path = output_dir
            .join(".claude")
            .join("agents")
            .join(format!("{}-{}.md", agent.role, agent.persona.id));
        write(path, render_agent_md(agent, config))?;
    }

    let skills: BTreeSet<&str> = config
        .org
        .agents
        .iter()
        .flat_map(|a| a.skills.iter().map(String::as_str))
        .collect();
    for skill in &skills {
        let skill_dir = output_dir.join(".claude").join("skills").join(skill);
        std::fs::create_dir_all(&skill_dir)
            .with_context(|| format!("Failed to create {}", skill_dir.display()))?;
        write(skill_dir.join("SKILL.md"), render_skill_md(skill))?;
    }

    for workflow in &config.workflows {
        let path = output_dir.join("docs").join(format!("workflow-{}.md", workflow.id));
        write(path, render_workflow_md(workflow))?;
    }

    let settings = serde_json::to_string_pretty(&render_settings_json(config))
        .context("Failed to serialize settings")?;
    write(output_dir.join(".claude").join("settings.json"), format!("{settings}\n"))?;

    write(
        output_dir.join("memories").join("consensus.md"),
        render_consensus_md(config),
    )?;

    write(
        output_dir.join("scripts").join("auto-loop.sh"),
        render_loop_script(config),
    )?;
    write(output_dir.join("scripts").join("stop-loop.sh"), render_stop_script())?;
    make_executable(&output_dir.join("scripts").join("auto-loop.sh"))?;
    make_executable(&output_dir.join("scripts").join("stop-loop.sh"))?;

    info!(
        files = files_created.len(),
        agents = config.org.agents.len(),
        "Generated runtime artifacts"
    );

    Ok(GenerateReport {
        agent_count: config.org.agents.len(),
        skill_count: skills.len(),
        workflow_count: config.workflows.len(),
        files_created,
    })
}

fn create_directories(config: &FoundryConfig, output_dir: &Path) -> Result<()> {
    let mut dirs = vec![
        output_dir.join(".claude").join("agents"),
        output_dir.join(".claude").join("skills"),
        output_dir.join("memories"),
        output_dir.join("projects"),
        output_dir.join("logs"),
        output_dir.join("scripts"),
        output_dir.join("docs"),
    ];
    for agent in &config.org.agents {
        dirs.push(output_dir.join("docs").join(&agent.role));
    }

    for dir in dirs {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to chmod {}", path.display()))?;
    Ok(())
}

fn render_claude_md(config: &FoundryConfig) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", config.company.name));
    md.push_str(&format!("## Mission\n\n{}\n\n", config.company.mission));
    if !config.company.description.is_empty() {
        md.push_str(&format!("## Description\n\n{}\n\n", config.company.description));
    }

    md.push_str("## Team\n\n");
    md.push_str("| Role | Persona | Layer | Model |\n");
    md.push_str("|------|---------|-------|-------|\n");
    for agent in &config.org.agents {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            agent.role, agent.persona.id, agent.layer, agent.model
        ));
    }
    md.push('\n');

    if !config.workflows.is_empty() {
        md.push_str("## Workflows\n\n");
        for workflow in &config.workflows {
            md.push_str(&format!(
                "### {}\n{}\n\nChain: {}\n\n",
                workflow.name,
                workflow.description,
                workflow.chain.join(" -> ")
            ));
        }
    }

    md.push_str("## Operating Rules\n\n");
    md.push_str("1. Read `memories/consensus.md` at the start of every cycle\n");
    md.push_str("2. Perform your role's designated task\n");
    md.push_str("3. Update `memories/consensus.md` with your findings/decisions\n");
    md.push_str("4. Stay within the workspace boundary\n");
    md.push_str("5. Never execute forbidden commands\n\n");

    md.push_str("## Guardrails\n\n### Forbidden Commands\n\n");
    for command in &config.guardrails.forbidden {
        md.push_str(&format!("- `{command}`\n"));
    }
    md.push_str(&format!("\n### Workspace: `{}`\n", config.guardrails.workspace));
    md.push_str(&format!(
        "### Critic Review Required: {}\n\n",
        if config.guardrails.require_critic_review { "Yes" } else { "No" }
    ));

    md.push_str("## Budget\n\n");
    md.push_str(&format!("- Max Daily: ${:.2}\n", config.runtime.budget.max_daily_usd));
    md.push_str(&format!("- Alert At: ${:.2}\n", config.runtime.budget.alert_at_usd));

    md
}

fn render_prompt_md(config: &FoundryConfig) -> String {
    let roles = config
        .org
        .agents
        .iter()
        .map(|a| format!("- **{}** ({} layer, {} tier)", a.role, a.layer, a.model))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# Cycle Prompt\n\n\
         You are one agent of {}.\n\n\
         Mission: {}\n\n\
         ## Team\n\n{roles}\n\n\
         ## Protocol\n\n\
         Read `memories/consensus.md`, perform your role's next action, and\n\
         write your findings back to the consensus document. Keep the\n\
         decision log current.\n",
        config.company.name, config.company.mission
    )
}

fn render_agent_md(agent: &AgentConfig, config: &FoundryConfig) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Agent: {} ({})\n\n", agent.role, agent.persona.id));
    md.push_str(&format!("**Company**: {}\n", config.company.name));
    md.push_str(&format!("**Mission**: {}\n\n", config.company.mission));

    md.push_str(&format!("## Role: {}\n\n", agent.role));
    md.push_str(&format!("**Layer**: {}\n", agent.layer));
    md.push_str(&format!("**Model**: {}\n\n", agent.model));

    md.push_str("## Persona\n\n");
    md.push_str(&format!(
        "You are channeling the expertise of **{}**.\n",
        agent.persona.id
    ));
    md.push_str("Apply their mental models, decision-making frameworks, and expertise to every task.\n\n");

    if !agent.persona.custom_instructions.is_empty() {
        md.push_str(&format!(
            "### Custom Instructions\n\n{}\n\n",
            agent.persona.custom_instructions
        ));
    }

    if !agent.skills.is_empty() {
        md.push_str("## Skills\n\n");
        for skill in &agent.skills {
            md.push_str(&format!("- {skill}\n"));
        }
        md.push('\n');
    }

    md.push_str("## Operational Protocol\n\n");
    md.push_str("1. **Read Consensus**: Start by reading `memories/consensus.md`\n");
    md.push_str("2. **Assess**: Determine what needs to be done from your role's perspective\n");
    md.push_str("3. **Act**: Execute your designated task using your skills\n");
    md.push_str("4. **Update**: Write your findings/decisions back to consensus\n");
    md.push_str("5. **Document**: Log important decisions in the decision log table\n\n");

    if !agent.decides.is_empty() {
        md.push_str("## Decision Authority\n\n");
        for decision in &agent.decides {
            md.push_str(&format!("- {decision}\n"));
        }
        md.push('\n');
    }

    md.push_str("## Safety\n\nYou MUST NOT execute any of these commands:\n\n");
    for command in &config.guardrails.forbidden {
        md.push_str(&format!("- `{command}`\n"));
    }
    md.push_str(&format!("\nStay within workspace: `{}`\n", config.guardrails.workspace));

    md
}

fn render_skill_md(skill: &str) -> String {
    format!(
        "---\nname: {skill}\n---\n\n# Skill: {skill}\n\n\
         Apply the `{skill}` playbook when the consensus document or your\n\
         role's task calls for it.\n"
    )
}

fn render_workflow_md(workflow: &WorkflowConfig) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Workflow: {}\n\n", workflow.name));
    md.push_str(&format!("**ID**: {}\n", workflow.id));
    md.push_str(&format!("**Description**: {}\n\n", workflow.description));
    md.push_str("## Chain\n\n");
    for (i, role) in workflow.chain.iter().enumerate() {
        md.push_str(&format!("{}. **{role}**\n", i + 1));
    }
    md.push_str(&format!("\n**Convergence Cycles**: {}\n", workflow.convergence_cycles));

    md
}

fn render_settings_json(config: &FoundryConfig) -> serde_json::Value {
    serde_json::json!({
        "permissions": {
            "allow": [
                "Bash(npm install:*)",
                "Bash(npm run:*)",
                "Bash(git:*)",
                "Bash(mkdir:*)",
                "Bash(cp:*)",
                "Bash(mv:*)",
                "Bash(curl:*)",
                "WebFetch",
                "WebSearch"
            ],
            "deny": config.guardrails.forbidden
        }
    })
}

fn render_consensus_md(config: &FoundryConfig) -> String {
    format!(
        r"# Auto Company Consensus

## Company State

- **Company**: {}
- **Mission**: {}
- **Status**: INITIALIZING
- **Cycle**: 0
- **Revenue**: $0

## Current Focus

Starting up. First cycle should brainstorm product ideas aligned with our mission.

Seed direction: {}

## Active Projects

None yet. First cycle will identify opportunities.

## Next Action

**Brainstorm Phase**: Each team member proposes their best product idea based on our mission.

## Decision Log

| Cycle | Decision | Made By | Outcome |
|-------|----------|---------|---------|
| 0 | Company initialized | System | Pending first cycle |
",
        config.company.name, config.company.mission, config.company.seed_prompt
    )
}

/// The auto-loop driver.
///
/// Reads its settings from the environment the runtime controller passes
/// (`ENGINE`, `MODEL`, `LOOP_INTERVAL`, `CYCLE_TIMEOUT_SECONDS`,
/// `MAX_CONSECUTIVE_ERRORS`, `OUTPUT_DIR`) and writes the contractual
/// state file, PID file, and per-cycle logs.
fn render_loop_script(config: &FoundryConfig) -> String {
    let agent_roles = config
        .org
        .agents
        .iter()
        .map(|a| a.role.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"#!/usr/bin/env bash
# Auto-loop driver for {name}

set -uo pipefail

SCRIPT_DIR="$(cd "$(dirname "${{BASH_SOURCE[0]}}")" && pwd)"
OUTPUT_DIR="${{OUTPUT_DIR:-$(dirname "$SCRIPT_DIR")}}"
STATE_FILE="$OUTPUT_DIR/.auto-loop-state"
PID_FILE="$OUTPUT_DIR/.auto-loop.pid"
LOG_DIR="$OUTPUT_DIR/logs"
CONSENSUS="$OUTPUT_DIR/memories/consensus.md"

ENGINE="${{ENGINE:-claude}}"
MODEL="${{MODEL:-sonnet}}"
LOOP_INTERVAL="${{LOOP_INTERVAL:-30}}"
CYCLE_TIMEOUT="${{CYCLE_TIMEOUT_SECONDS:-1800}}"
MAX_ERRORS="${{MAX_CONSECUTIVE_ERRORS:-5}}"

AGENTS=({agents})
CYCLE=0
ERRORS=0

mkdir -p "$LOG_DIR"
echo $$ > "$PID_FILE"
trap 'rm -f "$PID_FILE"; update_state stopped; exit 0' TERM INT

update_state() {{
    cat > "$STATE_FILE" << EOF
cycle_count=$CYCLE
error_count=$ERRORS
status=$1
model=$MODEL
engine=$ENGINE
last_run=$(date -Iseconds)
EOF
}}

write_cycle_log() {{
    local status="$1" cost="$2" summary="$3"
    cat > "$LOG_DIR/cycle-$CYCLE.log" << EOF
cycle: $CYCLE
status: $status
cost: $cost
timestamp: $(date -Iseconds)
---
$summary
EOF
}}

update_state running

while true; do
    CYCLE=$((CYCLE + 1))
    AGENT_IDX=$(( (CYCLE - 1) % ${{#AGENTS[@]}} ))
    CURRENT_AGENT="${{AGENTS[$AGENT_IDX]}}"
    PROMPT="You are the $CURRENT_AGENT agent. Read memories/consensus.md, perform your role, and update consensus with your findings."

    update_state running
    SUMMARY_FILE="$(mktemp)"
    if timeout "$CYCLE_TIMEOUT" "$ENGINE" --print --model "$MODEL" "$PROMPT" > "$SUMMARY_FILE" 2>&1; then
        ERRORS=0
        write_cycle_log ok "" "$(cat "$SUMMARY_FILE")"
    else
        RC=$?
        ERRORS=$((ERRORS + 1))
        if [ "$RC" -eq 124 ]; then
            write_cycle_log timeout "" "Cycle exceeded ${{CYCLE_TIMEOUT}}s"
        else
            write_cycle_log fail "" "$(cat "$SUMMARY_FILE")"
        fi
        if [ "$ERRORS" -ge "$MAX_ERRORS" ]; then
            update_state circuit_break
            rm -f "$PID_FILE" "$SUMMARY_FILE"
            exit 1
        fi
    fi
    rm -f "$SUMMARY_FILE"

    update_state idle
    sleep "$LOOP_INTERVAL"
done
"#,
        name = config.company.name,
        agents = agent_roles,
    )
}

/// The stop mechanism: graceful TERM with a bounded wait, KILL on --force.
fn render_stop_script() -> String {
    r#"#!/usr/bin/env bash
# Stop the auto-loop driver.

set -uo pipefail

OUTPUT_DIR="."
FORCE=0
while [ $# -gt 0 ]; do
    case "$1" in
        --output-dir) OUTPUT_DIR="$2"; shift 2 ;;
        --force) FORCE=1; shift ;;
        *) echo "Unknown argument: $1" >&2; exit 2 ;;
    esac
done

PID_FILE="$OUTPUT_DIR/.auto-loop.pid"
if [ ! -f "$PID_FILE" ]; then
    echo "No PID file at $PID_FILE" >&2
    exit 1
fi

PID="$(cat "$PID_FILE")"
if ! kill -0 "$PID" 2>/dev/null; then
    rm -f "$PID_FILE"
    echo "Stale PID file removed"
    exit 0
fi

kill -TERM "$PID" 2>/dev/null
for _ in $(seq 1 30); do
    if ! kill -0 "$PID" 2>/dev/null; then
        rm -f "$PID_FILE"
        echo "Auto-loop stopped"
        exit 0
    fi
    sleep 1
done

if [ "$FORCE" -eq 1 ]; then
    kill -KILL "$PID" 2>/dev/null
    rm -f "$PID_FILE"
    echo "Auto-loop killed"
    exit 0
fi

echo "Auto-loop did not stop within 30s (use --force)" >&2
exit 1
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CompanyConfig, ModelTier, PersonaRef};
    use crate::services::consensus::REQUIRED_SECTIONS;

    fn sample_config() -> FoundryConfig {
        FoundryConfig {
            company: CompanyConfig {
                name: "Gen Co".to_string(),
                mission: "Generate artifacts".to_string(),
                description: "A test company".to_string(),
                seed_prompt: "a generator".to_string(),
            },
            org: crate::domain::models::OrgConfig {
                agents: vec![
                    AgentConfig {
                        role: "ceo".to_string(),
                        persona: PersonaRef::new("jeff-bezos"),
                        skills: vec!["planning".to_string()],
                        model: ModelTier::Opus,
                        layer: "strategy".to_string(),
                        decides: vec!["vision".to_string()],
                    },
                    AgentConfig {
                        role: "fullstack".to_string(),
                        persona: PersonaRef::new("dhh"),
                        skills: vec!["planning".to_string(), "shipping".to_string()],
                        model: ModelTier::Sonnet,
                        layer: "engineering".to_string(),
                        decides: vec![],
                    },
                ],
            },
            workflows: vec![WorkflowConfig {
                id: "ship".to_string(),
                name: "Ship".to_string(),
                description: "Ship it".to_string(),
                chain: vec!["ceo".to_string(), "fullstack".to_string()],
                convergence_cycles: 3,
            }],
            runtime: Default::default(),
            guardrails: Default::default(),
        }
    }

    #[test]
    fn test_generate_all_writes_expected_tree() {
        let dir = tempfile::tempdir().unwrap();
        let report = generate_all(&sample_config(), dir.path()).unwrap();

        assert_eq!(report.agent_count, 2);
        assert_eq!(report.skill_count, 2, "skills are deduplicated across agents");
        assert_eq!(report.workflow_count, 1);

        assert!(dir.path().join("CLAUDE.md").is_file());
        assert!(dir.path().join("PROMPT.md").is_file());
        assert!(dir.path().join(".claude/agents/ceo-jeff-bezos.md").is_file());
        assert!(dir.path().join(".claude/skills/shipping/SKILL.md").is_file());
        assert!(dir.path().join(".claude/settings.json").is_file());
        assert!(dir.path().join("docs/workflow-ship.md").is_file());
        assert!(dir.path().join("scripts/auto-loop.sh").is_file());
        assert!(dir.path().join("scripts/stop-loop.sh").is_file());
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_generated_consensus_carries_required_markers() {
        let dir = tempfile::tempdir().unwrap();
        generate_all(&sample_config(), dir.path()).unwrap();

        let consensus =
            std::fs::read_to_string(dir.path().join("memories/consensus.md")).unwrap();
        for marker in REQUIRED_SECTIONS {
            assert!(consensus.contains(marker), "missing marker {marker}");
        }
    }

    #[test]
    fn test_settings_deny_list_mirrors_guardrails() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config();
        generate_all(&config, dir.path()).unwrap();

        let settings: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(".claude/settings.json")).unwrap(),
        )
        .unwrap();

        let deny = settings["permissions"]["deny"].as_array().unwrap();
        assert_eq!(deny.len(), config.guardrails.forbidden.len());
    }

    #[test]
    fn test_driver_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        generate_all(&sample_config(), dir.path()).unwrap();

        let mode = std::fs::metadata(dir.path().join("scripts/auto-loop.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert!(mode & 0o111 != 0);
    }

    #[test]
    fn test_claude_md_lists_team_and_guardrails() {
        let config = sample_config();
        let md = render_claude_md(&config);

        assert!(md.starts_with("# Gen Co"));
        assert!(md.contains("| ceo | jeff-bezos | strategy | opus |"));
        assert!(md.contains("gh repo delete"));
        assert!(md.contains("Chain: ceo -> fullstack"));
    }

    #[test]
    fn test_agent_md_includes_persona_and_safety() {
        let config = sample_config();
        let md = render_agent_md(&config.org.agents[0], &config);

        assert!(md.contains("# Agent: ceo (jeff-bezos)"));
        assert!(md.contains("**Layer**: strategy"));
        assert!(md.contains("You MUST NOT execute"));
        assert!(md.contains("- vision"));
    }

    #[test]
    fn test_loop_script_writes_contractual_state_keys() {
        let script = render_loop_script(&sample_config());
        for key in ["cycle_count=", "error_count=", "status=", "model=", "engine=", "last_run="] {
            assert!(script.contains(key), "missing state key {key}");
        }
        assert!(script.contains(".auto-loop.pid"));
        assert!(script.contains("cycle-$CYCLE.log"));
        assert!(script.contains("AGENTS=(ceo fullstack)"));
    }

    #[test]
    fn test_generated_tree_passes_secret_audit() {
        let dir = tempfile::tempdir().unwrap();
        generate_all(&sample_config(), dir.path()).unwrap();

        let issues =
            crate::services::GuardrailValidator::new().audit_generated_files(dir.path());
        assert!(issues.is_empty(), "unexpected audit issues: {issues:?}");
    }
}
