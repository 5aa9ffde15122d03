use std::process::ExitCode;

use clap::ValueEnum;
use skipgate_core::{ComparisonReport, Decision, RuleAction, TagRule};

/// Exit status when the stage should run.
pub const EXIT_PROCEED: u8 = 0;
/// Exit status when the stage should be skipped.
pub const EXIT_SKIP: u8 = 78;
/// Exit status when the rule set could not be evaluated.
pub const EXIT_INVALID_RULES: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn exit_code(decision: &Decision) -> ExitCode {
    ExitCode::from(exit_status(decision))
}

pub fn exit_status(decision: &Decision) -> u8 {
    match decision {
        Decision::Proceed { .. } => EXIT_PROCEED,
        Decision::Skip(_) => EXIT_SKIP,
        Decision::Error { .. } => EXIT_INVALID_RULES,
    }
}

pub fn render_decision(
    decision: &Decision,
    fingerprint: &str,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(decision.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "rule_set": fingerprint,
            "result": decision,
        })),
    }
}

pub fn render_report(
    report: &ComparisonReport,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "report": report,
            "disagreements": report.disagreements(),
        })),
    }
}

pub fn render_rules(
    rules: &[TagRule],
    fingerprint: &str,
    origin: &str,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => {
            let mut out = format!("rule set {fingerprint} ({origin})\n");
            if rules.is_empty() {
                out.push_str("  (no rules: every commit proceeds)\n");
            }
            for rule in rules {
                let action = match rule.action {
                    RuleAction::Skip => "skip",
                    RuleAction::Proceed => "proceed",
                };
                out.push_str(&format!("  {:<20} {:<8} {}\n", rule.name, action, rule.pattern));
            }
            Ok(out.trim_end().to_string())
        }
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "rule_set": fingerprint,
            "origin": origin,
            "rules": rules,
        })),
    }
}
