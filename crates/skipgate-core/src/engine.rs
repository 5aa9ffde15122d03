use std::sync::Arc;

use crate::decision::{Decision, ErrorCause};
use crate::error::PolicyError;
use crate::input::EvaluationInput;
use crate::report::{CandidateReport, ComparisonReport, RuleOutcome};
use crate::rules::{CompiledRule, RuleAction, RuleSet, TagRule, compile_each, fingerprint};

/// Evaluate commit text against a rule definition list, compiling it for this call only.
///
/// A rule list that fails validation yields [`Decision::Error`].
pub fn evaluate(full_message: Option<&str>, change_log: &[String], rules: &[TagRule]) -> Decision {
    match RuleSet::compile(rules) {
        Ok(set) => set.evaluate(&EvaluationInput::new(full_message, change_log)),
        Err(e) => {
            tracing::warn!(error = %e, "Rule set failed validation");
            e.into()
        }
    }
}

/// Per-candidate, per-rule diagnostics for a rule definition list.
///
/// Invalid rules are reported as [`RuleOutcome::Invalid`]; valid rules are still
/// evaluated so the report stays useful while a rule is being fixed.
pub fn explain(
    full_message: Option<&str>,
    change_log: &[String],
    rules: &[TagRule],
) -> ComparisonReport {
    let input = EvaluationInput::new(full_message, change_log);
    let compiled = compile_each(rules);
    let decision = match compiled.iter().find_map(|r| r.as_ref().err()) {
        Some(err) => Decision::from(err.clone()),
        None => evaluate_rules(compiled.iter().flatten(), &input),
    };

    build_report(&compiled, &input, fingerprint(rules), decision)
}

impl RuleSet {
    /// Scan the input's candidates rule by rule; the first match decides.
    pub fn evaluate(&self, input: &EvaluationInput<'_>) -> Decision {
        evaluate_rules(self.rules().iter(), input)
    }

    pub fn explain(&self, input: &EvaluationInput<'_>) -> ComparisonReport {
        let compiled: Vec<Result<CompiledRule, PolicyError>> =
            self.rules().iter().cloned().map(Ok).collect();
        let decision = self.evaluate(input);
        build_report(&compiled, input, self.fingerprint().to_string(), decision)
    }
}

fn evaluate_rules<'r>(
    rules: impl Iterator<Item = &'r CompiledRule>,
    input: &EvaluationInput<'_>,
) -> Decision {
    if input.is_empty() {
        tracing::debug!("No commit text supplied");
    }
    let candidates = input.candidates();

    for rule in rules {
        for candidate in &candidates {
            let Some(found) = rule.find(candidate) else {
                continue;
            };

            tracing::info!(
                rule = rule.name(),
                source = %found.source,
                line = found.line,
                "Rule matched"
            );

            return match rule.action() {
                RuleAction::Skip => Decision::Skip(found),
                RuleAction::Proceed => Decision::Proceed {
                    matched: Some(found),
                },
            };
        }

        tracing::debug!(rule = rule.name(), "Rule did not match");
    }

    Decision::proceed()
}

fn build_report(
    compiled: &[Result<CompiledRule, PolicyError>],
    input: &EvaluationInput<'_>,
    fingerprint: String,
    decision: Decision,
) -> ComparisonReport {
    let candidates = input
        .candidates()
        .iter()
        .map(|candidate| CandidateReport {
            source: candidate.source,
            line_count: candidate.line_count(),
            entry_count: candidate.entry_count(),
            outcomes: compiled
                .iter()
                .map(|slot| match slot {
                    Ok(rule) => match rule.find(candidate) {
                        Some(found) => RuleOutcome::Matched(found),
                        None => RuleOutcome::NotMatched {
                            rule: rule.name().to_string(),
                        },
                    },
                    Err(err) => RuleOutcome::Invalid {
                        rule: err.rule().to_string(),
                        cause: ErrorCause::from(err),
                    },
                })
                .collect(),
        })
        .collect();

    ComparisonReport {
        fingerprint,
        candidates,
        decision,
    }
}

/// A compiled rule set ready to be evaluated from any number of callers.
///
/// Cloning is cheap: the rule set is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    rules: Arc<RuleSet>,
}

impl PolicyEvaluator {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Compile `rules` once for reuse across evaluations.
    pub fn from_rules(rules: &[TagRule]) -> Result<Self, PolicyError> {
        let set = RuleSet::compile(rules)?;
        tracing::debug!(
            rules = set.len(),
            fingerprint = set.fingerprint(),
            "Compiled rule set"
        );
        Ok(Self::new(set))
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    pub fn evaluate(&self, full_message: Option<&str>, change_log: &[String]) -> Decision {
        let decision = self
            .rules
            .evaluate(&EvaluationInput::new(full_message, change_log));

        tracing::info!(
            fingerprint = self.rules.fingerprint(),
            decision = decision.label(),
            "Commit policy evaluated"
        );
        decision
    }

    pub fn explain(&self, full_message: Option<&str>, change_log: &[String]) -> ComparisonReport {
        self.rules
            .explain(&EvaluationInput::new(full_message, change_log))
    }
}
