use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::decision::{Excerpt, RuleMatch};
use crate::error::PolicyError;
use crate::input::Candidate;

/// Upper bound on a compiled pattern's size, in bytes.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// What a rule does when its pattern matches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Skip the guarded stage.
    #[default]
    Skip,
    /// Run the guarded stage regardless of later rules (e.g. a `[force-deploy]` marker).
    Proceed,
}

/// A named tag pattern and the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub action: RuleAction,
}

impl TagRule {
    /// A `skip` rule.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            action: RuleAction::Skip,
        }
    }

    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.action = action;
        self
    }
}

/// A validated rule with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: TagRule,
    regex: Regex,
}

impl CompiledRule {
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn action(&self) -> RuleAction {
        self.rule.action
    }

    /// First match of this rule's pattern in `candidate`, if any.
    pub fn find(&self, candidate: &Candidate<'_>) -> Option<RuleMatch> {
        let found = self.regex.find(&candidate.text)?;
        let (line, entry) = candidate.locate(found.start());
        Some(RuleMatch {
            rule: self.rule.name.clone(),
            action: self.rule.action,
            source: candidate.source,
            line,
            entry,
            excerpt: Excerpt::bounded(found.as_str()),
        })
    }
}

/// An ordered, validated, compiled list of tag rules.
///
/// Immutable once built; share it across concurrent evaluations with `Arc`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    fingerprint: String,
}

impl RuleSet {
    /// Validate and compile `rules`, failing on the first bad rule in declaration order.
    pub fn compile(rules: &[TagRule]) -> Result<Self, PolicyError> {
        let compiled = compile_each(rules)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules: compiled,
            fingerprint: fingerprint(rules),
        })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Hex SHA-256 of the rule definitions this set was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Validate and compile each rule independently, in declaration order.
///
/// A name is only reported as a duplicate on its second and later occurrences.
pub(crate) fn compile_each(rules: &[TagRule]) -> Vec<Result<CompiledRule, PolicyError>> {
    let mut seen = HashSet::new();

    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            if rule.name.trim().is_empty() {
                return Err(PolicyError::EmptyName { index });
            }

            if !seen.insert(rule.name.as_str()) {
                return Err(PolicyError::DuplicateName {
                    index,
                    rule: rule.name.clone(),
                });
            }

            let regex = RegexBuilder::new(&rule.pattern)
                .multi_line(true)
                .dot_matches_new_line(true)
                .size_limit(PATTERN_SIZE_LIMIT)
                .build()
                .map_err(|e| PolicyError::InvalidPattern {
                    index,
                    rule: rule.name.clone(),
                    message: e.to_string(),
                })?;

            Ok(CompiledRule {
                rule: rule.clone(),
                regex,
            })
        })
        .collect()
}

/// Compute a stable SHA-256 over the canonical JSON of a rule list.
pub fn fingerprint(rules: &[TagRule]) -> String {
    let canonical = serde_json::to_string(rules).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Markers most pipelines recognise out of the box.
pub fn default_rules() -> Vec<TagRule> {
    vec![
        TagRule::new("skip-deploy", r"\[skip-deploy\]"),
        TagRule::new("skip-ci", r"(?i)\[(skip ci|ci skip|skip-ci|no ci)\]"),
    ]
}
