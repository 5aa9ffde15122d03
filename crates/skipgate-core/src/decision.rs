use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::input::CandidateSource;
use crate::rules::RuleAction;

/// Upper bound on the characters kept from a matched substring.
pub const MAX_EXCERPT_CHARS: usize = 200;

/// Outcome of evaluating a commit against a rule set.
///
/// Callers must handle every variant; the evaluator never halts a pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The stage should run. `matched` is set when a `proceed` rule fired.
    Proceed { matched: Option<RuleMatch> },
    /// The stage should be skipped because a `skip` rule matched.
    Skip(RuleMatch),
    /// The rule set could not be evaluated.
    Error {
        rule_index: usize,
        rule: String,
        cause: ErrorCause,
    },
}

impl Decision {
    /// A plain PROCEED with no rule involved.
    pub fn proceed() -> Self {
        Decision::Proceed { matched: None }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Decision::Proceed { .. })
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Decision::Skip(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Decision::Error { .. })
    }

    /// The match behind this decision, if any rule fired.
    pub fn rule_match(&self) -> Option<&RuleMatch> {
        match self {
            Decision::Proceed { matched } => matched.as_ref(),
            Decision::Skip(m) => Some(m),
            Decision::Error { .. } => None,
        }
    }

    /// Uppercase label for log output (`"PROCEED"`, `"SKIP"`, `"ERROR"`).
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Proceed { .. } => "PROCEED",
            Decision::Skip(_) => "SKIP",
            Decision::Error { .. } => "ERROR",
        }
    }
}

impl From<PolicyError> for Decision {
    fn from(err: PolicyError) -> Self {
        Decision::Error {
            rule_index: err.index(),
            rule: err.rule().to_string(),
            cause: ErrorCause::from(&err),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Proceed { matched: None } => write!(f, "PROCEED"),
            Decision::Proceed { matched: Some(m) } => write!(f, "PROCEED: {m}"),
            Decision::Skip(m) => write!(f, "SKIP: {m}"),
            Decision::Error {
                rule_index,
                rule,
                cause,
            } if rule.is_empty() => write!(f, "ERROR: rule #{rule_index}: {cause}"),
            Decision::Error { rule, cause, .. } => write!(f, "ERROR: rule '{rule}': {cause}"),
        }
    }
}

/// Why a rule could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorCause {
    InvalidPattern { message: String },
    EmptyName,
    DuplicateName,
}

impl From<&PolicyError> for ErrorCause {
    fn from(err: &PolicyError) -> Self {
        match err {
            PolicyError::InvalidPattern { message, .. } => ErrorCause::InvalidPattern {
                message: message.clone(),
            },
            PolicyError::EmptyName { .. } => ErrorCause::EmptyName,
            PolicyError::DuplicateName { .. } => ErrorCause::DuplicateName,
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCause::InvalidPattern { message } => write!(f, "invalid pattern: {message}"),
            ErrorCause::EmptyName => write!(f, "empty rule name"),
            ErrorCause::DuplicateName => write!(f, "duplicate rule name"),
        }
    }
}

/// Audit record of a rule firing: which rule, where, and on what text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule: String,
    pub action: RuleAction,
    pub source: CandidateSource,
    /// 1-based line inside the candidate block where the match starts.
    pub line: usize,
    /// Index of the change-log entry containing the match (change-log source only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<usize>,
    pub excerpt: Excerpt,
}

impl fmt::Display for RuleMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule '{}' matched {:?} on {} line {}",
            self.rule, self.excerpt.text, self.source, self.line
        )?;
        if let Some(entry) = self.entry {
            write!(f, " (entry {entry})")?;
        }
        if self.excerpt.truncated {
            write!(f, " [excerpt truncated]")?;
        }
        Ok(())
    }
}

/// The matched substring, bounded to [`MAX_EXCERPT_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excerpt {
    pub text: String,
    pub truncated: bool,
}

impl Excerpt {
    pub fn bounded(text: &str) -> Self {
        match text.char_indices().nth(MAX_EXCERPT_CHARS) {
            Some((cut, _)) => Self {
                text: text[..cut].to_string(),
                truncated: true,
            },
            None => Self {
                text: text.to_string(),
                truncated: false,
            },
        }
    }
}
