use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::{Decision, ErrorCause, RuleMatch};
use crate::input::CandidateSource;

/// Diagnostic view of how every rule fared against every candidate block.
///
/// Meant for human-readable logs; see the [`fmt::Display`] impl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub fingerprint: String,
    pub candidates: Vec<CandidateReport>,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub source: CandidateSource,
    pub line_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
    pub outcomes: Vec<RuleOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Matched(RuleMatch),
    NotMatched { rule: String },
    Invalid { rule: String, cause: ErrorCause },
}

impl RuleOutcome {
    pub fn rule(&self) -> &str {
        match self {
            RuleOutcome::Matched(m) => &m.rule,
            RuleOutcome::NotMatched { rule } | RuleOutcome::Invalid { rule, .. } => rule,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, RuleOutcome::Matched(_))
    }
}

/// A rule that matched one view of the commit message but not the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disagreement {
    pub rule: String,
    pub full_message: bool,
    pub change_log: bool,
}

impl ComparisonReport {
    pub fn candidate(&self, source: CandidateSource) -> Option<&CandidateReport> {
        self.candidates.iter().find(|c| c.source == source)
    }

    /// Rules whose outcome differs between the full message and the change log.
    ///
    /// Empty unless both views were supplied. Invalid rules never disagree.
    pub fn disagreements(&self) -> Vec<Disagreement> {
        let (Some(full), Some(log)) = (
            self.candidate(CandidateSource::FullMessage),
            self.candidate(CandidateSource::ChangeLog),
        ) else {
            return Vec::new();
        };

        full.outcomes
            .iter()
            .zip(&log.outcomes)
            .filter(|(a, b)| {
                !matches!(a, RuleOutcome::Invalid { .. }) && a.is_match() != b.is_match()
            })
            .map(|(a, b)| Disagreement {
                rule: a.rule().to_string(),
                full_message: a.is_match(),
                change_log: b.is_match(),
            })
            .collect()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.fingerprint.get(..12).unwrap_or(&self.fingerprint);
        writeln!(f, "rule set {short}")?;

        if self.candidates.is_empty() {
            writeln!(f, "  (no commit text supplied)")?;
        }

        for candidate in &self.candidates {
            match candidate.entry_count {
                Some(entries) => writeln!(
                    f,
                    "{} ({} entries, {} lines):",
                    candidate.source, entries, candidate.line_count
                )?,
                None => writeln!(f, "{} ({} lines):", candidate.source, candidate.line_count)?,
            }

            for outcome in &candidate.outcomes {
                match outcome {
                    RuleOutcome::Matched(m) => {
                        write!(f, "  {:<20} MATCH line {}: {:?}", m.rule, m.line, m.excerpt.text)?;
                        if let Some(entry) = m.entry {
                            write!(f, " (entry {entry})")?;
                        }
                        writeln!(f)?;
                    }
                    RuleOutcome::NotMatched { rule } => writeln!(f, "  {rule:<20} no match")?,
                    RuleOutcome::Invalid { rule, cause } => {
                        writeln!(f, "  {rule:<20} INVALID: {cause}")?
                    }
                }
            }
        }

        for d in self.disagreements() {
            let (hit, miss) = if d.full_message {
                (CandidateSource::FullMessage, CandidateSource::ChangeLog)
            } else {
                (CandidateSource::ChangeLog, CandidateSource::FullMessage)
            };
            writeln!(f, "disagreement: '{}' matched {hit} but not {miss}", d.rule)?;
        }

        write!(f, "decision: {}", self.decision)
    }
}
