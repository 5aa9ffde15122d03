use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which representation of the commit message a candidate block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// The complete commit message, as reported by version control.
    FullMessage,
    /// Change-log entries from an upstream CI system, possibly first-line only.
    ChangeLog,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::FullMessage => write!(f, "full_message"),
            CandidateSource::ChangeLog => write!(f, "change_log"),
        }
    }
}

/// The commit text handed to the evaluator by its caller.
///
/// Either side may be absent. Empty text counts as absent: an empty full
/// message or change-log entry never becomes something a rule can match.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationInput<'a> {
    pub full_message: Option<&'a str>,
    pub change_log: &'a [String],
}

impl<'a> EvaluationInput<'a> {
    pub fn new(full_message: Option<&'a str>, change_log: &'a [String]) -> Self {
        Self {
            full_message,
            change_log,
        }
    }

    pub fn from_full_message(message: &'a str) -> Self {
        Self::new(Some(message), &[])
    }

    pub fn from_change_log(entries: &'a [String]) -> Self {
        Self::new(None, entries)
    }

    /// True when there is nothing to scan.
    pub fn is_empty(&self) -> bool {
        self.full_message.is_none_or(str::is_empty)
            && self.change_log.iter().all(String::is_empty)
    }

    /// Candidate blocks in scan order: full message first, then the non-empty
    /// change-log entries joined into a single block with `\n`.
    pub fn candidates(&self) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::with_capacity(2);

        if let Some(message) = self.full_message.filter(|m| !m.is_empty()) {
            candidates.push(Candidate {
                source: CandidateSource::FullMessage,
                text: Cow::Borrowed(message),
                entry_starts: Vec::new(),
            });
        }

        let entries: Vec<(usize, &'a str)> = self
            .change_log
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(index, entry)| (index, entry.as_str()))
            .collect();

        if !entries.is_empty() {
            let mut entry_starts = Vec::with_capacity(entries.len());
            let mut offset = 0;
            for &(index, entry) in &entries {
                entry_starts.push((offset, index));
                offset += entry.len() + 1;
            }

            let text = match entries.as_slice() {
                [(_, single)] => Cow::Borrowed(*single),
                many => Cow::Owned(
                    many.iter()
                        .map(|(_, entry)| *entry)
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
            };

            candidates.push(Candidate {
                source: CandidateSource::ChangeLog,
                text,
                entry_starts,
            });
        }

        candidates
    }
}

/// One block of text a rule is tested against.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub source: CandidateSource,
    pub text: Cow<'a, str>,
    /// Byte offset inside `text` and caller index of each joined change-log
    /// entry. Empty for the full message.
    entry_starts: Vec<(usize, usize)>,
}

impl Candidate<'_> {
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Number of change-log entries joined into this block.
    pub fn entry_count(&self) -> Option<usize> {
        match self.source {
            CandidateSource::ChangeLog => Some(self.entry_starts.len()),
            CandidateSource::FullMessage => None,
        }
    }

    /// 1-based line number and, for the change log, the caller's entry index at `offset`.
    pub fn locate(&self, offset: usize) -> (usize, Option<usize>) {
        let line = self.text[..offset].matches('\n').count() + 1;
        let entry = match self.source {
            CandidateSource::FullMessage => None,
            CandidateSource::ChangeLog => {
                let slot = self
                    .entry_starts
                    .partition_point(|&(start, _)| start <= offset)
                    .saturating_sub(1);
                self.entry_starts.get(slot).map(|&(_, index)| index)
            }
        };
        (line, entry)
    }
}
