//! Commit-message policy evaluation for skipgate.
//!
//! Decides whether a pipeline stage should be skipped by matching tag rules
//! (e.g. `[skip-deploy]`) against a commit's full message and the change-log
//! entries an upstream CI system reports. The change log may only carry the
//! first line of each message, so both views are scanned and the full message
//! is tried first.
//!
//! Evaluation is pure: no I/O, no shared mutable state.
//!
//! ```rust
//! use skipgate_core::{Decision, TagRule, evaluate};
//!
//! let rules = vec![TagRule::new("skip-deploy", r"\[skip-deploy\]")];
//! let message = "Merge pull request #39\nKREW-240 kiwi import\n[skip-deploy]";
//!
//! let decision = evaluate(Some(message), &[], &rules);
//! assert!(matches!(decision, Decision::Skip(ref m) if m.rule == "skip-deploy"));
//!
//! let change_log = vec!["Merge pull request #39".to_string()];
//! assert!(evaluate(None, &change_log, &rules).is_proceed());
//! ```

pub mod decision;
pub mod engine;
pub mod error;
pub mod input;
pub mod report;
pub mod rules;

pub use decision::{Decision, ErrorCause, Excerpt, MAX_EXCERPT_CHARS, RuleMatch};
pub use engine::{PolicyEvaluator, evaluate, explain};
pub use error::PolicyError;
pub use input::{CandidateSource, EvaluationInput};
pub use report::{CandidateReport, ComparisonReport, Disagreement, RuleOutcome};
pub use rules::{RuleAction, RuleSet, TagRule, default_rules};
