use thiserror::Error;

/// Why a rule definition list could not be turned into a [`RuleSet`](crate::rules::RuleSet).
///
/// `index` is the rule's position in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("rule '{rule}' has an invalid pattern: {message}")]
    InvalidPattern {
        index: usize,
        rule: String,
        message: String,
    },

    #[error("rule #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("rule '{rule}' is declared more than once")]
    DuplicateName { index: usize, rule: String },
}

impl PolicyError {
    /// Position of the offending rule in declaration order.
    pub fn index(&self) -> usize {
        match self {
            PolicyError::InvalidPattern { index, .. }
            | PolicyError::EmptyName { index }
            | PolicyError::DuplicateName { index, .. } => *index,
        }
    }

    /// Name of the offending rule (empty for [`PolicyError::EmptyName`]).
    pub fn rule(&self) -> &str {
        match self {
            PolicyError::InvalidPattern { rule, .. } | PolicyError::DuplicateName { rule, .. } => {
                rule
            }
            PolicyError::EmptyName { .. } => "",
        }
    }
}
