//! Error types surfaced by the rule parser.
//!
//! Evaluation never fails (see the crate's top-level docs): any runtime
//! anomaly degrades to "rule does not match" rather than propagating an
//! error. Only parsing can fail, and it fails by collecting every error
//! in the document rather than stopping at the first.

use thiserror::Error;

/// A single parse failure, carrying the offending source line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("bad flag argument: {0}")]
    BadFlagArgument(String),

    #[error("bad regex in rule: {0}")]
    InvalidRegex(String),

    #[error("unterminated quoted token: {0}")]
    UnterminatedQuote(String),

    #[error("rule flags missing brackets: {0}")]
    FlagsMissingBrackets(String),

    #[error("RewriteRule is missing a pattern or replacement: {0}")]
    MissingField(String),
}

impl ParseError {
    pub(crate) fn unknown_directive(line: &str) -> Self {
        Self::UnknownDirective(line.to_owned())
    }
    pub(crate) fn unknown_flag(line: &str) -> Self {
        Self::UnknownFlag(line.to_owned())
    }
    pub(crate) fn bad_flag_argument(line: &str) -> Self {
        Self::BadFlagArgument(line.to_owned())
    }
    pub(crate) fn invalid_regex(line: &str) -> Self {
        Self::InvalidRegex(line.to_owned())
    }
    pub(crate) fn unterminated_quote(line: &str) -> Self {
        Self::UnterminatedQuote(line.to_owned())
    }
    pub(crate) fn flags_missing_brackets(line: &str) -> Self {
        Self::FlagsMissingBrackets(line.to_owned())
    }
    pub(crate) fn missing_field(line: &str) -> Self {
        Self::MissingField(line.to_owned())
    }
}

/// All parse failures collected while processing a rule document.
///
/// A single bad rule never silently drops the rest of the file: the
/// loader either returns a fully-compiled rule set, or every error it
/// found, together.
#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("{}", format_errors(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn format_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reserved for API symmetry with the parser's error type.
///
/// No code path in this crate ever constructs one: §7 of the
/// specification mandates that the evaluator never throws through its
/// public boundary, so `evaluate` returns a `RewriteResult` directly
/// rather than a `Result`. This type documents that guarantee instead of
/// silently omitting it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {}
