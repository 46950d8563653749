//! Rule model: an immutable match/rewrite entry, or — when it carries a
//! `condition_input` — a `RewriteCond` predicate.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::{Captures, Regex, RegexBuilder};

use crate::error::ParseError;
use crate::flag::Flag;

// https://url.spec.whatwg.org/#percent-encoded-bytes
const ESCAPE: &AsciiSet = &CONTROLS
    .add(b'~')
    .add(b' ')
    .add(b'\'')
    .add(b'"')
    .add(b'`')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'^')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'$')
    .add(b'&')
    .add(b'+')
    .add(b',');

/// A single compiled `RewriteRule` or `RewriteCond` entry.
///
/// Construction always validates the regex by trial compilation; a rule
/// with an invalid pattern never exists.
#[derive(Clone, Debug)]
pub struct Rule {
    pattern_src: String,
    match_regex: Regex,
    output_expression: String,
    condition_input: Option<String>,
    flags: Vec<Flag>,
}

impl Rule {
    /// Build a `RewriteRule` entry. `line` is the offending source line,
    /// carried into any resulting `ParseError` for diagnostics.
    pub fn new_rule(
        pattern: &str,
        replacement: &str,
        flags: Vec<Flag>,
        line: &str,
    ) -> Result<Self, ParseError> {
        Self::build(pattern, replacement, None, flags, line)
    }

    /// Build a `RewriteCond` entry. `condition_input` is the (unexpanded)
    /// string matched against `pattern`; `line` is the offending source
    /// line, carried into any resulting `ParseError` for diagnostics.
    pub fn new_condition(
        condition_input: &str,
        pattern: &str,
        flags: Vec<Flag>,
        line: &str,
    ) -> Result<Self, ParseError> {
        Self::build(pattern, "$0", Some(condition_input.to_owned()), flags, line)
    }

    fn build(
        pattern: &str,
        replacement: &str,
        condition_input: Option<String>,
        flags: Vec<Flag>,
        line: &str,
    ) -> Result<Self, ParseError> {
        let mut flags = flags;
        dedupe(&mut flags);
        let case_insensitive = flags.contains(&Flag::NoCase);
        let match_regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|_| ParseError::invalid_regex(line))?;
        Ok(Self {
            pattern_src: pattern.to_owned(),
            match_regex,
            output_expression: replacement.to_owned(),
            condition_input,
            flags,
        })
    }

    /// True if this entry is a `RewriteCond` predicate rather than a
    /// `RewriteRule`.
    #[inline]
    pub fn is_condition(&self) -> bool {
        self.condition_input.is_some()
    }

    #[inline]
    pub fn condition_input(&self) -> Option<&str> {
        self.condition_input.as_deref()
    }

    #[inline]
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    #[inline]
    pub fn output_expression(&self) -> &str {
        &self.output_expression
    }

    /// Try to match `input` against this rule's pattern.
    pub fn try_match<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        self.match_regex.captures(input)
    }

    /// True if `input` matches this rule's pattern (used for
    /// conditions, which don't need the capture groups).
    pub fn is_match(&self, input: &str) -> bool {
        self.match_regex.is_match(input)
    }

    /// Expand `$0`..`$9` backreferences in `output_expression` against
    /// the given capture groups. Each substituted group is
    /// percent-encoded unless `noescape` is set; the literal template
    /// text around it never is.
    ///
    /// Per the specification, a replacement of exactly `"-"` means "the
    /// input unchanged" — callers are expected to special-case that
    /// before reaching for this method, since the unchanged substitution
    /// is the raw candidate string, not a regex expansion.
    pub fn substitute(&self, captures: &Captures<'_>, noescape: bool) -> String {
        let mut out = String::new();
        let mut chars = self.output_expression.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c == '$' {
                if let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        chars.next();
                        let idx = d.to_digit(10).unwrap() as usize;
                        if let Some(m) = captures.get(idx) {
                            if noescape {
                                out.push_str(m.as_str());
                            } else {
                                out.push_str(&utf8_percent_encode(m.as_str(), ESCAPE).to_string());
                            }
                        }
                        continue;
                    }
                }
            }
            out.push(c);
        }
        out
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern_src == other.pattern_src
            && self.output_expression == other.output_expression
            && self.condition_input == other.condition_input
            && self.flags == other.flags
    }
}

impl Eq for Rule {}

impl Default for Rule {
    fn default() -> Self {
        Self::build("^$", "$0", None, Vec::new(), "^$")
            .expect("default rule pattern always compiles")
    }
}

fn dedupe(flags: &mut Vec<Flag>) {
    let mut seen = Vec::with_capacity(flags.len());
    flags.retain(|f| {
        if seen.contains(f) {
            false
        } else {
            seen.push(f.clone());
            true
        }
    });
}
