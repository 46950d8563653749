//! Parses a `.htaccess`-style rule document into an ordered, flat list
//! of [`Rule`] entries (conditions and rules interleaved, in source
//! order) ready for the evaluator.

use crate::error::{ParseError, ParseErrors};
use crate::flag::Flag;
use crate::rule::Rule;

/// Parse a rule document into a compiled, ordered rule list.
///
/// `initial_engine_on` seeds the `RewriteEngine` toggle the document may
/// flip; lines encountered while the engine is off are dropped rather
/// than producing rules. Every error found across the document is
/// collected and returned together — a single bad line never silently
/// drops the rest of the file.
pub fn parse_rules(document: &str, initial_engine_on: bool) -> Result<Vec<Rule>, ParseErrors> {
    let mut engine_on = initial_engine_on;
    let mut rules = Vec::new();
    let mut errors = Vec::new();

    for raw_line in document.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let tokens = match tokenize(line) {
            Ok(t) => t,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if tokens.is_empty() {
            continue;
        }
        match normalize_directive(&tokens[0]).as_str() {
            "rewriteengine" => match parse_engine_state(&tokens, line) {
                Ok(on) => engine_on = on,
                Err(e) => errors.push(e),
            },
            "rewriterule" if engine_on => match parse_rule_line(&tokens, line) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            },
            "rewritecond" if engine_on => match parse_cond_line(&tokens, line) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            },
            "rewriterule" | "rewritecond" => {
                // engine disabled: the line is dropped, not an error
            }
            _ => errors.push(ParseError::unknown_directive(line)),
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            count = errors.len(),
            "failed to parse rewrite rule document, discarding collected errors"
        );
        return Err(ParseErrors(errors));
    }
    dedupe_rules(&mut rules);
    Ok(rules)
}

fn normalize_directive(token: &str) -> String {
    token.chars().filter(|c| *c != '-').collect::<String>().to_ascii_lowercase()
}

fn parse_engine_state(tokens: &[String], line: &str) -> Result<bool, ParseError> {
    let value = tokens
        .get(1)
        .ok_or_else(|| ParseError::missing_field(line))?
        .to_ascii_lowercase();
    match value.as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        _ => Err(ParseError::unknown_directive(line)),
    }
}

fn parse_rule_line(tokens: &[String], line: &str) -> Result<Rule, ParseError> {
    if tokens.len() < 3 || tokens.len() > 4 {
        return Err(ParseError::missing_field(line));
    }
    let pattern = &tokens[1];
    let replacement = &tokens[2];
    let flags = match tokens.get(3) {
        Some(f) => parse_flag_list(f, line)?,
        None => Vec::new(),
    };
    Rule::new_rule(pattern, replacement, flags, line)
}

fn parse_cond_line(tokens: &[String], line: &str) -> Result<Rule, ParseError> {
    if tokens.len() < 3 || tokens.len() > 4 {
        return Err(ParseError::missing_field(line));
    }
    let condition_input = &tokens[1];
    let pattern = &tokens[2];
    let flags = match tokens.get(3) {
        Some(f) => parse_flag_list(f, line)?,
        None => Vec::new(),
    };
    Rule::new_condition(condition_input, pattern, flags, line)
}

fn parse_flag_list(token: &str, line: &str) -> Result<Vec<Flag>, ParseError> {
    if !token.starts_with('[') || !token.ends_with(']') || token.len() < 2 {
        return Err(ParseError::flags_missing_brackets(line));
    }
    token[1..token.len() - 1]
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| Flag::parse(t, line))
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Whitespace-split tokenizer with `"double-quoted"` token support:
/// outer quotes are stripped, internal whitespace preserved.
fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut closed = false;
            for c2 in chars.by_ref() {
                if c2 == '"' {
                    closed = true;
                    break;
                }
                current.push(c2);
            }
            if !closed {
                return Err(ParseError::unterminated_quote(line));
            }
            tokens.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
        chars.next();
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn dedupe_rules(rules: &mut Vec<Rule>) {
    let mut seen: Vec<Rule> = Vec::with_capacity(rules.len());
    rules.retain(|r| {
        if seen.contains(r) {
            false
        } else {
            seen.push(r.clone());
            true
        }
    });
}
