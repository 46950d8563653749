//! The rule evaluator (C5): a single flat pass over the compiled rule
//! list with chain/skip/next/last semantics, producing a
//! [`RewriteResult`].
//!
//! Unlike the grouped, per-block restart model an earlier revision of
//! this crate used (conditions and rules bucketed into independently
//! restarting blocks), the restart ("`Next`") semantics here are global
//! across the *entire* ordered rule list: one `restart_budget`, one
//! pass, restarted from the top on trigger. That's a deliberate
//! generalization of the teacher's per-group loop into a single
//! document-wide state machine — see `DESIGN.md`.

use std::collections::HashMap;

use crate::context::RequestContext;
use crate::expand::expand_variables;
use crate::flag::Flag;
use crate::result::RewriteResult;
use crate::rule::Rule;
use crate::uri::UriParts;

/// Evaluate `rules` against `ctx`, producing a [`RewriteResult`].
///
/// Pure and total: identical `rules` and `ctx` always yield an identical
/// result, and this function never fails. Any runtime anomaly degrades
/// to "this entry does not match" rather than propagating an error —
/// the evaluator never throws through its public boundary.
pub fn evaluate(rules: &[Rule], ctx: &RequestContext) -> RewriteResult {
    let original_uri = ctx.original_uri().to_owned();
    let original_fragment = ctx.uri_parts().fragment.clone();

    let mut uri = original_uri.clone();
    let mut cookies: HashMap<String, (String, u64)> = HashMap::new();
    let mut env_vars: HashMap<String, String> = HashMap::new();
    let mut server_string: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut status_override: Option<u16> = None;

    // Fixed at the outset: a `Next` trigger only ever counts down
    // against this ceiling, never back up. Re-raising it on every
    // trigger (as a literal reading of a stray bookkeeping detail in
    // the rule-processing text would suggest) defeats the termination
    // guarantee entirely; the monotonic-countdown contract in this
    // component's resource-accounting notes is authoritative.
    //
    // The cap bounds *total rule evaluations*, not *restarts*: the
    // initial pass already counts as one evaluation against the cap, so
    // only `cap - 1` further restarts are allowed (one fewer unit of
    // budget than the cap itself) — otherwise a single always-matching
    // `Next`-flagged rule would evaluate `cap + 1` times, one past the
    // documented bound.
    let next_cap = max_next_cap(rules);
    let mut restart_budget = next_cap.saturating_sub(1);
    let evaluation_cap = (rules.len() as u64 + 1) * (next_cap as u64 + 1) + 1;

    let mut chained = false;
    let mut previous_ok = false;
    let mut skip: u32 = 0;
    let mut index = 0usize;
    let mut evaluations: u64 = 0;

    while index < rules.len() {
        evaluations += 1;
        if evaluations > evaluation_cap {
            tracing::warn!("rewrite evaluator exceeded its resource bound; halting defensively");
            break;
        }

        if skip > 0 {
            skip -= 1;
            index += 1;
            continue;
        }

        let rule = &rules[index];
        let flags = rule.flags();

        if chained && !previous_ok {
            // remainder of the chain is skipped; previous_ok stays false
        } else if rule.is_condition() {
            let expanded = expand_variables(rule.condition_input().unwrap_or_default(), ctx);
            previous_ok = rule.is_match(&expanded);
        } else {
            previous_ok = apply_rule(rule, &mut uri, &original_fragment);
        }

        // A condition always implicitly chains into the entry that
        // follows it — that's how `RewriteCond` gates the next
        // `RewriteRule` without an explicit flag. A rule only chains
        // forward when it explicitly carries `Chained`.
        chained = rule.is_condition() || flags.contains(&Flag::Chained);

        let mut restart_requested = false;
        let mut halt_requested = false;
        let mut next_skip: Option<u32> = None;

        if previous_ok {
            for flag in flags {
                match flag {
                    Flag::Cookie { name, value, ttl } => {
                        cookies.insert(name.clone(), (value.clone(), *ttl));
                    }
                    Flag::EnvVar { name, value } => {
                        env_vars.insert(name.clone(), value.clone());
                    }
                    Flag::ServerString(s) => server_string = Some(s.clone()),
                    Flag::MimeType(t) => mime_type = Some(t.clone()),
                    Flag::Status(code) => status_override = Some(*code),
                    Flag::Skip(n) => next_skip = Some(*n),
                    Flag::Next { cap: _ } => {
                        if restart_budget > 0 {
                            restart_budget -= 1;
                            restart_requested = true;
                        } else {
                            tracing::warn!(
                                uri = %uri,
                                "rewrite restart budget exhausted; halting at current uri"
                            );
                        }
                    }
                    Flag::Last => halt_requested = true,
                    Flag::Chained
                    | Flag::NoCase
                    | Flag::NoEscape
                    | Flag::NoQuery
                    | Flag::NoPlus
                    | Flag::QueryAppend => {}
                }
            }
        }

        if restart_requested {
            index = 0;
            chained = false;
            previous_ok = false;
            skip = 0;
            continue;
        }
        if halt_requested {
            break;
        }
        if let Some(n) = next_skip {
            skip = n;
        }
        index += 1;
    }

    RewriteResult {
        uri,
        original_uri,
        cookies,
        env_vars,
        server_string,
        mime_type,
        status_override,
    }
}

fn max_next_cap(rules: &[Rule]) -> u32 {
    rules
        .iter()
        .flat_map(|r| r.flags())
        .filter_map(|f| match f {
            Flag::Next { cap } => Some(*cap),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

/// The string a non-condition rule's pattern is matched against:
/// percent-decoded path (plus query, unless `NoQuery`), with one
/// leading `/` stripped.
fn candidate_input(uri: &str, flags: &[Flag]) -> String {
    let parts = UriParts::parse(uri);
    let raw = if flags.contains(&Flag::NoQuery) {
        parts.path
    } else {
        match parts.query {
            Some(q) if !q.is_empty() => format!("{}?{}", parts.path, q),
            _ => parts.path,
        }
    };
    let decoded = percent_encoding::percent_decode_str(&raw)
        .decode_utf8_lossy()
        .into_owned();
    decoded
        .strip_prefix('/')
        .map(|s| s.to_owned())
        .unwrap_or(decoded)
}

/// True if `s` begins with a `scheme://` prefix.
fn has_scheme(s: &str) -> bool {
    match s.find("://") {
        Some(idx) if idx > 0 => s[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Attempt to match and rewrite `uri` against `rule`. Returns whether
/// the rule matched; on a match, `uri` is replaced with the composed
/// result (absolute promotion, query append, fragment re-attachment,
/// and the `+`-for-space substitution all applied in that order, per
/// the specification).
fn apply_rule(rule: &Rule, uri: &mut String, original_fragment: &Option<String>) -> bool {
    let flags = rule.flags();
    let candidate = candidate_input(uri, flags);
    let Some(captures) = rule.try_match(&candidate) else {
        return false;
    };

    let noescape = flags.contains(&Flag::NoEscape);
    let mut substitution = if rule.output_expression() == "-" {
        candidate.clone()
    } else {
        rule.substitute(&captures, noescape)
    };

    let current = UriParts::parse(uri);
    if !has_scheme(&substitution) && !current.is_relative() {
        let prefix = current.origin_prefix();
        substitution = format!("{prefix}{}", substitution.trim_start_matches('/'));
    }

    if flags.contains(&Flag::QueryAppend) {
        if let Some(q) = &current.query {
            if !q.is_empty() {
                substitution.push(if substitution.contains('?') { '&' } else { '?' });
                substitution.push_str(q);
            }
        }
    }

    if !substitution.contains('#') {
        if let Some(frag) = original_fragment {
            substitution.push('#');
            substitution.push_str(frag);
        }
    }

    if !flags.contains(&Flag::NoPlus) {
        substitution = substitution.replace(' ', "+");
    }

    *uri = substitution;
    true
}
