//! End-to-end scenarios exercised through the public `Engine` API,
//! one per documented rewrite behaviour.

use chrono::Utc;
use rewrite_engine::{Engine, RequestContext};

fn engine(doc: &str) -> Engine {
    Engine::default().add_from(doc)
}

trait EngineExt {
    fn add_from(self, doc: &str) -> Self;
}

impl EngineExt for Engine {
    fn add_from(self, doc: &str) -> Self {
        self.add_rules(doc).expect("rules should parse");
        self
    }
}

fn ctx(uri: &str) -> RequestContext {
    RequestContext::new(uri, Utc::now())
}

#[test]
fn plain_rewrite_with_backreference() {
    let engine = engine("RewriteRule ^old/(.*)$ /new/$1 [L]");
    let result = engine.evaluate(&ctx("http://h/old/x"));
    assert_eq!(result.uri, "http://h/new/x");
}

#[test]
fn condition_gates_the_following_rule() {
    let engine = engine(
        "RewriteCond %{HTTP_USER_AGENT} MSIE [NC]\nRewriteRule ^(.*)$ /ie/$1 [L]",
    );

    let msie = ctx("http://h/foo").user_agent("Mozilla/4.0 (compatible; MSIE 6.0)");
    assert_eq!(engine.evaluate(&msie).uri, "http://h/ie/foo");

    let curl = ctx("http://h/foo").user_agent("curl/8.0");
    assert_eq!(engine.evaluate(&curl).uri, "http://h/foo");
}

#[test]
fn skip_flag_bypasses_the_next_rule() {
    let engine = engine(
        "RewriteRule ^a$ b [S=1]\nRewriteRule ^b$ c [L]\nRewriteRule ^b$ d [L]",
    );
    assert_eq!(engine.evaluate(&ctx("http://h/a")).uri, "http://h/d");
}

#[test]
fn query_string_append_merges_original_query() {
    let engine = engine("RewriteRule ^p$ /q?x=1 [QSA,L]");
    let result = engine.evaluate(&ctx("http://h/p?y=2"));
    assert_eq!(result.uri, "http://h/q?x=1&y=2");
}

#[test]
fn cookie_and_status_override_without_changing_the_uri() {
    let engine = engine("RewriteRule ^login$ /login [CO=sid:abc:3600,R=302,L]");
    let result = engine.evaluate(&ctx("http://h/login"));
    assert_eq!(result.uri, result.original_uri);
    assert_eq!(
        result.cookies.get("sid"),
        Some(&("abc".to_owned(), 3600u64))
    );
    assert_eq!(result.status_override, Some(302));
}

#[test]
fn next_flag_terminates_instead_of_looping_forever() {
    let engine = engine("RewriteRule ^(.*)$ $1x [N]");
    let result = engine.evaluate(&ctx("http://h/a"));
    let expected = format!("http://h/a{}", "x".repeat(32_000));
    assert_eq!(result.uri, expected);
}

#[test]
fn next_flag_honors_an_explicit_cap() {
    let engine = engine("RewriteRule ^(.*)$ $1x [N=3]");
    let result = engine.evaluate(&ctx("http://h/a"));
    assert_eq!(result.uri, "http://h/axxx");
}

#[test]
fn forbidden_shorthand_sets_status_without_changing_uri() {
    let engine = engine("RewriteRule ^blocked/(.*)$ - [F]");
    let result = engine.evaluate(&ctx("http://h/blocked/x"));
    assert_eq!(result.uri, result.original_uri);
    assert_eq!(result.status_override, Some(403));
}

#[test]
fn evaluation_is_deterministic_for_identical_inputs() {
    let engine = engine("RewriteRule ^old/(.*)$ /new/$1 [L]");
    let request = ctx("http://h/old/x");
    assert_eq!(engine.evaluate(&request), engine.evaluate(&request));
}

#[test]
fn bad_document_collects_every_error() {
    let result =
        Engine::default().add_rules("RewriteRule (bad b\nRewriteRule ^ok$ fine [WTF]");
    let errors = result.unwrap_err();
    assert_eq!(errors.0.len(), 2);
}

#[test]
fn disabled_engine_drops_rules_until_reenabled() {
    let engine = engine(
        "RewriteEngine off\nRewriteRule ^a$ x\nRewriteEngine on\nRewriteRule ^b$ y [L]",
    );
    assert_eq!(engine.evaluate(&ctx("http://h/a")).uri, "http://h/a");
    assert_eq!(engine.evaluate(&ctx("http://h/b")).uri, "http://h/y");
}
