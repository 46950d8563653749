//! Framework agnostic reimplementation of HTTPD's [mod_rewrite](https://httpd.apache.org/docs/current/mod/mod_rewrite.html).
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use rewrite_engine::{Engine, RequestContext};
//!
//! let engine = Engine::default();
//! engine.add_rules(r#"
//!   RewriteRule /file/(.*)     /tmp/$1      [L]
//!   RewriteRule /redirect/(.*) /location/$1 [R=302]
//!   RewriteRule /blocked/(.*)  -            [F]
//! "#).expect("failed to process rules");
//!
//! let ctx = RequestContext::new("http://localhost/file/my/document.txt", Utc::now());
//! let result = engine.evaluate(&ctx);
//! println!("{result:?}");
//! ```
use std::sync::{Arc, RwLock};

pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod expand;
pub mod flag;
pub mod parser;
pub mod result;
pub mod rule;
pub mod uri;

pub use config::EngineConfig;
pub use context::{RequestContext, ResolvedNames};
pub use error::{ParseError, ParseErrors};
pub use flag::Flag;
pub use result::RewriteResult;
pub use rule::Rule;

/// Compiled rewrite engine: an ordered, immutable rule list shared via
/// `Arc` across evaluators.
///
/// `evaluate` is pure and takes `&self` — concurrent evaluations across
/// requests share no mutable state. Re-parsing (`add_rules`,
/// `load_config`) publishes a fresh `Arc` behind a `RwLock`, so an
/// in-flight evaluation always sees one complete, consistent rule list,
/// never a half-updated one.
#[derive(Debug, Default)]
pub struct Engine {
    rules: RwLock<Arc<Vec<Rule>>>,
}

impl Engine {
    /// Build an engine from a configuration bundle: loads the rule-source
    /// file (if present), prepends `extra_rules`, and compiles the
    /// result.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ParseErrors> {
        let engine = Self::default();
        engine.load_config(config)?;
        Ok(engine)
    }

    /// Load (or reload) rules from a configuration bundle, replacing
    /// whatever rule set the engine currently holds.
    pub fn load_config(&self, config: &EngineConfig) -> Result<(), ParseErrors> {
        // Extra programmatic rules are prepended to the file's rules, not
        // appended — an extra rule meant to run first (an override ahead
        // of the file's own rules) has to land first in the document.
        let mut document = String::new();
        for extra in &config.extra_rules {
            document.push_str(extra);
            document.push('\n');
        }
        if let Some(path) = &config.rules_file {
            match std::fs::read_to_string(path) {
                Ok(contents) => document.push_str(&contents),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to read rewrite rule source, continuing with extra_rules only"
                    );
                }
            }
        }
        let rules = parser::parse_rules(&document, config.initial_engine_on)?;
        tracing::info!(count = rules.len(), "loaded rewrite rules");
        self.publish(rules);
        Ok(())
    }

    /// Parse additional rules and append them to the existing engine.
    #[inline]
    pub fn add_rules(&self, rules: &str) -> Result<(), ParseErrors> {
        let mut combined = (*self.snapshot()).clone();
        combined.extend(parser::parse_rules(rules, true)?);
        self.publish(combined);
        Ok(())
    }

    /// Evaluate a request context against the current rule set.
    ///
    /// Never fails — see [`error::EvaluationError`].
    #[inline]
    pub fn evaluate(&self, ctx: &RequestContext) -> RewriteResult {
        let rules = self.snapshot();
        evaluator::evaluate(&rules, ctx)
    }

    fn snapshot(&self) -> Arc<Vec<Rule>> {
        self.rules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn publish(&self, rules: Vec<Rule>) {
        *self
            .rules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(rules);
    }
}

impl std::str::FromStr for Engine {
    type Err = ParseErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rules = parser::parse_rules(s, true)?;
        Ok(Self {
            rules: RwLock::new(Arc::new(rules)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    #[test]
    fn add_rules_then_evaluate() {
        let engine = Engine::default();
        engine
            .add_rules(
                r#"
                RewriteRule /file/(.*)     /tmp/$1      [L]
                RewriteRule /redirect/(.*) /location/$1 [R=302]
                RewriteRule /blocked/(.*)  -            [F]
                "#,
            )
            .unwrap();

        let ctx = RequestContext::new("http://localhost/file/my/document.txt", Utc::now());
        let result = engine.evaluate(&ctx);
        assert_eq!(result.uri, "http://localhost/tmp/my/document.txt");

        let ctx = RequestContext::new("http://localhost/redirect/away", Utc::now());
        let result = engine.evaluate(&ctx);
        assert_eq!(result.uri, "http://localhost/location/away");
        assert_eq!(result.status_override, Some(302));

        let ctx = RequestContext::new("http://localhost/blocked/x", Utc::now());
        let result = engine.evaluate(&ctx);
        assert_eq!(result.status_override, Some(403));
    }

    #[test]
    fn from_str_compiles_rules() {
        let engine = Engine::from_str("RewriteRule ^a$ b [L]").unwrap();
        let ctx = RequestContext::new("http://h/a", Utc::now());
        assert_eq!(engine.evaluate(&ctx).uri, "http://h/b");
    }

    #[test]
    fn from_str_surfaces_parse_errors() {
        assert!(Engine::from_str("RewriteRule (unclosed b").is_err());
    }

    #[test]
    fn from_config_loads_extra_rules_without_file() {
        let config = EngineConfig::new().rule("RewriteRule ^a$ b [L]");
        let engine = Engine::from_config(&config).unwrap();
        let ctx = RequestContext::new("http://h/a", Utc::now());
        assert_eq!(engine.evaluate(&ctx).uri, "http://h/b");
    }

    #[test]
    fn add_rules_extends_rather_than_replaces() {
        let engine = Engine::default();
        engine.add_rules("RewriteRule ^a$ x [L]").unwrap();
        engine.add_rules("RewriteRule ^b$ y [L]").unwrap();

        let ctx = RequestContext::new("http://h/a", Utc::now());
        assert_eq!(engine.evaluate(&ctx).uri, "http://h/x");
        let ctx = RequestContext::new("http://h/b", Utc::now());
        assert_eq!(engine.evaluate(&ctx).uri, "http://h/y");
    }
}
