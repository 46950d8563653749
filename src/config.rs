//! Engine configuration (C8): where rules come from and the server
//! identity used to seed request contexts.

use std::path::PathBuf;

/// Configuration bundle consumed by [`crate::Engine::from_config`].
///
/// Mirrors the teacher crate's `rules_file`/`rules` builder pair,
/// generalized with the server-identity knobs `RequestContext` needs to
/// answer `%{SERVER_SOFTWARE}`/`%{DOCUMENT_ROOT}` lookups.
#[derive(Debug, Default, Clone)]
pub struct EngineConfig {
    pub rules_file: Option<PathBuf>,
    pub extra_rules: Vec<String>,
    pub initial_engine_on: bool,
    pub server_string: Option<String>,
    pub document_root: Option<String>,
}

impl EngineConfig {
    /// A fresh config with the engine on by default.
    pub fn new() -> Self {
        Self {
            initial_engine_on: true,
            ..Default::default()
        }
    }

    pub fn rules_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_file = Some(path.into());
        self
    }

    /// Append a rule or condition line, parsed alongside whatever
    /// `rules_file` contributes.
    pub fn rule(mut self, line: impl Into<String>) -> Self {
        self.extra_rules.push(line.into());
        self
    }

    pub fn initial_engine_on(mut self, on: bool) -> Self {
        self.initial_engine_on = on;
        self
    }

    pub fn server_string(mut self, server_string: impl Into<String>) -> Self {
        self.server_string = Some(server_string.into());
        self
    }

    pub fn document_root(mut self, document_root: impl Into<String>) -> Self {
        self.document_root = Some(document_root.into());
        self
    }
}
