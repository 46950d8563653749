//! Substitution of `%{NAME}` tokens in condition inputs.
//!
//! Expansion is purely textual: a substituted value is never re-scanned
//! for further `%{...}` tokens, and an unrecognised name is left intact
//! rather than replaced with an empty string — that distinction matters
//! for `RewriteCond` authors debugging a typo'd variable name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::RequestContext;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"%\{(\w+)\}").unwrap());

/// Crate version, exposed to rules as `%{API_VERSION}`.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

fn lookup(name: &str, ctx: &RequestContext) -> Option<String> {
    let upper = name.to_ascii_uppercase();
    Some(match upper.as_str() {
        "HTTP_USER_AGENT" => ctx.user_agent.clone().unwrap_or_default(),
        "HTTP_COOKIE" => ctx.cookie_string.clone().unwrap_or_default(),
        "HTTP_HOST" => ctx.uri_parts.authority.clone().unwrap_or_default(),
        "REMOTE_ADDR" => ctx
            .sender_addr
            .map(|a| a.to_string())
            .unwrap_or_default(),
        "REMOTE_HOST" => ctx.resolved.remote_host.clone().unwrap_or_default(),
        "REMOTE_USER" | "REMOTE_IDENT" => match (ctx.sender_addr, ctx.sender_port) {
            (Some(addr), Some(port)) => format!("{addr}:{port}"),
            _ => String::new(),
        },
        "REQUEST_METHOD" => ctx.method.clone(),
        "SCRIPT_FILENAME" | "REQUEST_FILENAME" => ctx.uri_parts.path.clone(),
        "QUERY_STRING" => ctx.uri_parts.query.clone().unwrap_or_default(),
        "DOCUMENT_ROOT" => ctx.document_root.clone().unwrap_or_default(),
        "SERVER_NAME" => ctx.resolved.server_name.clone().unwrap_or_default(),
        "SERVER_ADDR" => ctx.resolved.server_addr.clone().unwrap_or_default(),
        "SERVER_PORT" => ctx
            .listening_port
            .map(|p| p.to_string())
            .unwrap_or_default(),
        "SERVER_PROTOCOL" | "SERVER_SOFTWARE" => ctx.server_string.clone().unwrap_or_default(),
        "TIME_YEAR" => ctx.request_time.format("%Y").to_string(),
        "TIME_MON" => ctx.request_time.format("%m").to_string(),
        "TIME_DAY" => ctx.request_time.format("%d").to_string(),
        "TIME_HOUR" => ctx.request_time.format("%H").to_string(),
        "TIME_MIN" => ctx.request_time.format("%M").to_string(),
        "TIME_SEC" => ctx.request_time.format("%S").to_string(),
        "TIME_WDAY" => ctx.request_time.format("%A").to_string(),
        "TIME" => ctx.request_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        "API_VERSION" => API_VERSION.to_owned(),
        "REQUEST_URI" => ctx.original_uri.clone(),
        _ => return None,
    })
}

/// Replace every `%{NAME}` token in `input` using `ctx`. Unknown names
/// are left untouched.
pub fn expand_variables(input: &str, ctx: &RequestContext) -> String {
    TOKEN
        .replace_all(input, |caps: &regex::Captures| {
            let name = &caps[1];
            lookup(name, ctx).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}
