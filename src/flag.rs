//! Flag model for `RewriteRule`/`RewriteCond` entries.
//!
//! A single tagged enum carries every recognised flag rather than the
//! split shift/mod/resolve sub-enums an earlier revision of this crate
//! used — `mod_rewrite` flags don't actually partition that cleanly once
//! cookies, env vars, and overrides are in the mix, so one flat type with
//! a payload per variant is easier to reason about at the evaluator.

use std::str::FromStr;

use crate::error::ParseError;

/// Default restart cap for a bare `N`/`Next` flag.
pub const DEFAULT_NEXT_CAP: u32 = 32_000;

/// Default cookie time-to-live, in seconds, for a bare `CO=name:value`.
pub const DEFAULT_COOKIE_TTL: u64 = 86_400;

/// A single `mod_rewrite` rule/condition flag.
///
/// Equality is structural: two flags are equal iff their variant and
/// payload match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `C` — this rule belongs to a chain with the previous entry.
    Chained,
    /// `CO=name:value[:ttl]` — emit a cookie on success.
    Cookie {
        name: String,
        value: String,
        ttl: u64,
    },
    /// `E=name:value` — set a request-scoped environment variable.
    EnvVar { name: String, value: String },
    /// `L`/`END` — stop evaluation after this rule succeeds.
    Last,
    /// `N[=cap]` — restart evaluation from the first rule.
    Next { cap: u32 },
    /// `NC` — case-insensitive match, this rule only.
    NoCase,
    /// `NE` — do not percent-encode the substitution result.
    NoEscape,
    /// `NQ`/`QSD` — match path only, discarding the query string.
    NoQuery,
    /// `BNP` — do not replace spaces with `+` in the rewritten URI.
    ///
    /// Distinct from `Chained`: an earlier revision of this crate's
    /// source material constructed `BNP` identically to `C`, which was a
    /// bug. The two must never be conflated.
    NoPlus,
    /// `QSA` — append the original query string to the substitution.
    QueryAppend,
    /// `R[=code]`/`F`/`G` — override the HTTP status for this response.
    Status(u16),
    /// `S=n` — skip the next `n` rules on success.
    Skip(u32),
    /// `SS=str` — override the server identity string.
    ServerString(String),
    /// `T=mime` — override the response content type (lower-cased).
    MimeType(String),
}

impl Flag {
    /// Parse a single flag token (already split out of the `[...]`
    /// bracket and comma list) into a `Flag`.
    pub(crate) fn parse(token: &str, line: &str) -> Result<Self, ParseError> {
        let (name, arg) = match token.split_once('=') {
            Some((n, a)) => (n, Some(a)),
            None => (token, None),
        };
        match name.to_ascii_uppercase().as_str() {
            "C" => Ok(Flag::Chained),
            "CO" => parse_cookie(arg, line),
            "E" => parse_envvar(arg, line),
            "F" => Ok(Flag::Status(403)),
            "G" => Ok(Flag::Status(410)),
            "L" | "END" => Ok(Flag::Last),
            "N" => Ok(Flag::Next {
                cap: parse_u32_opt(arg, DEFAULT_NEXT_CAP, line)?,
            }),
            "NC" => Ok(Flag::NoCase),
            "NE" => Ok(Flag::NoEscape),
            "NQ" | "QSD" => Ok(Flag::NoQuery),
            "BNP" => Ok(Flag::NoPlus),
            "QSA" => Ok(Flag::QueryAppend),
            "R" => Ok(Flag::Status(parse_status_opt(arg, 307, line)?)),
            "S" => Ok(Flag::Skip(parse_u32_req(arg, line)?)),
            "SS" => Ok(Flag::ServerString(
                arg.ok_or_else(|| ParseError::bad_flag_argument(line))?
                    .to_owned(),
            )),
            "T" => {
                let mime = arg.unwrap_or("");
                let mime = if mime.is_empty() { "text/plain" } else { mime };
                Ok(Flag::MimeType(mime.to_ascii_lowercase()))
            }
            _ => Err(ParseError::unknown_flag(line)),
        }
    }
}

impl FromStr for Flag {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flag::parse(s, s)
    }
}

fn parse_cookie(arg: Option<&str>, line: &str) -> Result<Flag, ParseError> {
    let arg = arg.ok_or_else(|| ParseError::bad_flag_argument(line))?;
    let mut parts = arg.splitn(3, ':');
    let name = parts.next().filter(|s| !s.is_empty());
    let value = parts.next();
    let ttl_str = parts.next();
    let (name, value) = match (name, value) {
        (Some(n), Some(v)) => (n.to_owned(), v.to_owned()),
        _ => return Err(ParseError::bad_flag_argument(line)),
    };
    let ttl = match ttl_str {
        Some(t) => t
            .parse::<u64>()
            .map_err(|_| ParseError::bad_flag_argument(line))?,
        None => DEFAULT_COOKIE_TTL,
    };
    Ok(Flag::Cookie { name, value, ttl })
}

fn parse_envvar(arg: Option<&str>, line: &str) -> Result<Flag, ParseError> {
    let arg = arg.ok_or_else(|| ParseError::bad_flag_argument(line))?;
    let (name, value) = arg
        .split_once(':')
        .ok_or_else(|| ParseError::bad_flag_argument(line))?;
    if name.is_empty() || value.contains(':') {
        return Err(ParseError::bad_flag_argument(line));
    }
    Ok(Flag::EnvVar {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_u32_opt(arg: Option<&str>, default: u32, line: &str) -> Result<u32, ParseError> {
    match arg {
        None | Some("") => Ok(default),
        Some(s) => s.parse().map_err(|_| ParseError::bad_flag_argument(line)),
    }
}

fn parse_u32_req(arg: Option<&str>, line: &str) -> Result<u32, ParseError> {
    arg.ok_or_else(|| ParseError::bad_flag_argument(line))?
        .parse()
        .map_err(|_| ParseError::bad_flag_argument(line))
}

fn parse_status_opt(arg: Option<&str>, default: u16, line: &str) -> Result<u16, ParseError> {
    let status = match arg {
        None | Some("") => default,
        Some(s) => s.parse().map_err(|_| ParseError::bad_flag_argument(line))?,
    };
    if !(100..600).contains(&status) {
        return Err(ParseError::bad_flag_argument(line));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_flags() {
        assert_eq!(Flag::parse("C", "").unwrap(), Flag::Chained);
        assert_eq!(Flag::parse("L", "").unwrap(), Flag::Last);
        assert_eq!(Flag::parse("END", "").unwrap(), Flag::Last);
        assert_eq!(Flag::parse("NC", "").unwrap(), Flag::NoCase);
        assert_eq!(Flag::parse("BNP", "").unwrap(), Flag::NoPlus);
        assert_ne!(Flag::parse("BNP", "").unwrap(), Flag::Chained);
        assert_eq!(Flag::parse("F", "").unwrap(), Flag::Status(403));
        assert_eq!(Flag::parse("G", "").unwrap(), Flag::Status(410));
    }

    #[test]
    fn parses_next_default_and_cap() {
        assert_eq!(
            Flag::parse("N", "").unwrap(),
            Flag::Next {
                cap: DEFAULT_NEXT_CAP
            }
        );
        assert_eq!(Flag::parse("N=10", "").unwrap(), Flag::Next { cap: 10 });
    }

    #[test]
    fn parses_cookie_with_and_without_ttl() {
        assert_eq!(
            Flag::parse("CO=sid:abc", "").unwrap(),
            Flag::Cookie {
                name: "sid".into(),
                value: "abc".into(),
                ttl: DEFAULT_COOKIE_TTL
            }
        );
        assert_eq!(
            Flag::parse("CO=sid:abc:3600", "").unwrap(),
            Flag::Cookie {
                name: "sid".into(),
                value: "abc".into(),
                ttl: 3600
            }
        );
    }

    #[test]
    fn envvar_requires_exactly_one_colon() {
        assert!(Flag::parse("E=foo:bar", "").is_ok());
        assert!(Flag::parse("E=foobar", "").is_err());
        assert!(Flag::parse("E=foo:bar:baz", "").is_err());
    }

    #[test]
    fn status_range_is_validated() {
        assert!(Flag::parse("R=302", "").is_ok());
        assert!(Flag::parse("R=99", "").is_err());
        assert!(Flag::parse("R=700", "").is_err());
        assert_eq!(Flag::parse("R", "").unwrap(), Flag::Status(307));
    }

    #[test]
    fn mimetype_defaults_and_lowercases() {
        assert_eq!(
            Flag::parse("T=TEXT/HTML", "").unwrap(),
            Flag::MimeType("text/html".into())
        );
        assert_eq!(
            Flag::parse("T", "").unwrap(),
            Flag::MimeType("text/plain".into())
        );
    }

    #[test]
    fn unknown_flag_errors() {
        assert!(Flag::parse("WTF", "").is_err());
    }
}
