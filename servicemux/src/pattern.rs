//! URI template compilation.
//!
//! [`Pattern`] is the built-in [`Matcher`] implementation: a template such as
//! `/users/:id` compiles to an anchored regex with one capture per named
//! segment. Compilation honors the three [`MatchOptions`] axes:
//!
//! - `case_sensitive`: literal segments compare case-insensitively unless
//!   set;
//! - `strict`: a trailing slash is significant only when set;
//! - `end`: full-path match (leaf routes) vs prefix match at a segment
//!   boundary (mounts and middleware).
//!
//! A `/` template compiled with `end = false` is the root mount: it matches
//! every path and consumes nothing, so a router mounted at `/` sees the
//! caller's path unchanged.

use regex::RegexBuilder;
use serde_json::Value;
use servicemux_core::{Match, MatchOptions, Matcher, MuxError, Params};

/// A compiled URI template.
pub struct Pattern {
    regex: regex::Regex,
    names: Vec<String>,
    end: bool,
    match_all: bool,
}

impl Pattern {
    /// Compile a template.
    ///
    /// Templates must start with `/`. A segment of the form `:name` (ASCII
    /// alphanumerics and `_`) matches one path segment and captures it under
    /// `name`; any other segment matches literally.
    pub fn compile(template: &str, options: MatchOptions) -> Result<Self, MuxError> {
        if template.is_empty() {
            return Err(invalid(template, "template is empty"));
        }
        if !template.starts_with('/') {
            return Err(invalid(template, "template must start with '/'"));
        }

        // Root mount: matches everything, consumes nothing.
        if template == "/" && !options.end {
            return Ok(Pattern {
                regex: build_regex("^/", options.case_sensitive, template)?,
                names: Vec::new(),
                end: false,
                match_all: true,
            });
        }

        let had_trailing = template.len() > 1 && template.ends_with('/');
        let trimmed = if had_trailing {
            &template[..template.len() - 1]
        } else {
            template
        };

        let mut source = String::from("^");
        let mut names = Vec::new();
        for segment in trimmed.split('/').skip(1) {
            source.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty()
                    || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(invalid(template, "invalid parameter name"));
                }
                names.push(name.to_string());
                source.push_str("([^/]+)");
            } else {
                source.push_str(&regex::escape(segment));
            }
        }

        if options.end {
            if options.strict {
                if had_trailing {
                    source.push('/');
                }
                source.push('$');
            } else {
                source.push_str("/?$");
            }
        }

        Ok(Pattern {
            regex: build_regex(&source, options.case_sensitive, template)?,
            names,
            end: options.end,
            match_all: false,
        })
    }

    /// The parameter names this template captures, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Matcher for Pattern {
    fn matches(&self, path: &str) -> Option<Match> {
        if self.match_all {
            return Some(Match::default());
        }
        let caps = self.regex.captures(path)?;
        let whole = caps.get(0)?;
        let prefix = whole.as_str();

        // Prefix mode: the unconsumed remainder must begin at a segment
        // boundary, otherwise `/api` would claim `/apix`.
        if !self.end {
            let rest = &path[whole.end()..];
            if !rest.is_empty() && !rest.starts_with('/') && !prefix.ends_with('/') {
                return None;
            }
        }

        let mut params = Params::new();
        for (i, name) in self.names.iter().enumerate() {
            if let Some(capture) = caps.get(i + 1) {
                params.insert(name.clone(), Value::String(capture.as_str().to_string()));
            }
        }
        Some(Match {
            prefix: prefix.to_string(),
            params,
        })
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("regex", &self.regex.as_str())
            .field("names", &self.names)
            .field("end", &self.end)
            .finish()
    }
}

fn build_regex(source: &str, case_sensitive: bool, template: &str) -> Result<regex::Regex, MuxError> {
    RegexBuilder::new(source)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| invalid(template, &e.to_string()))
}

fn invalid(template: &str, reason: &str) -> MuxError {
    MuxError::Pattern {
        pattern: template.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(template: &str) -> Pattern {
        Pattern::compile(template, MatchOptions::default()).unwrap()
    }

    fn prefix(template: &str) -> Pattern {
        Pattern::compile(
            template,
            MatchOptions {
                end: false,
                strict: false,
                ..MatchOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn literal_full_match() {
        let p = full("/users");
        assert!(p.matches("/users").is_some());
        assert!(p.matches("/users/").is_some()); // non-strict tolerates trailing slash
        assert!(p.matches("/users/5").is_none());
        assert!(p.matches("/user").is_none());
    }

    #[test]
    fn named_segments_are_captured() {
        let p = full("/users/:id/posts/:post_id");
        let m = p.matches("/users/42/posts/7").unwrap();
        assert_eq!(m.params["id"], "42");
        assert_eq!(m.params["post_id"], "7");
        assert_eq!(p.names(), ["id", "post_id"]);
        assert!(p.matches("/users/42/posts").is_none());
    }

    #[test]
    fn case_sensitivity_is_opt_in() {
        assert!(full("/Users").matches("/users").is_some());

        let sensitive = Pattern::compile(
            "/Users",
            MatchOptions {
                case_sensitive: true,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        assert!(sensitive.matches("/users").is_none());
        assert!(sensitive.matches("/Users").is_some());
    }

    #[test]
    fn strict_trailing_slash() {
        let strict = Pattern::compile(
            "/users",
            MatchOptions {
                strict: true,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        assert!(strict.matches("/users").is_some());
        assert!(strict.matches("/users/").is_none());

        let strict_trailing = Pattern::compile(
            "/users/",
            MatchOptions {
                strict: true,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        assert!(strict_trailing.matches("/users/").is_some());
        assert!(strict_trailing.matches("/users").is_none());
    }

    #[test]
    fn prefix_match_reports_consumed_prefix() {
        let p = prefix("/api");
        let m = p.matches("/api/users/5").unwrap();
        assert_eq!(m.prefix, "/api");
        assert!(m.params.is_empty());

        assert_eq!(p.matches("/api").unwrap().prefix, "/api");
        assert_eq!(p.matches("/api/").unwrap().prefix, "/api");
    }

    #[test]
    fn prefix_match_requires_segment_boundary() {
        let p = prefix("/api");
        assert!(p.matches("/apix").is_none());
        assert!(p.matches("/apix/users").is_none());
    }

    #[test]
    fn prefix_match_with_params() {
        let p = prefix("/tenants/:tenant");
        let m = p.matches("/tenants/acme/users").unwrap();
        assert_eq!(m.prefix, "/tenants/acme");
        assert_eq!(m.params["tenant"], "acme");
    }

    #[test]
    fn root_mount_consumes_nothing() {
        let p = prefix("/");
        let m = p.matches("/users/5").unwrap();
        assert_eq!(m.prefix, "");
        assert!(p.matches("/").is_some());
    }

    #[test]
    fn invalid_templates_are_rejected() {
        assert!(matches!(
            Pattern::compile("users", MatchOptions::default()),
            Err(MuxError::Pattern { .. })
        ));
        assert!(matches!(
            Pattern::compile("/users/:", MatchOptions::default()),
            Err(MuxError::Pattern { .. })
        ));
        assert!(matches!(
            Pattern::compile("", MatchOptions::default()),
            Err(MuxError::Pattern { .. })
        ));
    }
}
