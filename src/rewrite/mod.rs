//! Rewriting of ambiguous `python-` dependency names in spec files.
//!
//! Only `Requires:` and `BuildRequires:` directive lines (commented out or
//! not) are touched. Their values are split into whitespace and
//! non-whitespace runs, and each name is checked against [`RULES`] in order.
//! The first matching rule rewrites the name; everything else is copied
//! through byte for byte.

mod specfile;

pub use specfile::{SpecChange, find_spec_file, fix_spec_file};

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// The unversioned interpreter name.
const UNVERSIONED: &str = "python";

/// The name ambiguous segments are rewritten to.
const VERSIONED: &str = "python2";

static REQUIRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<head>#?\s*(?:Build)?Requires:\s+)(?P<value>.*)$").unwrap()
});

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+|\S+").unwrap());

/// Structural category a dependency name falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// A fixed name with a known replacement (`PyYAML`).
    SpecialCase,
    /// `python-foo`
    Prefix,
    /// `foo-python-bar`
    Embedded,
    /// `foo-python`
    Suffix,
    /// `python`
    Bare,
}

/// How a matching token is rewritten.
#[derive(Debug, Clone, Copy)]
enum Rewrite {
    /// Replace the token with a literal, keeping a trailing comma.
    Literal(&'static str),
    /// Version every hyphen-delimited `python` segment.
    Segments,
}

/// One entry of the rule table: a token pattern and its rewrite.
pub struct RewriteRule {
    pub kind: RuleKind,
    pattern: Regex,
    rewrite: Rewrite,
}

impl RewriteRule {
    fn new(kind: RuleKind, pattern: &str, rewrite: Rewrite) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).unwrap(),
            rewrite,
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        self.pattern.is_match(token)
    }

    pub fn apply(&self, token: &str) -> String {
        let (body, comma) = split_trailing_comma(token);
        match self.rewrite {
            Rewrite::Literal(replacement) => format!("{}{}", replacement, comma),
            Rewrite::Segments => {
                let versioned = body
                    .split('-')
                    .map(|segment| {
                        if segment == UNVERSIONED {
                            VERSIONED
                        } else {
                            segment
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("-");
                format!("{}{}", versioned, comma)
            }
        }
    }
}

/// The rule table, in evaluation order.
pub static RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| {
    vec![
        // Names that do not follow the python- convention at all.
        RewriteRule::new(
            RuleKind::SpecialCase,
            r"^PyYAML,?$",
            Rewrite::Literal("python2-pyyaml"),
        ),
        RewriteRule::new(RuleKind::Prefix, r"^python-[^/\s]*$", Rewrite::Segments),
        RewriteRule::new(
            RuleKind::Embedded,
            r"^[^/\s]+-python-[^/\s]*$",
            Rewrite::Segments,
        ),
        RewriteRule::new(RuleKind::Suffix, r"^[^/\s]+-python,?$", Rewrite::Segments),
        RewriteRule::new(RuleKind::Bare, r"^python,?$", Rewrite::Segments),
    ]
});

fn split_trailing_comma(token: &str) -> (&str, &str) {
    match token.strip_suffix(',') {
        Some(body) => (body, ","),
        None => (token, ""),
    }
}

/// Returns the first rule matching `token`, if any.
pub fn match_rule(token: &str) -> Option<&'static RewriteRule> {
    RULES.iter().find(|rule| rule.matches(token))
}

/// Rewrites a single dependency token, or returns it unchanged.
///
/// A token may list several names joined by commas; each one is matched
/// against the rule table on its own.
pub fn fix_token(token: &str) -> String {
    token
        .split(',')
        .map(|name| match match_rule(name) {
            Some(rule) => rule.apply(name),
            None => name.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Rewrites the value of a requires directive, keeping its whitespace.
pub fn fix_requires_line(requires: &str) -> String {
    TOKEN_RE
        .find_iter(requires)
        .map(|m| {
            let token = m.as_str();
            if token.chars().all(char::is_whitespace) {
                token.to_string()
            } else {
                fix_token(token)
            }
        })
        .collect()
}

/// Rewrites every requires directive in a spec file's text.
pub fn fix_spec(spec: &str) -> String {
    spec.split('\n')
        .map(|line| match REQUIRES_RE.captures(line) {
            Some(caps) => {
                let head = &caps["head"];
                let value = &caps["value"];
                format!("{}{}", head, fix_requires_line(value))
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check whether an unversioned python name is used (e.g. `python-foo`).
///
/// Paths and names with an extension never count, whatever their shape.
pub fn is_unversioned(name: &str) -> bool {
    let path = Path::new(name);
    if path.is_absolute() || path.extension().is_some() {
        return false;
    }

    name.starts_with("python-")
        || name.contains("-python-")
        || name.ends_with("-python")
        || name == UNVERSIONED
}
