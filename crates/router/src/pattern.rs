//! Route pattern compiler.
//!
//! Compiles the routing pattern language into anchored regular expressions in
//! a single forward scan. The language understands
//!
//! * `{name}` - a named parameter matching one path segment (`[^/]+`)
//! * `{+name}` - a greedy named parameter matching across segments (`.+`)
//! * `{name:regex}` - a named parameter with a custom regex
//! * `{:regex}` / `{}` - an unnamed (non-capturing) parameter
//! * `[...]` - an optional section, not nestable
//! * `*` - a glob matching any run of characters, including `/`
//! * `\x` - the literal character `x`
//!
//! Everything else is literal text; regex metacharacters in literals are
//! escaped. Parameter captures never use the user-supplied name directly.
//! Each named parameter is assigned an opaque group name (`jp0`, `jp1`, ...)
//! and the compiled pattern keeps a table mapping user names to group names,
//! which keeps user names from colliding with regex group syntax.

use regex::{Captures, Regex};

use crate::cursor::CharCursor;
use crate::error::PatternError;
use crate::params::RouteParams;

/// Opaque capture group holding the path remainder in the prefix expression.
const REMAINDER_GROUP: &str = "jrem";

/// Lookup table of regex metacharacters that need escaping in literal text.
static METACHARS: [bool; 256] = build_metachar_table();

const fn build_metachar_table() -> [bool; 256] {
    let mut table = [false; 256];
    let meta = br"\^$.|?*+()[]{}";
    let mut i = 0;
    while i < meta.len() {
        table[meta[i] as usize] = true;
        i += 1;
    }
    table
}

fn push_literal(out: &mut String, c: char) {
    if c.is_ascii() && METACHARS[c as usize] {
        out.push('\\');
    }
    out.push(c);
}

/// A routing pattern compiled into a pair of anchored regular expressions.
///
/// `full` matches the entire path. `prefix` is the same expression followed
/// by an optional `/...` remainder capture, used to split a path into a
/// matched head and an unmatched tail for nested routing.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    full: Regex,
    prefix: Regex,
    /// User-visible parameter name paired with its opaque capture group.
    groups: Vec<(String, String)>,
}

impl CompiledPattern {
    /// Compiles `pattern`, rejecting malformed text with the byte index the
    /// scan had reached.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let mut cursor = CharCursor::new(pattern);
        let mut out = String::with_capacity(pattern.len() + 16);
        let mut groups = Vec::new();
        let mut in_optional = false;

        while let Some(c) = cursor.next() {
            match c {
                '{' => compile_parameter(pattern, &mut cursor, &mut out, &mut groups)?,
                '[' => {
                    if in_optional {
                        return Err(PatternError::nested_optional(pattern, cursor.index() - 1));
                    }
                    in_optional = true;
                    out.push_str("(?:");
                }
                ']' if in_optional => {
                    in_optional = false;
                    out.push_str(")?");
                }
                '*' => out.push_str(".*?"),
                '\\' => match cursor.next() {
                    Some(escaped) => push_literal(&mut out, escaped),
                    None => push_literal(&mut out, '\\'),
                },
                c => push_literal(&mut out, c),
            }
        }

        if in_optional {
            return Err(PatternError::unterminated_optional(pattern, cursor.index()));
        }

        let full = Regex::new(&format!("^{out}$"))
            .map_err(|e| PatternError::invalid_regex(pattern, &e))?;
        let prefix = Regex::new(&format!("^{out}(?P<{REMAINDER_GROUP}>/.*)?$"))
            .map_err(|e| PatternError::invalid_regex(pattern, &e))?;

        Ok(Self {
            pattern: pattern.to_owned(),
            full,
            prefix,
            groups,
        })
    }

    /// The original pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Names of the declared parameters, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Matches `path` in full, returning the resolved parameters.
    pub(crate) fn match_full(&self, path: &str) -> Option<RouteParams> {
        if self.groups.is_empty() {
            return self.full.is_match(path).then(RouteParams::empty);
        }
        let captures = self.full.captures(path)?;
        Some(self.extract(&captures))
    }

    /// Matches a leading portion of `path`, returning the resolved parameters
    /// and the byte offset where the unmatched remainder begins.
    ///
    /// The remainder is either empty or starts with `/`; the pattern never
    /// stops matching in the middle of a segment it could consume.
    pub(crate) fn match_prefix(&self, path: &str) -> Option<(RouteParams, usize)> {
        let captures = self.prefix.captures(path)?;
        let end = captures
            .name(REMAINDER_GROUP)
            .map_or(path.len(), |m| m.start());
        Some((self.extract(&captures), end))
    }

    fn extract(&self, captures: &Captures<'_>) -> RouteParams {
        let mut pairs = Vec::with_capacity(self.groups.len());
        for (name, group) in &self.groups {
            // a parameter inside an unmatched optional section has no capture
            if let Some(m) = captures.name(group) {
                pairs.push((name.clone(), m.as_str().to_owned()));
            }
        }
        RouteParams::resolved(pairs)
    }
}

/// Compiles one `{...}` section. The opening `{` is already consumed.
fn compile_parameter(
    pattern: &str,
    cursor: &mut CharCursor<'_>,
    out: &mut String,
    groups: &mut Vec<(String, String)>,
) -> Result<(), PatternError> {
    let start = cursor.index() - 1;
    let greedy = cursor.peek() == Some('+');
    if greedy {
        cursor.next();
    }

    let mut name = String::new();
    let mut regex = String::new();
    let mut in_regex = false;
    let mut depth = 1usize;
    let mut closed = false;

    // A custom regex may itself contain braces (e.g. quantifiers), so the
    // closing '}' is found by depth counting rather than by first match.
    for c in cursor.by_ref() {
        match c {
            '{' => {
                depth += 1;
                section(&mut name, &mut regex, in_regex).push('{');
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    closed = true;
                    break;
                }
                section(&mut name, &mut regex, in_regex).push('}');
            }
            ':' if !in_regex && depth == 1 => in_regex = true,
            c => section(&mut name, &mut regex, in_regex).push(c),
        }
    }

    if !closed {
        return Err(PatternError::unterminated_parameter(pattern, cursor.index()));
    }
    if greedy && in_regex {
        return Err(PatternError::greedy_with_regex(pattern, start));
    }

    let expr = if greedy {
        ".+"
    } else if in_regex {
        regex.as_str()
    } else {
        "[^/]+"
    };

    if name.is_empty() {
        out.push_str("(?:");
        out.push_str(expr);
        out.push(')');
    } else {
        let group = format!("jp{}", groups.len());
        out.push_str("(?P<");
        out.push_str(&group);
        out.push('>');
        out.push_str(expr);
        out.push(')');
        groups.push((name, group));
    }
    Ok(())
}

fn section<'a>(name: &'a mut String, regex: &'a mut String, in_regex: bool) -> &'a mut String {
    if in_regex { regex } else { name }
}
