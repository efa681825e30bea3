//! Selection rule parsing and glob matching
//!
//! A selection rule is a string of the form `["!"]<stream>[.<property>...]`.
//! The leading `!` marks an exclusion. The part before the first `.` names
//! the stream; the whole remainder (dots included) names the property, so
//! property patterns carry their stream component.

use glob::Pattern;

/// A parsed selection rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectPattern {
    /// Glob matched against stream names
    pub stream_pattern: String,
    /// Glob matched against dotted property paths (stream component included)
    pub property_pattern: String,
    /// Whether the rule excludes what it matches
    pub negated: bool,
}

impl SelectPattern {
    /// Parse one raw selection rule.
    ///
    /// Parsing never fails: any string, including the empty string,
    /// produces a pattern.
    ///
    /// ```
    /// use catwalk_core::SelectPattern;
    ///
    /// let pattern = SelectPattern::parse("!users.password");
    /// assert_eq!(pattern.stream_pattern, "users");
    /// assert_eq!(pattern.property_pattern, "users.password");
    /// assert!(pattern.negated);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let (negated, rest) = match raw.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };

        let stream = rest.split_once('.').map_or(rest, |(stream, _)| stream);

        Self {
            stream_pattern: stream.to_string(),
            property_pattern: rest.to_string(),
            negated,
        }
    }
}

/// Glob-match `value` against an include set and an exclude set.
///
/// True iff `value` matches at least one include pattern and none of the
/// exclude patterns. An empty include set never matches, regardless of
/// the excludes: there is no implicit select-everything fallback, so an
/// exclude-only rule set selects nothing.
pub fn matches_patterns<'a, I, E>(value: &str, include: I, exclude: E) -> bool
where
    I: IntoIterator<Item = &'a str>,
    E: IntoIterator<Item = &'a str>,
{
    let included = include.into_iter().any(|pattern| glob_matches(pattern, value));
    let excluded = exclude.into_iter().any(|pattern| glob_matches(pattern, value));

    included && !excluded
}

/// Match a single glob against a value. A pattern that does not compile
/// matches nothing rather than failing the caller.
fn glob_matches(pattern: &str, value: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(glob) => glob.matches(value),
        Err(err) => {
            tracing::debug!("ignoring malformed pattern '{}': {}", pattern, err);
            false
        }
    }
}
