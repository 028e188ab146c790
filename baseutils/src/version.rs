//! Version parsing and constraint checks.
//!
//! Versions are dot-separated numbers with an optional `v` prefix, an
//! optional prerelease (`1.2.0-beta.1`, or `1.2.0rc1`) and optional build
//! metadata (`+build.5`). Missing segments compare as zero, so `1.2` equals
//! `1.2.0`. Build metadata never affects ordering.
//!
//! ```
//! use baseutils::version::version_compare;
//!
//! assert!(version_compare("6.1.9", ">= 6.1.8"));
//! assert!(version_compare("6_1_9", "> 6.1, < 7"));
//! assert!(!version_compare("6.2.0-beta", ">= 6.1"));
//! assert!(version_compare("anything", ""));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Segment count every version is padded to for comparison.
const MIN_SEGMENTS: usize = 3;

/// Errors from parsing versions and constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The text is not a version.
    #[error("Malformed version: {0:?}")]
    InvalidVersion(String),
    /// The text is not a constraint list.
    #[error("Malformed constraint: {0:?}")]
    InvalidConstraint(String),
}

/// A parsed version.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    specified: usize,
    prerelease: String,
    metadata: String,
    original: String,
}

impl Version {
    /// Parses `text`.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersion(text.to_owned());
        let body = text.strip_prefix('v').unwrap_or(text);

        let (body, metadata) = match body.split_once('+') {
            Some((body, metadata)) if is_dotted_ident(metadata) => (body, metadata),
            Some(_) => return Err(invalid()),
            None => (body, ""),
        };

        let numeric_end = body
            .char_indices()
            .find(|(i, ch)| !(ch.is_ascii_digit() || (*ch == '.' && is_segment_dot(body, *i))))
            .map_or(body.len(), |(i, _)| i);
        let (numbers, rest) = body.split_at(numeric_end);

        let segments = numbers
            .split('.')
            .map(|segment| segment.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        let prerelease = match rest.strip_prefix('-') {
            Some(pre) if is_dotted_ident(pre) => pre,
            Some(_) => return Err(invalid()),
            None if rest.is_empty() => "",
            // `1.0rc1`: a prerelease may follow the numbers directly if it
            // starts with a letter.
            None if rest.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '~')
                && is_dotted_ident(rest) =>
            {
                rest
            }
            None => return Err(invalid()),
        };

        let specified = segments.len();
        let mut segments = segments;
        if segments.len() < MIN_SEGMENTS {
            segments.resize(MIN_SEGMENTS, 0);
        }

        Ok(Self {
            segments,
            specified,
            prerelease: prerelease.to_owned(),
            metadata: metadata.to_owned(),
            original: text.to_owned(),
        })
    }

    /// Numeric segments, padded to at least three.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Prerelease label without the leading `-`; empty if none.
    pub fn prerelease(&self) -> &str {
        &self.prerelease
    }

    /// Build metadata without the leading `+`; empty if none.
    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// Whether the version has a prerelease label.
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    fn compare_segments(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| {
                let a = self.segments.get(i).copied().unwrap_or(0);
                let b = other.segments.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    fn same_segments(&self, other: &Self) -> bool {
        self.compare_segments(other).is_eq()
    }
}

fn is_segment_dot(body: &str, dot: usize) -> bool {
    body[dot + 1..].starts_with(|ch: char| ch.is_ascii_digit())
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '~'
}

fn is_dotted_ident(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(is_ident_char))
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let a: Vec<&str> = a.split('.').collect();
    let b: Vec<&str> = b.split('.').collect();
    (0..a.len().max(b.len()))
        .map(|i| {
            compare_prerelease_part(
                a.get(i).copied().unwrap_or(""),
                b.get(i).copied().unwrap_or(""),
            )
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Numeric parts sort before alphanumeric ones; a missing part sorts before
/// a numeric one and after an alphanumeric one.
fn compare_prerelease_part(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let a_num = a.parse::<u64>().ok();
    let b_num = b.parse::<u64>().ok();
    if a.is_empty() {
        return if b_num.is_some() {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    if b.is_empty() {
        return if a_num.is_some() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    match (a_num, b_num) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_segments(other).then_with(|| {
            match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => compare_prerelease(&self.prerelease, &other.prerelease),
            }
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Comparison operator of a [`Constraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=` or no operator.
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `~>`: at least the version, with all but the last given segment
    /// fixed. `~> 1.2` allows `1.x` from `1.2`; `~> 1.2.3` allows `1.2.x`
    /// from `1.2.3`.
    Pessimistic,
}

impl Operator {
    // Longest operators first so `>=` is not read as `>`.
    const TOKENS: [(&'static str, Operator); 7] = [
        (">=", Operator::GreaterOrEqual),
        ("<=", Operator::LessOrEqual),
        ("!=", Operator::NotEqual),
        ("~>", Operator::Pessimistic),
        (">", Operator::Greater),
        ("<", Operator::Less),
        ("=", Operator::Equal),
    ];

    fn split(text: &str) -> (Self, &str) {
        Self::TOKENS
            .iter()
            .find_map(|(token, op)| text.strip_prefix(token).map(|rest| (*op, rest)))
            .unwrap_or((Operator::Equal, text))
    }
}

/// One `operator version` requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    operator: Operator,
    version: Version,
}

impl Constraint {
    /// Parses `>= 1.2.3`-style text.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let (operator, rest) = Operator::split(text.trim());
        let version = Version::parse(rest.trim())
            .map_err(|_| VersionError::InvalidConstraint(text.to_owned()))?;
        Ok(Self { operator, version })
    }

    /// The operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version compared against.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `version` satisfies this constraint.
    pub fn check(&self, version: &Version) -> bool {
        let c = &self.version;
        match self.operator {
            Operator::Equal => version == c,
            Operator::NotEqual => version != c,
            Operator::Greater => prerelease_allowed(version, c) && version > c,
            Operator::Less => prerelease_allowed(version, c) && version < c,
            Operator::GreaterOrEqual => prerelease_allowed(version, c) && version >= c,
            Operator::LessOrEqual => prerelease_allowed(version, c) && version <= c,
            Operator::Pessimistic => pessimistic(version, c),
        }
    }
}

/// A prerelease version only satisfies range constraints on a prerelease
/// with the same segments.
fn prerelease_allowed(version: &Version, constraint: &Version) -> bool {
    match (version.is_prerelease(), constraint.is_prerelease()) {
        (true, true) => version.same_segments(constraint),
        (true, false) => false,
        (false, _) => true,
    }
}

fn pessimistic(version: &Version, constraint: &Version) -> bool {
    if !prerelease_allowed(version, constraint)
        || (constraint.is_prerelease() && !version.is_prerelease())
        || version < constraint
    {
        return false;
    }
    let fixed = constraint.specified.saturating_sub(1);
    match (version.segments.get(..fixed), constraint.segments.get(..fixed)) {
        (Some(ours), Some(theirs)) => ours == theirs,
        _ => false,
    }
}

/// A comma-separated list of [`Constraint`]s, all of which must hold.
///
/// ```
/// use baseutils::version::{Constraints, Version};
///
/// let range: Constraints = ">= 1.0, < 1.4, != 1.2.5".parse().unwrap();
/// assert!(range.check(&"1.3.9".parse::<Version>().unwrap()));
/// assert!(!range.check(&"1.2.5".parse::<Version>().unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    /// Parses a comma-separated constraint list.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        text.split(',')
            .map(Constraint::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Whether `version` satisfies every constraint.
    pub fn check(&self, version: &Version) -> bool {
        self.0.iter().all(|constraint| constraint.check(version))
    }

    /// The individual constraints.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.0.iter()
    }
}

impl FromStr for Constraints {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `app_version` satisfies the constraint list `check`.
///
/// An empty `check` always passes. Underscores in `app_version` are read as
/// dots (`6_1_9` is `6.1.9`). Unparsable input fails the check.
pub fn version_compare(app_version: &str, check: &str) -> bool {
    if check.is_empty() {
        return true;
    }
    let Ok(constraints) = Constraints::parse(check) else {
        return false;
    };
    match Version::parse(&app_version.replace('_', ".")) {
        Ok(version) => constraints.check(&version),
        Err(_) => false,
    }
}
