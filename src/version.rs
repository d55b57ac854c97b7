#![forbid(unsafe_code)]

//! Semantic version parsing, comparison and range matching
//!
//! Three types live here:
//! - [`Version`]: a concrete `major.minor.patch[-pre]` version of a record
//!   or of the active decorator standard
//! - [`VersionReq`]: the selector written after `:v` in an invocation
//! - [`VersionRange`]: the inclusive standard-version window a record declares

use crate::error::VersionError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A semantic version
///
/// Ordering follows semver precedence: numeric components first, then a
/// release sorts above any of its pre-releases, and pre-release identifiers
/// compare numerically when both are numeric and lexically otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Parse a full `major.minor.patch[-pre]` version
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersion(input.to_string());

        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (input, None),
        };

        let mut parts = core.split('.');
        let major = parse_component(parts.next()).ok_or_else(invalid)?;
        let minor = parse_component(parts.next()).ok_or_else(invalid)?;
        let patch = parse_component(parts.next()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let pre = match pre {
            Some(pre) if is_valid_pre(pre) => Some(pre.to_string()),
            Some(_) => return Err(invalid()),
            None => None,
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

fn parse_component(part: Option<&str>) -> Option<u64> {
    let part = part?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Leading zeros are not allowed in numeric components
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

fn is_valid_pre(pre: &str) -> bool {
    !pre.is_empty()
        && pre.split('.').all(|ident| {
            !ident.is_empty() && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn compare_pre(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Exact,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Caret,
    Tilde,
}

impl Op {
    fn as_str(&self) -> &'static str {
        match self {
            Op::Exact => "",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Caret => "^",
            Op::Tilde => "~",
        }
    }
}

/// A version with possibly omitted minor/patch components
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    major: u64,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Option<String>,
}

impl Partial {
    fn parse(input: &str) -> Option<Self> {
        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (input, None),
        };
        let mut parts = core.split('.');
        let major = parse_component(parts.next())?;
        let minor = match parts.next() {
            Some(p) => Some(parse_component(Some(p))?),
            None => None,
        };
        let patch = match parts.next() {
            Some(p) => Some(parse_component(Some(p))?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        // Range bounds step a component up by one
        if [Some(major), minor, patch].into_iter().flatten().any(|c| c == u64::MAX) {
            return None;
        }
        let pre = match pre {
            // A pre-release tag only makes sense on a full version
            Some(pre) if patch.is_some() && is_valid_pre(pre) => Some(pre.to_string()),
            Some(_) => return None,
            None => None,
        };
        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    fn floor(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
        }
    }

    /// The smallest release above every version this partial covers
    fn ceiling(&self) -> Version {
        match (self.minor, self.patch) {
            (None, _) => Version::new(self.major + 1, 0, 0),
            (Some(minor), None) => Version::new(self.major, minor + 1, 0),
            (Some(minor), Some(patch)) => Version::new(self.major, minor, patch + 1),
        }
    }
}

impl fmt::Display for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Inclusive(Version),
    Exclusive(Version),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Partial,
}

impl Comparator {
    fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        let (op, rest) = [
            (">=", Op::GreaterEq),
            ("<=", Op::LessEq),
            (">", Op::Greater),
            ("<", Op::Less),
            ("=", Op::Exact),
            ("^", Op::Caret),
            ("~", Op::Tilde),
        ]
        .iter()
        .find_map(|(prefix, op)| input.strip_prefix(prefix).map(|rest| (*op, rest)))
        .unwrap_or((Op::Exact, input));

        let rest = rest.trim();
        if rest.is_empty() {
            return Err("missing version".to_string());
        }
        let version = Partial::parse(rest).ok_or_else(|| format!("'{}' is not a version", rest))?;
        Ok(Self { op, version })
    }

    fn bounds(&self) -> (Option<Bound>, Option<Bound>) {
        let v = &self.version;
        let full = v.minor.is_some() && v.patch.is_some();
        match self.op {
            Op::Exact if full => (
                Some(Bound::Inclusive(v.floor())),
                Some(Bound::Inclusive(v.floor())),
            ),
            Op::Exact => (
                Some(Bound::Inclusive(v.floor())),
                Some(Bound::Exclusive(v.ceiling())),
            ),
            Op::Greater if full => (Some(Bound::Exclusive(v.floor())), None),
            Op::Greater => (Some(Bound::Inclusive(v.ceiling())), None),
            Op::GreaterEq => (Some(Bound::Inclusive(v.floor())), None),
            Op::Less => (None, Some(Bound::Exclusive(v.floor()))),
            Op::LessEq if full => (None, Some(Bound::Inclusive(v.floor()))),
            Op::LessEq => (None, Some(Bound::Exclusive(v.ceiling()))),
            Op::Tilde => {
                let upper = match v.minor {
                    Some(minor) => Version::new(v.major, minor + 1, 0),
                    None => Version::new(v.major + 1, 0, 0),
                };
                (
                    Some(Bound::Inclusive(v.floor())),
                    Some(Bound::Exclusive(upper)),
                )
            }
            Op::Caret => {
                let minor = v.minor.unwrap_or(0);
                let patch = v.patch.unwrap_or(0);
                let upper = if v.major > 0 || v.minor.is_none() {
                    Version::new(v.major + 1, 0, 0)
                } else if minor > 0 || v.patch.is_none() {
                    Version::new(0, minor + 1, 0)
                } else {
                    Version::new(0, 0, patch + 1)
                };
                (
                    Some(Bound::Inclusive(v.floor())),
                    Some(Bound::Exclusive(upper)),
                )
            }
        }
    }

    fn matches(&self, version: &Version) -> bool {
        let (lower, upper) = self.bounds();
        let above = match lower {
            Some(Bound::Inclusive(b)) => *version >= b,
            Some(Bound::Exclusive(b)) => *version > b,
            None => true,
        };
        // An exclusive release ceiling must not admit that release's pre-releases
        let below = match upper {
            Some(Bound::Inclusive(b)) => *version <= b,
            Some(Bound::Exclusive(b)) => {
                *version < b
                    && !(version.is_prerelease()
                        && b.pre.is_none()
                        && (version.major, version.minor, version.patch)
                            == (b.major, b.minor, b.patch))
            }
            None => true,
        };
        above && below
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A version selector such as `1`, `1.2`, `2.0.0`, `>=1.0, <2` or `^1.4`
///
/// Comma-separated comparators must all match. A bare (partial) version
/// matches every version sharing the components it names. Pre-release
/// versions are only selected when a comparator names a pre-release itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    comparators: Vec<Comparator>,
}

impl VersionReq {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let fail = |reason: String| VersionError::InvalidSelector {
            input: input.to_string(),
            reason,
        };

        if input.trim().is_empty() {
            return Err(fail("empty selector".to_string()));
        }

        let comparators = input
            .split(',')
            .map(Comparator::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(fail)?;

        Ok(Self { comparators })
    }

    /// A selector matching exactly one version
    pub fn exact(version: &Version) -> Self {
        Self {
            comparators: vec![Comparator {
                op: Op::Exact,
                version: Partial {
                    major: version.major,
                    minor: Some(version.minor),
                    patch: Some(version.patch),
                    pre: version.pre.clone(),
                },
            }],
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        if version.is_prerelease() && !self.comparators.iter().any(|c| c.version.pre.is_some()) {
            return false;
        }
        self.comparators.iter().all(|c| c.matches(version))
    }

    /// Pick the highest version satisfying this selector
    pub fn best_match<'a, I>(&self, versions: I) -> Option<&'a Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        versions.into_iter().filter(|v| self.matches(v)).max()
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.comparators.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for VersionReq {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionReq::parse(s)
    }
}

/// An inclusive `[min, max]` window; either end may be open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Version>,
}

impl VersionRange {
    pub fn new(min: Option<Version>, max: Option<Version>) -> Self {
        Self { min, max }
    }

    /// An open window that contains every version
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.min.as_ref().is_none_or(|min| version >= min)
            && self.max.as_ref().is_none_or(|max| version <= max)
    }

    /// True when `min` does not exceed `max`
    pub fn is_ordered(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, "[{}, {}]", min, max),
            (Some(min), None) => write!(f, ">= {}", min),
            (None, Some(max)) => write!(f, "<= {}", max),
            (None, None) => write!(f, "any"),
        }
    }
}
