//! NuGet version parsing, comparison, and range matching.
//!
//! NuGet versions extend semver with a fourth numeric part:
//! - Up to four dot-separated numeric parts (`1.2.3.4`); absent parts are zero
//! - An optional dash-separated prerelease suffix (`1.0.0-beta.2`)
//! - Optional `+` build metadata, ignored for ordering
//! - A prerelease sorts before its release; prerelease labels compare
//!   dot-wise, numeric identifiers before alphanumeric ones
//!
//! Ranges use interval notation (`[1.0,2.0)`, `(,2.0]`, `[1.0]`), a bare
//! version meaning "at least", or a floating pattern (`1.0.*`).

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// A parsed NuGet version with comparable parts.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    pub original: String,
    parts: [u64; 4],
    release: Vec<ReleaseLabel>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum ReleaseLabel {
    Numeric(u64),
    Alphanumeric(String),
}

impl NuGetVersion {
    /// Parse a version string. Returns `None` when the string is not a
    /// version (callers treat unparseable candidates as absent).
    pub fn parse(version: &str) -> Option<Self> {
        let s = version.trim();
        if s.is_empty() {
            return None;
        }

        // Build metadata does not participate in ordering.
        let s = s.split('+').next().unwrap_or(s);

        let (numeric, release) = match s.split_once('-') {
            Some((n, r)) => (n, Some(r)),
            None => (s, None),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for piece in numeric.split('.') {
            if count >= 4 {
                return None;
            }
            parts[count] = piece.parse().ok()?;
            count += 1;
        }
        if count == 0 {
            return None;
        }

        let release = match release {
            Some(r) if !r.is_empty() => r.split('.').map(classify_label).collect(),
            _ => Vec::new(),
        };

        Some(Self {
            original: version.trim().to_string(),
            parts,
            release,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.release.is_empty()
    }

    /// Canonical `major.minor.patch[.revision][-release]` form, the way the
    /// graph reports versions regardless of how they were written.
    pub fn normalized(&self) -> String {
        let mut s = format!("{}.{}.{}", self.parts[0], self.parts[1], self.parts[2]);
        if self.parts[3] > 0 {
            s.push_str(&format!(".{}", self.parts[3]));
        }
        if !self.release.is_empty() {
            s.push('-');
            let labels: Vec<String> = self
                .release
                .iter()
                .map(|l| match l {
                    ReleaseLabel::Numeric(n) => n.to_string(),
                    ReleaseLabel::Alphanumeric(a) => a.clone(),
                })
                .collect();
            s.push_str(&labels.join("."));
        }
        s
    }
}

fn classify_label(token: &str) -> ReleaseLabel {
    match token.parse::<u64>() {
        Ok(n) => ReleaseLabel::Numeric(n),
        Err(_) => ReleaseLabel::Alphanumeric(token.to_string()),
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.parts.cmp(&other.parts);
        if ord != Ordering::Equal {
            return ord;
        }
        compare_release(&self.release, &other.release)
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_release(a: &[ReleaseLabel], b: &[ReleaseLabel]) -> Ordering {
    // No labels at all means a release, which outranks any prerelease.
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let max_len = a.len().max(b.len());
    for i in 0..max_len {
        match (a.get(i), b.get(i)) {
            (None, None) => return Ordering::Equal,
            // A longer label list outranks its prefix (`beta.2` > `beta`).
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare_labels(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
    Ordering::Equal
}

fn compare_labels(a: &ReleaseLabel, b: &ReleaseLabel) -> Ordering {
    match (a, b) {
        (ReleaseLabel::Numeric(x), ReleaseLabel::Numeric(y)) => x.cmp(y),
        (ReleaseLabel::Numeric(_), ReleaseLabel::Alphanumeric(_)) => Ordering::Less,
        (ReleaseLabel::Alphanumeric(_), ReleaseLabel::Numeric(_)) => Ordering::Greater,
        (ReleaseLabel::Alphanumeric(x), ReleaseLabel::Alphanumeric(y)) => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
    }
}

/// Error from parsing a version range expression.
#[derive(Debug, Error)]
#[error("invalid version range '{spec}': {reason}")]
pub struct RangeParseError {
    pub spec: String,
    pub reason: String,
}

/// A NuGet version range expression.
///
/// Supports `[1.0,2.0)`, `(,2.0]`, `[1.0,]`, `[1.0]` (exact pin), a bare
/// version (`1.0` means at least 1.0), and floating patterns (`1.0.*`).
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub min: Option<NuGetVersion>,
    pub min_inclusive: bool,
    pub max: Option<NuGetVersion>,
    pub max_inclusive: bool,
    /// Present for floating ranges: the normalized prefix before the `*`.
    pub float_prefix: Option<String>,
    original: String,
}

impl VersionRange {
    /// The unbounded range, satisfied by every version.
    pub fn any() -> Self {
        Self {
            min: None,
            min_inclusive: true,
            max: None,
            max_inclusive: true,
            float_prefix: None,
            original: "(,)".to_string(),
        }
    }

    /// An exact pin `[v,v]`.
    pub fn exact(version: NuGetVersion) -> Self {
        let original = format!("[{}]", version.normalized());
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            float_prefix: None,
            original,
        }
    }

    /// Parse a range expression string.
    pub fn parse(spec: &str) -> Result<Self, RangeParseError> {
        let s = spec.trim();
        if s.is_empty() {
            return Err(RangeParseError {
                spec: spec.to_string(),
                reason: "empty range".to_string(),
            });
        }

        if s.starts_with('[') || s.starts_with('(') {
            return Self::parse_interval(s);
        }

        if s.contains('*') {
            return Self::parse_floating(s);
        }

        // Bare version: NuGet treats it as a minimum-inclusive bound.
        let v = NuGetVersion::parse(s).ok_or_else(|| RangeParseError {
            spec: spec.to_string(),
            reason: "not a version".to_string(),
        })?;
        Ok(Self {
            min: Some(v),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float_prefix: None,
            original: s.to_string(),
        })
    }

    fn parse_interval(s: &str) -> Result<Self, RangeParseError> {
        let min_inclusive = s.starts_with('[');
        let max_inclusive = s.ends_with(']');
        if !s.ends_with(']') && !s.ends_with(')') {
            return Err(RangeParseError {
                spec: s.to_string(),
                reason: "unterminated interval".to_string(),
            });
        }
        let inner = &s[1..s.len() - 1];

        let parse_bound = |bound: &str| -> Result<Option<NuGetVersion>, RangeParseError> {
            let bound = bound.trim();
            if bound.is_empty() {
                return Ok(None);
            }
            NuGetVersion::parse(bound)
                .map(Some)
                .ok_or_else(|| RangeParseError {
                    spec: s.to_string(),
                    reason: format!("bad bound '{bound}'"),
                })
        };

        if let Some((lower, upper)) = inner.split_once(',') {
            Ok(Self {
                min: parse_bound(lower)?,
                min_inclusive,
                max: parse_bound(upper)?,
                max_inclusive,
                float_prefix: None,
                original: s.to_string(),
            })
        } else {
            // Exact pin: [1.5] means exactly 1.5.
            if !min_inclusive || !max_inclusive {
                return Err(RangeParseError {
                    spec: s.to_string(),
                    reason: "exact pin requires inclusive brackets".to_string(),
                });
            }
            let v = parse_bound(inner)?.ok_or_else(|| RangeParseError {
                spec: s.to_string(),
                reason: "empty exact pin".to_string(),
            })?;
            Ok(Self {
                min: Some(v.clone()),
                min_inclusive: true,
                max: Some(v),
                max_inclusive: true,
                float_prefix: None,
                original: s.to_string(),
            })
        }
    }

    fn parse_floating(s: &str) -> Result<Self, RangeParseError> {
        let star = s.find('*').unwrap();
        if star != s.len() - 1 {
            return Err(RangeParseError {
                spec: s.to_string(),
                reason: "'*' must terminate a floating range".to_string(),
            });
        }
        let prefix = &s[..star];
        if prefix.is_empty() {
            // `*` floats over everything.
            let mut range = Self::any();
            range.float_prefix = Some(String::new());
            range.original = s.to_string();
            return Ok(range);
        }

        let bad = |reason: &str| RangeParseError {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some(base) = prefix.strip_suffix('-') {
            // Prerelease float: `1.0.0-*` matches prereleases of 1.0.0 and
            // the release itself. `-0` is the lowest possible label.
            let min = NuGetVersion::parse(&format!("{base}-0")).ok_or_else(|| bad("bad floating prefix"))?;
            let max = NuGetVersion::parse(base).ok_or_else(|| bad("bad floating prefix"))?;
            return Ok(Self {
                min: Some(min),
                min_inclusive: true,
                max: Some(max),
                max_inclusive: true,
                float_prefix: Some(prefix.to_string()),
                original: s.to_string(),
            });
        }

        // `1.0.*` floats over [1.0.0, 1.1.0); the bound above the float is
        // the prefix with its last segment bumped.
        let trimmed = prefix.strip_suffix('.').unwrap_or(prefix);
        let mut segments: Vec<u64> = Vec::new();
        for piece in trimmed.split('.') {
            segments.push(piece.parse().map_err(|_| bad("bad floating prefix"))?);
        }
        if segments.is_empty() || segments.len() > 3 {
            return Err(bad("bad floating prefix"));
        }
        let min = NuGetVersion::parse(&format!("{trimmed}.0")).ok_or_else(|| bad("bad floating prefix"))?;
        *segments.last_mut().unwrap() += 1;
        let ceiling: Vec<String> = segments.iter().map(u64::to_string).collect();
        let max = NuGetVersion::parse(&ceiling.join(".")).ok_or_else(|| bad("bad floating prefix"))?;
        Ok(Self {
            min: Some(min),
            min_inclusive: true,
            max: Some(max),
            max_inclusive: false,
            float_prefix: Some(prefix.to_string()),
            original: s.to_string(),
        })
    }

    pub fn is_floating(&self) -> bool {
        self.float_prefix.is_some()
    }

    /// Check whether a version satisfies this range.
    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        if let Some(ref min) = self.min {
            let cmp = version.cmp(min);
            if self.min_inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref max) = self.max {
            let cmp = version.cmp(max);
            if self.max_inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }

    /// Intersect a set of ranges, taking the tighter of each bound.
    ///
    /// Purely narrowing: the result may be unsatisfiable, which surfaces as
    /// `find_best_match` returning `None`. Floating members contribute only
    /// their concrete bounds.
    pub fn common_subset(ranges: &[VersionRange]) -> VersionRange {
        let mut result = VersionRange::any();
        for range in ranges {
            if let Some(ref min) = range.min {
                let tighter = match result.min {
                    None => true,
                    Some(ref cur) => match min.cmp(cur) {
                        Ordering::Greater => true,
                        Ordering::Equal => !range.min_inclusive && result.min_inclusive,
                        Ordering::Less => false,
                    },
                };
                if tighter {
                    result.min = Some(min.clone());
                    result.min_inclusive = range.min_inclusive;
                }
            }
            if let Some(ref max) = range.max {
                let tighter = match result.max {
                    None => true,
                    Some(ref cur) => match max.cmp(cur) {
                        Ordering::Less => true,
                        Ordering::Equal => !range.max_inclusive && result.max_inclusive,
                        Ordering::Greater => false,
                    },
                };
                if tighter {
                    result.max = Some(max.clone());
                    result.max_inclusive = range.max_inclusive;
                }
            }
        }
        result.original = result.render();
        result
    }

    /// Select the highest candidate satisfying this range, or `None`.
    ///
    /// A stable version beats any satisfying prerelease; prereleases are
    /// chosen only when nothing stable qualifies. Floating ranges select
    /// the highest candidate inside the float's bounds.
    pub fn find_best_match<'a, I>(&self, candidates: I) -> Option<&'a NuGetVersion>
    where
        I: IntoIterator<Item = &'a NuGetVersion>,
    {
        let satisfying: Vec<&'a NuGetVersion> = candidates
            .into_iter()
            .filter(|&v| self.satisfies(v))
            .collect();
        let stable = satisfying
            .iter()
            .copied()
            .filter(|v| !v.is_prerelease())
            .max();
        stable.or_else(|| satisfying.into_iter().max())
    }

    /// Refresh the displayed form after direct bound manipulation.
    pub(crate) fn sync_original(&mut self) {
        self.original = self.render();
    }

    fn render(&self) -> String {
        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        let lower = self.min.as_ref().map(|v| v.normalized()).unwrap_or_default();
        let upper = self.max.as_ref().map(|v| v.normalized()).unwrap_or_default();
        format!("{open}{lower},{upper}{close}")
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
