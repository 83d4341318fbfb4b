//! Target framework monikers and dependency-group compatibility.
//!
//! A published package version declares its dependencies in groups, one per
//! supported runtime profile. Resolution for a requested framework keeps
//! the groups whose declared framework is compatible; the matching rules
//! are deliberately strict (exact major and minor) with a fail-open escape
//! hatch for malformed metadata.

use std::fmt;

use tracing::warn;

/// A concrete runtime/API profile: identifier plus major.minor version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFramework {
    pub identifier: String,
    pub major: u32,
    pub minor: u32,
}

impl TargetFramework {
    pub fn new(identifier: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            identifier: identifier.into(),
            major,
            minor,
        }
    }

    /// Parse a framework moniker in either short (`net45`, `netstandard2.0`,
    /// `netcoreapp3.1`, `net6.0`) or long (`.NETFramework,Version=v4.5`)
    /// form. Returns `None` for strings that are not concrete frameworks.
    pub fn parse(moniker: &str) -> Option<Self> {
        let s = moniker.trim();
        if s.is_empty() {
            return None;
        }

        // Long form: ".NETFramework,Version=v4.5"
        if let Some((identifier, version)) = s.split_once(",Version=v") {
            let (major, minor) = parse_version_pair(version)?;
            return Some(Self::new(identifier, major, minor));
        }

        let lower = s.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("netstandard") {
            let (major, minor) = parse_version_pair(rest)?;
            return Some(Self::new(".NETStandard", major, minor));
        }
        if let Some(rest) = lower.strip_prefix("netcoreapp") {
            let (major, minor) = parse_version_pair(rest)?;
            return Some(Self::new(".NETCoreApp", major, minor));
        }
        if let Some(rest) = lower.strip_prefix("net") {
            if rest.contains('.') {
                // net5.0 and later are .NETCoreApp profiles.
                let (major, minor) = parse_version_pair(rest)?;
                return Some(Self::new(".NETCoreApp", major, minor));
            }
            if rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty() {
                let (major, minor) = parse_version_pair(rest)?;
                return Some(Self::new(".NETFramework", major, minor));
            }
        }

        // ".NETStandard2.0" style: identifier directly followed by a version.
        if let Some(split) = s.find(|c: char| c.is_ascii_digit()) {
            if split > 0 {
                let (identifier, version) = s.split_at(split);
                let (major, minor) = parse_version_pair(version)?;
                return Some(Self::new(identifier, major, minor));
            }
        }

        None
    }
}

/// `"4.5"` -> (4, 5); digit runs without a dot split digit-wise: `"45"` -> (4, 5).
fn parse_version_pair(version: &str) -> Option<(u32, u32)> {
    let v = version.trim();
    if v.is_empty() {
        return None;
    }
    if v.contains('.') {
        let mut pieces = v.split('.');
        let major = pieces.next()?.parse().ok()?;
        let minor = match pieces.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        return Some((major, minor));
    }
    if !v.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut digits = v.chars();
    let major = digits.next()?.to_digit(10)?;
    let minor = match digits.next() {
        Some(c) => c.to_digit(10)?,
        None => 0,
    };
    Some((major, minor))
}

impl fmt::Display for TargetFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}.{}", self.identifier, self.major, self.minor)
    }
}

/// The framework slot of a declared dependency group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkSpec {
    /// Applies to every framework.
    Any,
    /// No runtime-specific API surface.
    Agnostic,
    /// Scoped to one concrete profile.
    Specific(TargetFramework),
    /// Explicitly incompatible with everything.
    Unsupported,
    /// Metadata we could not interpret; kept verbatim for diagnostics.
    Unknown(String),
}

impl FrameworkSpec {
    /// Interpret a declared group's framework string.
    pub fn parse(moniker: &str) -> Self {
        let s = moniker.trim();
        match s.to_ascii_lowercase().as_str() {
            "" | "any" => return FrameworkSpec::Any,
            "agnostic" => return FrameworkSpec::Agnostic,
            "unsupported" => return FrameworkSpec::Unsupported,
            _ => {}
        }
        match TargetFramework::parse(s) {
            Some(tf) => FrameworkSpec::Specific(tf),
            None => FrameworkSpec::Unknown(s.to_string()),
        }
    }
}

impl fmt::Display for FrameworkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameworkSpec::Any => f.write_str("any"),
            FrameworkSpec::Agnostic => f.write_str("agnostic"),
            FrameworkSpec::Specific(tf) => tf.fmt(f),
            FrameworkSpec::Unsupported => f.write_str("unsupported"),
            FrameworkSpec::Unknown(s) => f.write_str(s),
        }
    }
}

/// Decide whether a dependency group declared for `declared` applies when
/// resolving for `requested`.
///
/// Specific groups require the exact major and minor version, no
/// forward or backward tolerance. Unrecognized metadata is treated as
/// compatible so malformed profiles do not drop real dependencies.
pub fn is_compatible(requested: &TargetFramework, declared: &FrameworkSpec) -> bool {
    match declared {
        FrameworkSpec::Any => true,
        FrameworkSpec::Agnostic => true,
        FrameworkSpec::Specific(tf) => {
            tf.major == requested.major && tf.minor == requested.minor
        }
        FrameworkSpec::Unsupported => false,
        FrameworkSpec::Unknown(raw) => {
            warn!("unrecognized framework metadata '{raw}', treating as compatible");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_short_monikers() {
        let tf = TargetFramework::parse("net45").unwrap();
        assert_eq!(tf.identifier, ".NETFramework");
        assert_eq!((tf.major, tf.minor), (4, 5));

        let tf = TargetFramework::parse("net472").unwrap();
        assert_eq!((tf.major, tf.minor), (4, 7));

        let tf = TargetFramework::parse("netstandard2.0").unwrap();
        assert_eq!(tf.identifier, ".NETStandard");
        assert_eq!((tf.major, tf.minor), (2, 0));

        let tf = TargetFramework::parse("netcoreapp3.1").unwrap();
        assert_eq!(tf.identifier, ".NETCoreApp");
        assert_eq!((tf.major, tf.minor), (3, 1));

        let tf = TargetFramework::parse("net6.0").unwrap();
        assert_eq!(tf.identifier, ".NETCoreApp");
        assert_eq!((tf.major, tf.minor), (6, 0));
    }

    #[test]
    fn parse_long_form() {
        let tf = TargetFramework::parse(".NETFramework,Version=v4.5").unwrap();
        assert_eq!(tf.identifier, ".NETFramework");
        assert_eq!((tf.major, tf.minor), (4, 5));
    }

    #[test]
    fn parse_identifier_version_form() {
        let tf = TargetFramework::parse(".NETStandard2.0").unwrap();
        assert_eq!(tf.identifier, ".NETStandard");
        assert_eq!((tf.major, tf.minor), (2, 0));
    }

    #[test]
    fn parse_rejects_noise() {
        assert!(TargetFramework::parse("").is_none());
        assert!(TargetFramework::parse("portable-net45+win8").is_none());
    }

    #[test]
    fn spec_special_monikers() {
        assert_eq!(FrameworkSpec::parse("any"), FrameworkSpec::Any);
        assert_eq!(FrameworkSpec::parse(""), FrameworkSpec::Any);
        assert_eq!(FrameworkSpec::parse("agnostic"), FrameworkSpec::Agnostic);
        assert_eq!(FrameworkSpec::parse("unsupported"), FrameworkSpec::Unsupported);
        assert!(matches!(
            FrameworkSpec::parse("???"),
            FrameworkSpec::Unknown(_)
        ));
    }

    #[test]
    fn compatibility_precedence() {
        let requested = TargetFramework::new(".NETFramework", 4, 5);

        assert!(is_compatible(&requested, &FrameworkSpec::Any));
        assert!(is_compatible(&requested, &FrameworkSpec::Agnostic));
        assert!(!is_compatible(&requested, &FrameworkSpec::Unsupported));

        let same = FrameworkSpec::Specific(TargetFramework::new(".NETFramework", 4, 5));
        assert!(is_compatible(&requested, &same));

        let older_minor = FrameworkSpec::Specific(TargetFramework::new(".NETFramework", 4, 0));
        assert!(!is_compatible(&requested, &older_minor));

        let newer_major = FrameworkSpec::Specific(TargetFramework::new(".NETFramework", 5, 5));
        assert!(!is_compatible(&requested, &newer_major));
    }

    #[test]
    fn malformed_metadata_fails_open() {
        let requested = TargetFramework::new(".NETStandard", 2, 0);
        assert!(is_compatible(
            &requested,
            &FrameworkSpec::Unknown("garbage".to_string())
        ));
    }
}
