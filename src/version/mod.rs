//! Ordering of feed entries by content item version.
//!
//! Feeds publish versions in one of several syntaxes. Each version string is
//! classified once into a [`ParsedVersion`], and two entries are ordered by
//! matching on the pair of classifications:
//!
//! 1. Versioned URIs (`scheme://host/path/<module>/version/<digits>`), e.g.
//!    SNOMED CT edition version URIs. Both sides must share the module.
//! 2. Pure integers, compared numerically at any length.
//! 3. Two-component releases (`MAJOR.MINOR`), normalized to `MAJOR.MINOR.0`.
//! 4. Semantic versions, compared by semver precedence with build metadata
//!    ignored.
//!
//! Mixing syntaxes is an error, never a best-effort ordering.

use crate::error::{Error, Result, VersionError};
use crate::types::Entry;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

// The patterns are literals; a failure here is a programming error caught by the tests.
#[allow(clippy::expect_used)]
static VERSIONED_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/\s]+(?:/[^/\s]+)*/([^/\s]+)/version/([0-9]+)$")
        .expect("versioned URI pattern is valid")
});

#[allow(clippy::expect_used)]
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("integer pattern is valid"));

#[allow(clippy::expect_used)]
static TWO_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)$").expect("two-component pattern is valid"));

/// A version string classified by syntax
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedVersion {
    /// `scheme://host/path/<module>/version/<number>`
    VersionedUri {
        /// Path segment naming the module the version belongs to
        module: String,
        /// Trailing version number (digits only)
        number: String,
    },

    /// A string of digits
    Integer(String),

    /// `MAJOR.MINOR`
    TwoComponent {
        /// Major component (digits only)
        major: String,
        /// Minor component (digits only)
        minor: String,
    },

    /// `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`
    SemVer(semver::Version),

    /// None of the supported syntaxes
    Unrecognized,
}

impl ParsedVersion {
    /// Classify a version string
    pub fn parse(version: &str) -> Self {
        if let Some(caps) = VERSIONED_URI.captures(version) {
            return ParsedVersion::VersionedUri {
                module: caps[1].to_string(),
                number: caps[2].to_string(),
            };
        }

        if INTEGER.is_match(version) {
            return ParsedVersion::Integer(version.to_string());
        }

        if let Some(caps) = TWO_COMPONENT.captures(version) {
            return ParsedVersion::TwoComponent {
                major: caps[1].to_string(),
                minor: caps[2].to_string(),
            };
        }

        match semver::Version::parse(version) {
            Ok(v) => ParsedVersion::SemVer(v),
            Err(_) => ParsedVersion::Unrecognized,
        }
    }

    /// Short name of the syntax, used in error messages
    pub fn format_name(&self) -> &'static str {
        match self {
            ParsedVersion::VersionedUri { .. } => "versioned URI",
            ParsedVersion::Integer(_) => "integer",
            ParsedVersion::TwoComponent { .. } => "two-component version",
            ParsedVersion::SemVer(_) => "semantic version",
            ParsedVersion::Unrecognized => "unrecognized",
        }
    }
}

/// Order two entries by content item version
///
/// Both entries must carry the same content item identifier. Returns
/// `Ordering::Greater` when `a` is the newer version.
///
/// # Errors
///
/// - [`VersionError::MismatchingContentIdentifier`] when the identifiers differ
/// - [`VersionError::MismatchingVersionFormat`] when the two versions use
///   different syntaxes, or versioned URIs name different modules
/// - [`VersionError::UnsupportedVersionFormat`] when neither rule applies
pub fn compare_entries(a: &Entry, b: &Entry) -> Result<Ordering> {
    if std::ptr::eq(a, b) || a.same_fields(b) {
        return Ok(Ordering::Equal);
    }

    if a.content_item_identifier != b.content_item_identifier {
        return Err(VersionError::MismatchingContentIdentifier {
            left: a.content_item_identifier.clone(),
            right: b.content_item_identifier.clone(),
        }
        .into());
    }

    compare_versions(&a.content_item_version, &b.content_item_version).map_err(Error::from)
}

/// Order two version strings
///
/// This is the content of [`compare_entries`] once the content item
/// identifiers are known to match.
pub fn compare_versions(left: &str, right: &str) -> std::result::Result<Ordering, VersionError> {
    let mismatch = |reason: String| VersionError::MismatchingVersionFormat {
        left: left.to_string(),
        right: right.to_string(),
        reason,
    };
    let unsupported = || VersionError::UnsupportedVersionFormat {
        left: left.to_string(),
        right: right.to_string(),
    };

    let parsed_left = ParsedVersion::parse(left);
    let parsed_right = ParsedVersion::parse(right);

    match (&parsed_left, &parsed_right) {
        (
            ParsedVersion::VersionedUri {
                module: left_module,
                number: left_number,
            },
            ParsedVersion::VersionedUri {
                module: right_module,
                number: right_number,
            },
        ) => {
            if left_module != right_module {
                return Err(mismatch(format!(
                    "versioned URIs have mismatching modules {} and {}",
                    left_module, right_module
                )));
            }
            Ok(compare_integers(left_number, right_number))
        }

        (ParsedVersion::Integer(l), ParsedVersion::Integer(r)) => Ok(compare_integers(l, r)),

        (
            ParsedVersion::TwoComponent {
                major: left_major,
                minor: left_minor,
            },
            ParsedVersion::TwoComponent {
                major: right_major,
                minor: right_minor,
            },
        ) => {
            let l = normalize_two_component(left_major, left_minor).ok_or_else(unsupported)?;
            let r = normalize_two_component(right_major, right_minor).ok_or_else(unsupported)?;
            Ok(semver_precedence(&l, &r))
        }

        (ParsedVersion::SemVer(l), ParsedVersion::SemVer(r)) => Ok(semver_precedence(l, r)),

        // Semantic versions are the fallback syntax, so anything that failed to
        // classify on either side makes the pair unsupported.
        (
            ParsedVersion::SemVer(_) | ParsedVersion::Unrecognized,
            ParsedVersion::SemVer(_) | ParsedVersion::Unrecognized,
        ) => Err(unsupported()),

        (l, r) => Err(mismatch(format!(
            "one version is a {}, the other is a {}",
            l.format_name(),
            r.format_name()
        ))),
    }
}

/// Pick the entry with the greatest version
///
/// Returns `Ok(None)` for an empty input. Any comparison failure aborts the
/// selection. Among equal versions the entry with the smallest ID wins, so
/// the result does not depend on iteration order.
pub fn latest<'a, I>(entries: I) -> Result<Option<&'a Entry>>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut best: Option<&'a Entry> = None;
    for entry in entries {
        best = match best {
            None => Some(entry),
            Some(current) => {
                let newer = match compare_entries(entry, current)? {
                    Ordering::Greater => true,
                    Ordering::Equal => entry.id < current.id,
                    Ordering::Less => false,
                };
                Some(if newer { entry } else { current })
            }
        };
    }
    Ok(best)
}

/// Compare two digit strings numerically, without any width limit
fn compare_integers(left: &str, right: &str) -> Ordering {
    let l = left.trim_start_matches('0');
    let r = right.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}

fn normalize_two_component(major: &str, minor: &str) -> Option<semver::Version> {
    let major = major.parse::<u64>().ok()?;
    let minor = minor.parse::<u64>().ok()?;
    Some(semver::Version::new(major, minor, 0))
}

/// Semver 2.0.0 precedence: build metadata does not participate
fn semver_precedence(left: &semver::Version, right: &semver::Version) -> Ordering {
    (left.major, left.minor, left.patch)
        .cmp(&(right.major, right.minor, right.patch))
        .then_with(|| match (left.pre.is_empty(), right.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => left.pre.cmp(&right.pre),
        })
}
