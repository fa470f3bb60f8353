//! Version ordering over image tags
//!
//! Tags are compared as semantic versions with an optional `v` prefix.
//! Hyphenated and `+build` tags are never offered as upgrade candidates:
//! on container registries a suffix like `1.25-alpine` names a variant,
//! not a pre-release.

use std::cmp::Ordering;

use semver::Version;
use tracing::debug;

/// Parse a tag into a semver::Version, accepting an optional leading `v`.
///
/// Examples:
/// - "1.2.3" -> Version(1, 2, 3)
/// - "v1.2.3-rc.1" -> Version(1, 2, 3, pre = rc.1)
/// - "1.25" -> None (MAJOR.MINOR.PATCH is required)
pub fn parse_tag(tag: &str) -> Option<Version> {
    let stripped = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(stripped).ok()
}

/// Returns true if the tag follows the semantic versioning grammar
pub fn is_well_formed(tag: &str) -> bool {
    parse_tag(tag).is_some()
}

/// Precedence order: major, minor, patch, then pre-release. Build metadata is ignored.
fn precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Compare two tags by version precedence
///
/// Returns None if either tag is not well-formed.
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    Some(precedence(&parse_tag(a)?, &parse_tag(b)?))
}

/// Returns true if the tag may be offered as a newer version
fn is_candidate(tag: &str) -> bool {
    !tag.contains('+') && !tag.contains('-')
}

/// Select the tags eligible for "newer version" comparison, keeping listing order
pub fn filter_candidates(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter(|tag| {
            if !is_candidate(tag) {
                debug!("Ignoring variant tag {}", tag);
                return false;
            }
            is_well_formed(tag)
        })
        .cloned()
        .collect()
}

/// Find the newest candidate strictly greater than the current tag
///
/// Returns None if the current tag is not well-formed or nothing newer exists.
/// When candidates compare equal, the first one in listing order wins.
pub fn find_newest(current: &str, tags: &[String]) -> Option<String> {
    let current = parse_tag(current)?;

    filter_candidates(tags)
        .into_iter()
        .filter_map(|tag| parse_tag(&tag).map(|version| (tag, version)))
        .filter(|(_, version)| precedence(version, &current) == Ordering::Greater)
        .fold(None, |newest: Option<(String, Version)>, (tag, version)| match newest {
            Some((best_tag, best)) if precedence(&version, &best) != Ordering::Greater => {
                Some((best_tag, best))
            }
            _ => Some((tag, version)),
        })
        .map(|(tag, _)| tag)
}
