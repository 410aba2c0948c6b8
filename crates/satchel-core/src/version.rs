//! Version and constraint handling on top of the semver crate.
//!
//! Constraints follow cargo conventions: a bare `1.2.3` behaves as `^1.2.3`,
//! exact pins use `=1.2.3`, and ranges use `^`, `~`, `>=`, `<` and friends.
//! The sentinel constraint `latest` (or an empty string) matches anything.

use semver::{Version, VersionReq};

/// Sentinel constraint meaning "any version, prefer the highest".
pub const LATEST: &str = "latest";

/// Parse a version string, tolerating a leading `v`.
pub fn parse(version: &str) -> Result<Version, semver::Error> {
    Version::parse(version.trim().trim_start_matches('v'))
}

/// Parse a constraint string into a [`VersionReq`].
///
/// `latest` and the empty string parse to the match-anything requirement.
pub fn parse_constraint(constraint: &str) -> Result<VersionReq, semver::Error> {
    let trimmed = constraint.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(LATEST) {
        return Ok(VersionReq::STAR);
    }
    VersionReq::parse(trimmed)
}

/// Whether `version` satisfies `constraint`.
///
/// Returns `false` if either side fails to parse.
pub fn matches(constraint: &str, version: &str) -> bool {
    match (parse_constraint(constraint), parse(version)) {
        (Ok(req), Ok(v)) => req.matches(&v),
        _ => false,
    }
}

/// The highest version in `versions` satisfying `constraint`.
///
/// Entries that fail to parse are ignored. Returns the original string form
/// of the winner.
pub fn best_match<'a, I>(constraint: &str, versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let req = parse_constraint(constraint).ok()?;
    versions
        .into_iter()
        .filter_map(|raw| parse(raw).ok().map(|v| (v, raw)))
        .filter(|(v, _)| req.matches(v))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw)
}
