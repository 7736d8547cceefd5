//! App-version canonicalization.
//!
//! Clients send partial versions (`"2"`, `"2.1"`, `"2.1-beta"`); range
//! satisfaction needs the full three-segment form. The expansion is total and
//! idempotent: anything that is not a bare `major` or `major.minor` (with an
//! optional pre-release/build tag) passes through unchanged.

/// Canonicalize a partial app version to a full three-segment semver string.
///
/// - `"2"` becomes `"2.0.0"`
/// - `"2.1"` becomes `"2.1.0"`, `"2.1-beta"` becomes `"2.1.0-beta"`
/// - anything else (including the empty string) is returned unchanged
pub fn normalize_app_version(version: &str) -> String {
    if is_digits(version) {
        return format!("{version}.0.0");
    }

    // major.minor with an optional +build / -prerelease tag directly after.
    let (head, tag) = match version.find(['+', '-']) {
        Some(idx) => (&version[..idx], &version[idx..]),
        None => (version, ""),
    };
    if let Some((major, minor)) = head.split_once('.') {
        if is_digits(major) && is_digits(minor) {
            return format!("{head}.0{tag}");
        }
    }

    version.to_string()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
