//! The update-selection engine.
//!
//! Given a deployment's release list (oldest first) and a parsed request, the
//! engine walks the history newest-first and produces either a no-update
//! answer or a single update descriptor, honoring rollout cohorts, mandatory
//! forwarding over skipped releases, and (at finalization) binary-diff
//! substitution.

use crate::release::{AcquisitionRequest, DiffPackageMap, Release, UpdateInfo};
use crate::rollout::{effective_rollout, is_selected_for_rollout, is_unfinished_rollout};
use semver::{Version, VersionReq};

/// Outcome of the newest-first walk.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// The client is up to date (or nothing applies to its binary).
    NoUpdate,
    /// A release was chosen. `force_mandatory` carries the mandatory flag of
    /// the chosen release plus any mandatory escalation from skipped newer
    /// releases or rollout-ineligible mandatory releases.
    Update {
        release: Release,
        force_mandatory: bool,
    },
}

/// Walk the release history (oldest first, as stored) from newest to oldest
/// and pick the update to offer, if any.
///
/// `now_ms` anchors time-ramped rollout percentages.
pub fn select_update(
    releases: &[Release],
    request: &AcquisitionRequest,
    now_ms: i64,
) -> Selection {
    let mut selected: Option<(&Release, bool)> = None;
    // Latched when a mandatory release is skipped only because this client is
    // outside its rollout cohort; the next release actually selected must
    // still be mandatory for this client.
    let mut pending_mandatory = false;

    for release in releases.iter().rev() {
        let is_current = match (&request.label, &request.package_hash) {
            (Some(label), _) => release.label == *label,
            (None, Some(hash)) => release.package_hash == *hash,
            (None, None) => false,
        };

        if is_current {
            // A disabled current release is as if the client were on an
            // unknown version: keep walking.
            if release.is_disabled {
                continue;
            }
            // The walk reached what the client already runs.
            return match selected {
                Some((chosen, force_mandatory)) => Selection::Update {
                    release: chosen.clone(),
                    force_mandatory,
                },
                None => Selection::NoUpdate,
            };
        }

        if release.is_disabled {
            continue;
        }

        let applies = request.is_companion
            || (!request.normalized_app_version.is_empty()
                && satisfies(&request.normalized_app_version, &release.app_version));
        if !applies {
            continue;
        }

        if let Some((_, force_mandatory)) = &mut selected {
            // Older-and-applicable than the chosen release: only its
            // mandatory flag matters.
            if release.is_mandatory {
                *force_mandatory = true;
            }
            continue;
        }

        let eligible = if !is_unfinished_rollout(release.rollout) {
            true
        } else {
            let client_id = request.client_unique_id.as_deref().unwrap_or_default();
            request.beta
                || is_selected_for_rollout(
                    client_id,
                    effective_rollout(&release.rollout_ramp(), now_ms),
                    &release.label,
                )
        };

        if eligible {
            selected = Some((release, pending_mandatory || release.is_mandatory));
        } else if release.is_mandatory {
            pending_mandatory = true;
        }
    }

    match selected {
        Some((chosen, force_mandatory)) => Selection::Update {
            release: chosen.clone(),
            force_mandatory,
        },
        None => Selection::NoUpdate,
    }
}

/// Turn a selection into the update descriptor returned to the client,
/// substituting a diff archive for the full bundle when `diff_map` holds an
/// entry for the client's current package hash.
pub fn finalize(
    selection: &Selection,
    request: &AcquisitionRequest,
    diff_map: Option<&DiffPackageMap>,
) -> UpdateInfo {
    let (release, force_mandatory) = match selection {
        Selection::NoUpdate => return no_update(request),
        Selection::Update {
            release,
            force_mandatory,
        } => (release, *force_mandatory),
    };

    let mut info = UpdateInfo {
        is_available: true,
        is_mandatory: force_mandatory || release.is_mandatory,
        app_version: request.response_app_version().to_string(),
        target_binary_range: release.app_version.clone(),
        package_hash: Some(release.package_hash.clone()),
        label: Some(release.label.clone()),
        description: release.description.clone(),
        download_url: Some(release.blob_url.clone()),
        package_size: Some(release.size),
        update_app_version: false,
    };

    if let Some(request_hash) = &request.package_hash {
        if let Some(diff) = diff_map.and_then(|m| m.get(request_hash)) {
            info.download_url = Some(diff.url.clone());
            info.package_size = Some(diff.size);
        }
    }

    info
}

/// The answer for a client that is already up to date.
fn no_update(request: &AcquisitionRequest) -> UpdateInfo {
    let app_version = request.response_app_version().to_string();
    UpdateInfo {
        is_available: false,
        is_mandatory: false,
        target_binary_range: app_version.clone(),
        app_version,
        update_app_version: false,
        ..Default::default()
    }
}

/// A parsed binary-compatibility range.
enum RangeMatcher {
    /// `*` or empty: every version.
    Any,
    /// A bare version: matches only that exact version.
    Exact(Version),
    /// A comparator set (comma- or space-separated).
    Req(VersionReq),
}

fn parse_range(range: &str) -> Option<RangeMatcher> {
    let range = range.trim();
    if range.is_empty() || range == "*" {
        return Some(RangeMatcher::Any);
    }
    if let Ok(exact) = Version::parse(range) {
        return Some(RangeMatcher::Exact(exact));
    }
    let normalized;
    let range = if range.contains(' ') && !range.contains(',') {
        normalized = range.split_whitespace().collect::<Vec<_>>().join(", ");
        normalized.as_str()
    } else {
        range
    };
    VersionReq::parse(range).ok().map(RangeMatcher::Req)
}

/// Whether `version` (a full three-segment version) satisfies `range`.
///
/// A range that parses as a bare version matches only that exact version; `*`
/// and the empty range match everything. Unparseable ranges match nothing.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Ok(version) = Version::parse(version) else {
        return false;
    };
    match parse_range(range) {
        Some(RangeMatcher::Any) => true,
        Some(RangeMatcher::Exact(exact)) => version == exact,
        Some(RangeMatcher::Req(req)) => req.matches(&version),
        None => false,
    }
}

/// Whether `range` could match any version at all. Releases with malformed
/// ranges can never be served and are dropped when building cacheable
/// responses.
pub fn is_satisfiable_range(range: &str) -> bool {
    parse_range(range).is_some()
}
