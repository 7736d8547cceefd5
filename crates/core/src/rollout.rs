//! Rollout cohort selection and time-ramped rollout percentages.
//!
//! Cohort membership is decided by a 32-bit signed string-hash recurrence
//! over `"{clientId}-{releaseTag}"`. The arithmetic must stay fixed-width:
//! widening it to 64 bits would re-shuffle every in-progress rollout.

/// Rollout-ramp parameters carried by a release.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RolloutRamp {
    /// Percentage in `[0, 100]`; absent or 100 means fully rolled out.
    pub rollout: Option<f64>,
    pub hold_duration_minutes: Option<i64>,
    pub ramp_duration_minutes: Option<i64>,
    /// Epoch milliseconds of the release upload.
    pub upload_time: Option<i64>,
}

/// Hash a client/release identifier with the recurrence
/// `h <- (h << 5) - h + codepoint`, in wrapping 32-bit two's complement.
/// The empty string hashes to 0.
pub fn hash_identifier(input: &str) -> i32 {
    let mut hash: i32 = 0;
    for ch in input.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(ch as i32);
    }
    hash
}

/// Whether `client_id` falls inside the rollout cohort of size `rollout`
/// (a percentage) for the release identified by `tag`.
pub fn is_selected_for_rollout(client_id: &str, rollout: f64, tag: &str) -> bool {
    let identifier = format!("{client_id}-{tag}");
    ((hash_identifier(&identifier).unsigned_abs() % 100) as f64) < rollout
}

/// A rollout is unfinished iff a percentage is present and not yet 100.
pub fn is_unfinished_rollout(rollout: Option<f64>) -> bool {
    matches!(rollout, Some(r) if r != 100.0)
}

/// The rollout percentage in effect at `now_ms`, growing from the configured
/// base at hold-expiry to 100 at ramp-expiry. Monotonically non-decreasing in
/// `now_ms`; the ramped value is rounded to three decimal places.
pub fn effective_rollout(ramp: &RolloutRamp, now_ms: i64) -> f64 {
    let Some(rollout) = ramp.rollout else {
        return 100.0;
    };
    if !is_unfinished_rollout(Some(rollout)) {
        return rollout;
    }

    let base = rollout;
    let hold_ms = ramp.hold_duration_minutes.unwrap_or(0).saturating_mul(60_000);
    let ramp_ms = ramp.ramp_duration_minutes.unwrap_or(0).saturating_mul(60_000);
    let Some(upload_time) = ramp.upload_time else {
        return base;
    };

    let elapsed = now_ms.saturating_sub(upload_time);
    let within_hold = (hold_ms > 0 && elapsed < hold_ms) || (hold_ms == 0 && elapsed < 0);
    if within_hold || ramp_ms <= 0 {
        return base;
    }

    let progress = ((elapsed.saturating_sub(hold_ms)) as f64 / ramp_ms as f64).clamp(0.0, 1.0);
    let computed = base + (100.0 - base) * progress;
    let rounded = (computed * 1000.0).round() / 1000.0;
    rounded.clamp(base, 100.0)
}
