//! Identifier generation for tasks, projects and subtasks.
//!
//! Ids are opaque strings of the form `<prefix>-<time><seq><random>`:
//! base-36 milliseconds since the epoch, a two-digit per-process sequence and
//! four random hex characters. Nothing parses them back.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Global counter for deterministic ID generation in tests.
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-process sequence mixed into every random id.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Whether to use deterministic IDs (for testing).
static USE_DETERMINISTIC_IDS: AtomicBool = AtomicBool::new(false);

/// Prefix for task ids.
pub const TASK_PREFIX: &str = "task";
/// Prefix for project ids.
pub const PROJECT_PREFIX: &str = "proj";
/// Prefix for subtask ids.
pub const SUBTASK_PREFIX: &str = "sub";

/// Enable deterministic ID generation for testing.
///
/// When enabled, IDs will use a counter instead of time and randomness.
pub fn enable_deterministic_ids() {
    USE_DETERMINISTIC_IDS.store(true, Ordering::SeqCst);
    TEST_COUNTER.store(0, Ordering::SeqCst);
}

/// Disable deterministic ID generation.
pub fn disable_deterministic_ids() {
    USE_DETERMINISTIC_IDS.store(false, Ordering::SeqCst);
}

/// Encode a number in lowercase base 36.
#[must_use]
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Generate a random 4-character hex suffix.
#[allow(clippy::cast_possible_truncation)]
fn random_suffix(seq: u64) -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let state = RandomState::new();
    let mut hasher = state.build_hasher();
    // Truncation is intentional - we only need entropy, not precision
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64),
    );
    hasher.write_u64(seq);
    format!("{:04x}", hasher.finish() & 0xFFFF)
}

/// Generate a new id with the given prefix.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn generate_id(prefix: &str) -> String {
    if USE_DETERMINISTIC_IDS.load(Ordering::SeqCst) {
        let count = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        return format!("{prefix}-{count:04}");
    }

    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let seq = SEQUENCE.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}-{}{:02x}{}", to_base36(millis), seq & 0xFF, random_suffix(seq))
}
