//! Pure orchestration: activities -> condensed runs -> grouped runs ->
//! evaluation result. No I/O; suitable for unit tests and offline replay.
//!
//! Chronological ordering is a caller precondition, guarded here by a
//! defensive stable re-sort rather than an error. Every evaluation starts
//! from fresh state and owns its own copy of the activity slice, so
//! concurrent evaluations for different authors need no coordination.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::activity::Activity;
use crate::condense::condense_activities;
use crate::config::CompareOptions;
use crate::error::ParseError;
use crate::evaluate::{generate_result, RepeatCheckResult};
use crate::grouping::group_runs;

/// Evaluate an author's activity history for repeated content.
pub fn check_repeats(
    activities: &[Activity],
    opts: &CompareOptions,
) -> Result<RepeatCheckResult, ParseError> {
    evaluate(activities, opts, None)
}

/// Evaluate an author's history with `item` as the activity under
/// processing. The item is inserted into the history if the caller's fetch
/// missed it; when `use_processing_as_reference` is set, results are
/// narrowed to the runs relevant to it.
pub fn check_repeats_for(
    activities: &[Activity],
    opts: &CompareOptions,
    item: &Activity,
) -> Result<RepeatCheckResult, ParseError> {
    evaluate(activities, opts, Some(item))
}

fn evaluate(
    activities: &[Activity],
    opts: &CompareOptions,
    item: Option<&Activity>,
) -> Result<RepeatCheckResult, ParseError> {
    let mut timeline: Vec<Activity> = activities
        .iter()
        .filter(|a| opts.keep_removed || !a.removed)
        .cloned()
        .collect();

    if let Some(item) = item {
        if !timeline.iter().any(|a| a.id == item.id) {
            timeline.push(item.clone());
        }
    }

    if !is_chronological(&timeline) {
        warn!(target: "repeat", "activities arrived out of order; re-sorting by created_at");
        timeline.sort_by_key(|a| a.created_at);
    }
    dedup_by_id(&mut timeline);

    let reducer = condense_activities(&timeline, opts);

    let reference = if opts.use_processing_as_reference {
        item
    } else {
        None
    };
    let grouped = group_runs(&reducer, reference, opts);
    let reference_hash = reference.map(|a| anon_hash(&a.id)).unwrap_or_default();
    debug!(
        target: "repeat",
        groups = grouped.len(),
        reference = %reference_hash,
        "grouped repeat runs"
    );

    generate_result(&grouped, opts)
}

fn is_chronological(timeline: &[Activity]) -> bool {
    timeline
        .windows(2)
        .all(|w| w[0].created_at <= w[1].created_at)
}

/// Keep the first occurrence of each id; order is preserved.
fn dedup_by_id(timeline: &mut Vec<Activity>) {
    let mut seen = HashSet::new();
    timeline.retain(|a| seen.insert(a.id.clone()));
}

/// Short anonymized hash for log lines. Raw content and ids never hit the
/// log stream.
pub(crate) fn anon_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
