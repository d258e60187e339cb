//! Consolidate the runs produced by a pass into groups keyed by identifier,
//! optionally narrowed to the runs relevant to one reference activity.
//!
//! Multiple distinct runs can carry the same identifier (repeat bursts
//! separated by unique content); grouping folds them under one key, longest
//! run first. A BTreeMap keeps iteration — and therefore summary ordering —
//! deterministic.

use std::collections::BTreeMap;

use crate::activity::Activity;
use crate::condense::RunReducer;
use crate::config::CompareOptions;
use crate::identifier::{activity_identifier, is_external_link, DEFAULT_IDENTIFIER_LENGTH};
use crate::sameness::string_sameness;

/// Identifier -> runs (each an ordered activity sequence), longest first.
pub type GroupedRuns = BTreeMap<String, Vec<Vec<Activity>>>;

/// Flatten closed and open runs into [`GroupedRuns`].
///
/// When `reference` is supplied the result is narrowed to the single group
/// relevant to it:
/// * exact identifier match first;
/// * bare external links retry by lower-cased title, falling back to the
///   URL identifier for the group key when the title also misses;
/// * self-posts (title+body identifiers rarely collide exactly) fuzzy-merge
///   every group whose key scores at or above `match_score`, flattened into
///   one synthetic chronological run under the reference's own identifier;
/// * no match by any method yields an empty group — "no repeats found" is a
///   valid, non-exceptional outcome.
pub fn group_runs(
    reducer: &RunReducer,
    reference: Option<&Activity>,
    opts: &CompareOptions,
) -> GroupedRuns {
    let mut grouped: GroupedRuns = BTreeMap::new();
    for run in reducer.all_runs() {
        grouped
            .entry(run.identifier.clone())
            .or_default()
            .push(run.activities.clone());
    }
    for runs in grouped.values_mut() {
        runs.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    let Some(item) = reference else {
        return grouped;
    };

    let mut identifier = activity_identifier(item, DEFAULT_IDENTIFIER_LENGTH);
    let mut selected = grouped.get(&identifier).cloned();

    if selected.is_none() {
        if is_external_link(item) {
            if let Some(title) = item.title() {
                let title_identifier = title.to_lowercase();
                if let Some(runs) = grouped.get(&title_identifier) {
                    identifier = title_identifier;
                    selected = Some(runs.clone());
                }
                // no title group either: stay keyed by the URL identifier
            }
        } else if item.post_body().is_some() {
            let mut merged: Vec<Activity> = Vec::new();
            let mut any_hit = false;
            for (key, runs) in &grouped {
                if string_sameness(key, &identifier).high_score_weighted >= opts.match_score {
                    any_hit = true;
                    merged.extend(runs.iter().flatten().cloned());
                }
            }
            if any_hit {
                // merging across keys can interleave; restore chronology
                merged.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                selected = Some(vec![merged]);
            }
        }
    }

    let mut narrowed = GroupedRuns::new();
    narrowed.insert(identifier, selected.unwrap_or_default());
    narrowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condense::condense_activities;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(sec: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + sec, 0).unwrap()
    }

    fn comment(n: usize, body: &str) -> Activity {
        Activity::comment(format!("t1_{n}"), "alice", ts(n as i64), body, "t3_parent")
    }

    const SPAM: &str = "join my telegram group for free signals";
    const NOISE: &str = "the weather is lovely this time of year";

    #[test]
    fn groups_merge_same_identifier_longest_first() {
        let activities = vec![
            comment(0, SPAM),
            comment(1, NOISE),
            comment(2, SPAM),
            comment(3, SPAM),
        ];
        let reducer = condense_activities(&activities, &CompareOptions::default());
        let grouped = group_runs(&reducer, None, &CompareOptions::default());

        let runs = grouped.get(SPAM).expect("spam group");
        assert_eq!(runs.len(), 2);
        let lengths: Vec<usize> = runs.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2, 1], "longest run first");
    }

    #[test]
    fn reference_narrows_to_exact_identifier() {
        let activities = vec![comment(0, SPAM), comment(1, SPAM), comment(2, NOISE)];
        let reducer = condense_activities(&activities, &CompareOptions::default());
        let grouped = group_runs(&reducer, Some(&activities[1]), &CompareOptions::default());

        assert_eq!(grouped.len(), 1);
        let runs = grouped.get(SPAM).expect("narrowed to the reference group");
        assert_eq!(runs[0].len(), 2);
    }

    #[test]
    fn unmatched_reference_yields_empty_group_not_error() {
        let activities = vec![comment(0, SPAM), comment(1, SPAM)];
        let reducer = condense_activities(&activities, &CompareOptions::default());
        let stranger = comment(9, "totally novel content nobody repeated");
        let grouped = group_runs(&reducer, Some(&stranger), &CompareOptions::default());

        assert_eq!(grouped.len(), 1);
        let runs = grouped
            .get("totally novel content nobody repeated")
            .expect("empty group under the reference identifier");
        assert!(runs.is_empty());
    }
}
