//! Result evaluation: test each group's runs against the parsed threshold
//! and compile a human-auditable summary.
//!
//! Trigger policy is asymmetric by design and must stay that way:
//! "greater" operators fire the instant any run passes (flagging excess
//! repetition), while "lesser" operators additionally require every tested
//! run across every group to pass (confirming uniqueness). Do not collapse
//! the two into a single comparison mode.

use serde::Serialize;

use crate::activity::Activity;
use crate::comparison::parse_generic_value_comparison;
use crate::config::CompareOptions;
use crate::error::ParseError;
use crate::grouping::GroupedRuns;
use crate::identifier::activity_identifier;

pub const PASS: &str = "PASS";
pub const FAIL: &str = "FAIL";

/// Identifier sample length used in run descriptions.
pub const SUMMARY_IDENTIFIER_LENGTH: usize = 50;

/// Per-identifier aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct RepeatSummary {
    pub identifier: String,
    pub total_runs: usize,
    pub total_triggering_runs: usize,
    /// Size of the largest run found for this identifier.
    pub largest_run: usize,
    pub runs: Vec<Vec<Activity>>,
    pub run_descriptions: Vec<String>,
    pub triggering_runs: Vec<Vec<Activity>>,
    pub triggering_descriptions: Vec<String>,
}

/// Overall evaluation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RepeatCheckResult {
    pub triggered: bool,
    /// One-line human-readable verdict.
    pub result: String,
    pub summaries: Vec<RepeatSummary>,
}

/// Apply the configured threshold to every group and derive the trigger
/// decision. The only failure mode is an unparseable threshold expression.
pub fn generate_result(
    grouped: &GroupedRuns,
    opts: &CompareOptions,
) -> Result<RepeatCheckResult, ParseError> {
    let comparison = parse_generic_value_comparison(&opts.threshold)?;
    let greater = comparison.operator.is_greater_family();
    let mut all_passed = true;

    let mut summaries: Vec<RepeatSummary> = Vec::with_capacity(grouped.len());
    for (identifier, runs) in grouped {
        let mut summary = RepeatSummary {
            identifier: identifier.clone(),
            total_runs: runs.len(),
            total_triggering_runs: 0,
            largest_run: 0,
            runs: Vec::new(),
            run_descriptions: Vec::new(),
            triggering_runs: Vec::new(),
            triggering_descriptions: Vec::new(),
        };

        for run in runs {
            let hit = comparison.operator.test(run.len() as f64, comparison.value);
            let description = describe_run(run);

            summary.largest_run = summary.largest_run.max(run.len());
            summary.runs.push(run.clone());
            summary.run_descriptions.push(description.clone());
            if hit {
                summary.total_triggering_runs += 1;
                summary.triggering_runs.push(run.clone());
                summary.triggering_descriptions.push(description);
            } else if !greater {
                // a "lesser" threshold demands unanimity across all runs
                all_passed = false;
            }
        }

        summaries.push(summary);
    }

    let triggering_groups = summaries
        .iter()
        .filter(|s| s.total_triggering_runs > 0)
        .count();
    let triggered = triggering_groups > 0 && (greater || all_passed);
    let largest_repeat = summaries.iter().map(|s| s.largest_run).max().unwrap_or(0);

    let result = if triggered || greater {
        format!(
            "{} {} of {} unique items repeated {} times, largest repeat: {}",
            if triggered { PASS } else { FAIL },
            triggering_groups,
            summaries.len(),
            opts.threshold,
            largest_repeat
        )
    } else {
        format!(
            "{} Not all of {} unique items repeated {} times, largest repeat: {}",
            FAIL,
            summaries.len(),
            opts.threshold,
            largest_repeat
        )
    };

    Ok(RepeatCheckResult {
        triggered,
        result,
        summaries,
    })
}

/// `<identifier sample> <found once|repeated Nx> in <refs>` where a post's
/// ref is its title and a comment's ref is its parent id.
fn describe_run(run: &[Activity]) -> String {
    let Some(first) = run.first() else {
        return String::new();
    };
    let sample = activity_identifier(first, SUMMARY_IDENTIFIER_LENGTH);
    let count = if run.len() == 1 {
        "found once".to_string()
    } else {
        format!("repeated {}x", run.len())
    };
    let refs = run
        .iter()
        .map(|a| a.reference_label())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{sample} {count} in {refs}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn ts(sec: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + sec, 0).unwrap()
    }

    fn comment(n: usize, body: &str) -> Activity {
        Activity::comment(format!("t1_{n}"), "alice", ts(n as i64), body, "t3_parent")
    }

    fn grouped_of(lengths_by_key: &[(&str, &[usize])]) -> GroupedRuns {
        let mut grouped: GroupedRuns = BTreeMap::new();
        let mut n = 0;
        for (key, lengths) in lengths_by_key {
            let runs: Vec<Vec<Activity>> = lengths
                .iter()
                .map(|&len| {
                    (0..len)
                        .map(|_| {
                            n += 1;
                            comment(n, key)
                        })
                        .collect()
                })
                .collect();
            grouped.insert(key.to_string(), runs);
        }
        grouped
    }

    fn opts_with(threshold: &str) -> CompareOptions {
        CompareOptions {
            threshold: threshold.to_string(),
            ..CompareOptions::default()
        }
    }

    #[test]
    fn greater_threshold_triggers_on_any_passing_run() {
        let grouped = grouped_of(&[
            ("spam content here repeated often", &[4usize, 1][..]),
            ("unique thing said only once", &[1][..]),
        ]);
        let result = generate_result(&grouped, &opts_with(">= 3")).unwrap();
        assert!(result.triggered);
        assert_eq!(
            result.result,
            "PASS 1 of 2 unique items repeated >= 3 times, largest repeat: 4"
        );
        let spam = &result.summaries[0];
        assert_eq!(spam.total_runs, 2);
        assert_eq!(spam.total_triggering_runs, 1);
        assert_eq!(spam.largest_run, 4);
    }

    #[test]
    fn greater_threshold_fails_without_passing_runs() {
        let grouped = grouped_of(&[("short run only", &[2usize][..])]);
        let result = generate_result(&grouped, &opts_with(">= 3")).unwrap();
        assert!(!result.triggered);
        assert_eq!(
            result.result,
            "FAIL 0 of 1 unique items repeated >= 3 times, largest repeat: 2"
        );
    }

    #[test]
    fn lesser_threshold_requires_unanimity() {
        // all runs below 2: triggers
        let grouped = grouped_of(&[
            ("first unique item", &[1usize][..]),
            ("second unique item", &[1][..]),
        ]);
        let result = generate_result(&grouped, &opts_with("< 2")).unwrap();
        assert!(result.triggered);

        // one run of 3 violates uniqueness: must not trigger even though
        // other runs individually pass
        let grouped = grouped_of(&[
            ("first unique item", &[1usize][..]),
            ("repeated item", &[3][..]),
        ]);
        let result = generate_result(&grouped, &opts_with("< 2")).unwrap();
        assert!(!result.triggered);
        assert_eq!(
            result.result,
            "FAIL Not all of 2 unique items repeated < 2 times, largest repeat: 3"
        );
    }

    #[test]
    fn empty_grouping_does_not_trigger() {
        let result = generate_result(&BTreeMap::new(), &opts_with(">= 3")).unwrap();
        assert!(!result.triggered);
        assert_eq!(
            result.result,
            "FAIL 0 of 0 unique items repeated >= 3 times, largest repeat: 0"
        );
    }

    #[test]
    fn bad_threshold_aborts_the_evaluation() {
        let grouped = grouped_of(&[("anything at all", &[1usize][..])]);
        let err = generate_result(&grouped, &opts_with("at least three")).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidComparison("at least three".to_string())
        );
    }

    #[test]
    fn run_descriptions_name_sample_count_and_refs() {
        let grouped = grouped_of(&[("spam body text", &[2usize][..])]);
        let result = generate_result(&grouped, &opts_with(">= 3")).unwrap();
        let description = &result.summaries[0].run_descriptions[0];
        assert!(
            description.starts_with("spam body text repeated 2x in "),
            "got {description:?}"
        );
        assert!(description.contains("t3_parent"));

        let singleton = grouped_of(&[("one off remark", &[1usize][..])]);
        let result = generate_result(&singleton, &opts_with(">= 3")).unwrap();
        assert!(result.summaries[0].run_descriptions[0].contains("found once"));
    }
}
