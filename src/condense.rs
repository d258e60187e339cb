//! Run builder: a single left-to-right pass over a chronological activity
//! stream, partitioning it into runs of consecutive near-duplicate content.
//!
//! State is rebuilt from scratch each iteration — open runs are only
//! re-admitted when the current activity (or the gap buffer) justifies it,
//! and extension copies a run instead of mutating it in place. Closed runs
//! are never reopened.
//!
//! Every open run ends each iteration in exactly one place: extended,
//! kept open via the gap buffer, or closed. Bare external-link posts get a
//! second matching attempt by post title before any of their non-matching
//! runs close, so spam that rotates proxy URLs under a stable title still
//! condenses into one run.

use serde::Serialize;
use tracing::debug;

use crate::activity::Activity;
use crate::config::CompareOptions;
use crate::identifier::{activity_identifier, is_external_link, DEFAULT_IDENTIFIER_LENGTH};
use crate::sameness::string_sameness;

/// A run: one identifier plus the ordered activities believed to be
/// consecutive repeats of it.
///
/// The identifier is the first occurrence found; later members may differ
/// slightly (they matched by sameness, not equality).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatRun {
    pub identifier: String,
    pub activities: Vec<Activity>,
}

impl RepeatRun {
    fn seeded(identifier: String, first: Activity) -> Self {
        Self {
            identifier,
            activities: vec![first],
        }
    }

    /// A copy of this run with `next` appended. The source run is untouched.
    fn extended(&self, next: Activity) -> Self {
        let mut activities = self.activities.clone();
        activities.push(next);
        Self {
            identifier: self.identifier.clone(),
            activities,
        }
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Final state of one pass.
///
/// `open_runs` are still "on a roll" at the end of the supplied history —
/// not yet closed only because no disqualifying activity followed.
/// `closed_runs` were explicitly closed during the pass. Together they hold
/// every run the pass created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReducer {
    pub open_runs: Vec<RepeatRun>,
    pub closed_runs: Vec<RepeatRun>,
}

impl RunReducer {
    /// Closed runs first, then still-open runs.
    pub fn all_runs(&self) -> impl Iterator<Item = &RepeatRun> {
        self.closed_runs.iter().chain(self.open_runs.iter())
    }
}

/// Resolution of one open run within a single iteration.
enum Disposition {
    /// Extended or kept open; holds its slot in the rebuilt open list.
    Open(usize),
    Closed,
    /// Unresolved pending the bare-link title retry.
    Deferred,
}

/// Condense a chronologically ascending, id-deduplicated activity stream
/// into repeat runs. Ordering is the caller's precondition; the `engine`
/// entry points sort defensively before calling this.
pub fn condense_activities(activities: &[Activity], opts: &CompareOptions) -> RunReducer {
    // Identifiers are pure per activity; compute once for the whole pass.
    let identifiers: Vec<String> = activities
        .iter()
        .map(|a| activity_identifier(a, DEFAULT_IDENTIFIER_LENGTH))
        .collect();

    let mut reducer = RunReducer::default();

    for (index, activity) in activities.iter().enumerate() {
        let open_runs = std::mem::take(&mut reducer.open_runs);
        let mut closed_runs = std::mem::take(&mut reducer.closed_runs);

        let identifier = &identifiers[index];
        let is_link = is_external_link(activity);
        let min_met = identifier.chars().count() >= opts.min_word_count;

        // Gap tolerance buffer: the identifiers of up to `gap_allowance`
        // activities immediately preceding this one.
        let buffer_start = index.saturating_sub(opts.gap_allowance);
        let buffered = &identifiers[buffer_start..index];
        let buffer_matches = |run_identifier: &str| {
            buffered
                .iter()
                .any(|b| string_sameness(run_identifier, b).high_score_weighted >= opts.match_score)
        };

        let mut updated_open: Vec<RepeatRun> = Vec::new();
        let mut dispositions: Vec<Disposition> = Vec::with_capacity(open_runs.len());
        let mut matched = false;

        for run in &open_runs {
            let scores = string_sameness(&run.identifier, identifier);
            if min_met && scores.high_score_weighted >= opts.match_score {
                // current activity continues this run
                dispositions.push(Disposition::Open(updated_open.len()));
                updated_open.push(run.extended(activity.clone()));
                matched = true;
            } else if min_met && buffer_matches(&run.identifier) {
                // the run's content was seen within the gap buffer: the
                // current activity is noise inside a continuing run, kept
                // out of the run itself
                dispositions.push(Disposition::Open(updated_open.len()));
                updated_open.push(run.clone());
            } else if !is_link {
                dispositions.push(Disposition::Closed);
                closed_runs.push(run.clone());
            } else {
                // bare links get a title retry before this run closes
                dispositions.push(Disposition::Deferred);
            }
        }

        if !matched {
            // nothing continued: open a fresh run for this identifier
            updated_open.push(RepeatRun::seeded(identifier.clone(), activity.clone()));

            if is_link {
                let title = activity
                    .title()
                    .map(str::to_lowercase)
                    .unwrap_or_default();
                let title_min_met = title.chars().count() >= opts.min_word_count;

                for (run, disposition) in open_runs.iter().zip(dispositions.iter()) {
                    let scores = string_sameness(&run.identifier, &title);
                    if title_min_met && scores.high_score_weighted >= opts.match_score {
                        match disposition {
                            // already kept open by the gap buffer: the
                            // title match upgrades it to an extension
                            Disposition::Open(slot) => {
                                updated_open[*slot] = run.extended(activity.clone());
                            }
                            _ => updated_open.push(run.extended(activity.clone())),
                        }
                        matched = true;
                    } else if let Disposition::Deferred = disposition {
                        if title_min_met && buffer_matches(&run.identifier) {
                            updated_open.push(run.clone());
                        } else {
                            closed_runs.push(run.clone());
                        }
                    }
                }

                // title matched nothing either: it seeds its own run, so a
                // later link with the same title can still continue it
                if !matched {
                    updated_open.push(RepeatRun::seeded(title, activity.clone()));
                }
            }
        } else if is_link {
            // matched by URL identifier: no title retry happens, close the
            // deferred runs now
            for (run, disposition) in open_runs.iter().zip(dispositions.iter()) {
                if let Disposition::Deferred = disposition {
                    closed_runs.push(run.clone());
                }
            }
        }

        reducer.open_runs = updated_open;
        reducer.closed_runs = closed_runs;
    }

    debug!(
        target: "repeat",
        activities = activities.len(),
        open = reducer.open_runs.len(),
        closed = reducer.closed_runs.len(),
        "condensed activity stream"
    );

    reducer
}
