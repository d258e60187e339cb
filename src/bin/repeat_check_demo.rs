//! Demo that runs the repeat-content check over an activity dump
//! (JSON path as the first argument, built-in sample otherwise).

use chrono::{Duration, Utc};
use repeat_activity_detector::{check_repeats_for, Activity, CompareOptions};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let opts = match CompareOptions::from_toml() {
        Ok(opts) => opts,
        Err(_) => CompareOptions::default(),
    };
    opts.validate()?;

    let activities: Vec<Activity> = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => sample_activities(),
    };
    let item = activities
        .last()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("activity dump is empty"))?;

    let outcome = check_repeats_for(&activities, &opts, &item)?;

    println!("{}", outcome.result);
    for summary in &outcome.summaries {
        for description in &summary.run_descriptions {
            println!("  - {description}");
        }
    }
    println!(
        "triggered: {} ({} group(s))",
        outcome.triggered,
        outcome.summaries.len()
    );

    Ok(())
}

fn sample_activities() -> Vec<Activity> {
    let start = Utc::now() - Duration::hours(6);
    let spam = "Huge giveaway on my profile, check it out before it ends!";
    [
        spam,
        "Anyone else watching the game tonight?",
        spam,
        spam,
        spam,
    ]
    .iter()
    .enumerate()
    .map(|(n, body)| {
        Activity::comment(
            format!("t1_demo{n}"),
            "demo-author",
            start + Duration::minutes(n as i64 * 10),
            *body,
            "t3_thread",
        )
    })
    .collect()
}
