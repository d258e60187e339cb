//! Fuzzy "sameness" scoring between two strings on a 0–100 scale.
//!
//! Three complementary metrics over normalized input — char-bigram Dice
//! overlap, cosine similarity of character frequencies, and
//! Levenshtein-derived percentage — averaged into `high_score`, then
//! adjusted by a length-confidence weight into `high_score_weighted`.
//!
//! Every match decision in the crate compares `high_score_weighted` against
//! `CompareOptions::match_score`.

use serde::Serialize;
use std::collections::HashMap;
use strsim::{levenshtein, normalized_levenshtein, sorensen_dice};

/// A normalizing transform applied to both inputs before scoring.
pub type Transform = fn(&str) -> String;

/// Default pipeline, applied in order: lower-case, trim, strip everything
/// that is not alphanumeric or whitespace, collapse whitespace runs.
pub const DEFAULT_TRANSFORMS: &[Transform] = &[
    lower_case,
    trim,
    strip_non_alphanumeric,
    collapse_whitespace,
];

/// Cap on the length-confidence weight added to `high_score`.
pub const MAX_LENGTH_WEIGHT: f64 = 15.0;

/// Component and aggregate scores for one comparison. All percentages are
/// 0–100 except `high_score_weighted`, which may exceed 100 for long
/// identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamenessScores {
    pub dice: f64,
    pub cosine: f64,
    pub leven_distance: usize,
    pub leven_percent: f64,
    pub high_score: f64,
    pub high_score_weighted: f64,
}

/// Score two strings with the default transform pipeline.
pub fn string_sameness(a: &str, b: &str) -> SamenessScores {
    string_sameness_with(a, b, DEFAULT_TRANSFORMS)
}

/// Score two strings, normalizing both with `transforms` first.
pub fn string_sameness_with(a: &str, b: &str, transforms: &[Transform]) -> SamenessScores {
    let na = apply_transforms(a, transforms);
    let nb = apply_transforms(b, transforms);

    let dice = sorensen_dice(&na, &nb) * 100.0;
    let cosine = cosine_char_similarity(&na, &nb) * 100.0;
    let leven_distance = levenshtein(&na, &nb);
    let leven_percent = normalized_levenshtein(&na, &nb) * 100.0;

    let high_score = (dice + cosine + leven_percent) / 3.0;
    let shorter = na.chars().count().min(nb.chars().count());

    SamenessScores {
        dice,
        cosine,
        leven_distance,
        leven_percent,
        high_score,
        high_score_weighted: high_score + length_weight(shorter),
    }
}

fn apply_transforms(s: &str, transforms: &[Transform]) -> String {
    transforms
        .iter()
        .fold(s.to_string(), |acc, t| t(&acc))
}

pub fn lower_case(s: &str) -> String {
    s.to_lowercase()
}

pub fn trim(s: &str) -> String {
    s.trim().to_string()
}

/// Keep alphanumerics and whitespace; drop punctuation and symbols.
pub fn strip_non_alphanumeric(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Collapse runs of whitespace (including newlines) to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Calibrated length-confidence curve: `ln(len)/0.2 - 5`, capped at
/// [`MAX_LENGTH_WEIGHT`]. Negative below ~3 chars, so very short inputs are
/// penalized rather than allowed to match on inflated raw scores. The exact
/// shape materially changes trigger behavior near the match-score boundary;
/// keep it as-is.
fn length_weight(shorter_len: usize) -> f64 {
    let len = shorter_len.max(1) as f64;
    ((len.ln() / 0.20) - 5.0).min(MAX_LENGTH_WEIGHT)
}

/// Cosine similarity over character-frequency vectors. Both empty => 1.0,
/// one empty => 0.0.
fn cosine_char_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let fa = char_frequencies(a);
    let fb = char_frequencies(b);

    let dot: f64 = fa
        .iter()
        .filter_map(|(c, &x)| fb.get(c).map(|&y| (x * y) as f64))
        .sum();
    let norm_a = fa.values().map(|&x| (x * x) as f64).sum::<f64>().sqrt();
    let norm_b = fb.values().map(|&x| (x * x) as f64).sum::<f64>().sqrt();

    dot / (norm_a * norm_b)
}

fn char_frequencies(s: &str) -> HashMap<char, usize> {
    let mut freq = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }
    freq
}
