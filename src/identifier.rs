//! Identifier extraction: derive a deterministic, comparable fingerprint
//! from an activity's content.
//!
//! * Post with body text => title + slice of the body.
//! * Post hosted on a first-party media domain => title only (media URLs are
//!   unique per upload and would dominate the comparison).
//! * Bare external-link post => normalized URL; known video-host URLs
//!   collapse to the canonical video id so tracking params and mirrors
//!   compare equal.
//! * Comment => slice of the body.
//!
//! Always lower-cased. Pure and total: the same activity state yields the
//! same identifier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::activity::Activity;

/// Default number of characters of body text folded into the identifier.
pub const DEFAULT_IDENTIFIER_LENGTH: usize = 200;

/// Hosts whose URLs are unique per upload; only the title is a stable signal.
/// Matched by exact URL equality.
pub const MEDIA_HOSTS: &[&str] = &["v.redd.it", "i.redd.it"];

/// Substrings marking a first-party URL; such posts are not external links.
pub const FIRST_PARTY_MARKERS: &[&str] = &["redd.it", "reddit.com"];

// Video-host URL shapes that expose a canonical id. Covers youtu.be short
// links and youtube.com watch/embed/shorts/v paths.
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtu\.be/|youtube\.com/(?:watch\?\S*?v=|embed/|shorts/|v/))(?P<id>[A-Za-z0-9_-]{6,})",
    )
    .expect("video id regex")]
});

/// Reduce a link to a usable identifier: the canonical video id when the URL
/// matches a known video-host pattern, the raw URL otherwise.
pub fn usable_link_identifier(url: &str) -> String {
    for re in VIDEO_ID_PATTERNS.iter() {
        if let Some(caps) = re.captures(url) {
            if let Some(id) = caps.name("id") {
                if !id.as_str().is_empty() {
                    return id.as_str().to_string();
                }
            }
        }
    }
    url.to_string()
}

/// True for posts whose URL exactly matches the media host allow-list.
pub fn is_media_hosted(activity: &Activity) -> bool {
    activity
        .url()
        .map(|u| MEDIA_HOSTS.contains(&u))
        .unwrap_or(false)
}

/// True only for bare external-link posts: no self-text body, URL neither
/// first-party nor media-hosted.
pub fn is_external_link(activity: &Activity) -> bool {
    match activity.url() {
        Some(url) => {
            activity.post_body().is_none()
                && !FIRST_PARTY_MARKERS.iter().any(|m| url.contains(m))
                && !is_media_hosted(activity)
        }
        None => false,
    }
}

/// Extract the comparison fingerprint for an activity, folding in at most
/// `length` characters of body text.
pub fn activity_identifier(activity: &Activity, length: usize) -> String {
    let identifier = if activity.is_post() {
        let title = activity.title().unwrap_or_default();
        if let Some(body) = activity.post_body() {
            format!("{}{}", title, truncate_chars(body, length))
        } else if is_media_hosted(activity) {
            title.to_string()
        } else {
            usable_link_identifier(activity.url().unwrap_or_default())
        }
    } else {
        truncate_chars(activity.comment_body().unwrap_or_default(), length).to_string()
    };

    identifier.to_lowercase()
}

fn truncate_chars(s: &str, length: usize) -> &str {
    match s.char_indices().nth(length) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
