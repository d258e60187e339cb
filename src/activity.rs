//! Activity data model: the post/comment unit the detector compares.
//!
//! Activities are immutable once built and owned by the caller for the
//! duration of one evaluation. Serde derives let callers round-trip
//! activity dumps through JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content payload of an [`Activity`].
///
/// Posts carry a title, an optional self-text body and a URL; comments carry
/// a body and the id of their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityContent {
    Post {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default)]
        url: String,
    },
    Comment {
        body: String,
        parent_id: String,
    },
}

/// A single post or comment by one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Whether the activity has been removed by moderation.
    #[serde(default)]
    pub removed: bool,
    #[serde(flatten)]
    pub content: ActivityContent,
}

impl Activity {
    /// Convenience constructor for a post.
    pub fn post(
        id: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
        title: impl Into<String>,
        body: Option<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            created_at,
            removed: false,
            content: ActivityContent::Post {
                title: title.into(),
                body,
                url: url.into(),
            },
        }
    }

    /// Convenience constructor for a comment.
    pub fn comment(
        id: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
        body: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            created_at,
            removed: false,
            content: ActivityContent::Comment {
                body: body.into(),
                parent_id: parent_id.into(),
            },
        }
    }

    /// Marks the activity as removed (builder style).
    pub fn with_removed(mut self, removed: bool) -> Self {
        self.removed = removed;
        self
    }

    pub fn is_post(&self) -> bool {
        matches!(self.content, ActivityContent::Post { .. })
    }

    pub fn title(&self) -> Option<&str> {
        match &self.content {
            ActivityContent::Post { title, .. } => Some(title),
            ActivityContent::Comment { .. } => None,
        }
    }

    /// The self-text body of a post. `None` for comments and bare links.
    pub fn post_body(&self) -> Option<&str> {
        match &self.content {
            ActivityContent::Post { body, .. } => body.as_deref(),
            ActivityContent::Comment { .. } => None,
        }
    }

    pub fn comment_body(&self) -> Option<&str> {
        match &self.content {
            ActivityContent::Post { .. } => None,
            ActivityContent::Comment { body, .. } => Some(body),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.content {
            ActivityContent::Post { url, .. } => Some(url),
            ActivityContent::Comment { .. } => None,
        }
    }

    /// Short human-readable handle used in run descriptions: a post's title,
    /// a comment's parent id.
    pub fn reference_label(&self) -> &str {
        match &self.content {
            ActivityContent::Post { title, .. } => title,
            ActivityContent::Comment { parent_id, .. } => parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(sec: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + sec, 0).unwrap()
    }

    #[test]
    fn accessors_match_content_kind() {
        let p = Activity::post("t3_a", "alice", ts(0), "A title", None, "https://example.com/x");
        assert!(p.is_post());
        assert_eq!(p.title(), Some("A title"));
        assert_eq!(p.post_body(), None);
        assert_eq!(p.url(), Some("https://example.com/x"));
        assert_eq!(p.reference_label(), "A title");

        let c = Activity::comment("t1_b", "alice", ts(1), "hello there", "t3_a");
        assert!(!c.is_post());
        assert_eq!(c.comment_body(), Some("hello there"));
        assert_eq!(c.url(), None);
        assert_eq!(c.reference_label(), "t3_a");
    }

    #[test]
    fn activity_round_trips_through_json() {
        let p = Activity::post(
            "t3_a",
            "alice",
            ts(0),
            "A title",
            Some("body text".to_string()),
            "https://example.com/x",
        )
        .with_removed(true);

        let json = serde_json::to_string(&p).unwrap();
        let back: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);

        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["kind"], serde_json::json!("post"));
        assert_eq!(v["removed"], serde_json::json!(true));
    }

    #[test]
    fn removed_defaults_to_false_when_absent() {
        let raw = r#"{
            "id": "t1_c",
            "author": "bob",
            "created_at": "2024-01-01T00:00:00Z",
            "kind": "comment",
            "body": "hi",
            "parent_id": "t3_z"
        }"#;
        let c: Activity = serde_json::from_str(raw).unwrap();
        assert!(!c.removed);
    }
}
