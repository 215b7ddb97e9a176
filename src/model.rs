//! Post model shared by the source, queue and sender.

use chrono::{DateTime, Utc};

/// A post fetched from the source. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Source-wide unique identifier (Reddit fullname, e.g. `t3_abc`).
    pub id: String,
    /// Path relative to the site root, e.g. `/r/rust/comments/abc/title/`.
    pub permalink: String,
    /// Empty when the source does not supply one.
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(id: impl Into<String>, permalink: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permalink: permalink.into(),
            title: String::new(),
            created_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Seconds since the post was created, if known.
    pub fn age_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.created_at.map(|created| (now - created).num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn age_is_measured_from_creation() {
        let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let now = Utc.timestamp_opt(1_700_000_090, 0).unwrap();
        let post = Post::new("t3_a", "/r/x/a/").with_created_at(created);
        assert_eq!(post.age_secs(now), Some(90));
        assert_eq!(Post::new("t3_b", "/r/x/b/").age_secs(now), None);
    }
}
