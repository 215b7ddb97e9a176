//! Reddit source — unauthenticated reads of a subreddit's "new" listing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::FetchError;
use crate::model::Post;
use crate::source::PostSource;

const REDDIT_API_BASE: &str = "https://www.reddit.com";

/// Read-only Reddit client.
pub struct RedditSource {
    base_url: String,
    client: reqwest::Client,
}

impl RedditSource {
    /// Reddit throttles or rejects generic user agents, so callers must
    /// provide a descriptive one.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        Self::with_base_url(REDDIT_API_BASE, user_agent)
    }

    /// Point the client at a different host (used by tests).
    pub fn with_base_url(base_url: &str, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Request {
                source_name: "reddit".into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn listing_url(&self, subreddit: &str, limit: usize) -> String {
        format!(
            "{}/r/{subreddit}/new.json?limit={limit}&raw_json=1",
            self.base_url
        )
    }
}

#[async_trait]
impl PostSource for RedditSource {
    async fn fetch_newest(&self, subreddit: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        let source_name = format!("r/{subreddit}");

        let resp = self
            .client
            .get(self.listing_url(subreddit, limit))
            .send()
            .await
            .map_err(|e| FetchError::Request {
                source_name: source_name.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited { source_name });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                source_name,
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await.map_err(|e| FetchError::Request {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;

        let mut posts = parse_listing(&body).map_err(|e| FetchError::Decode {
            source_name,
            reason: e.to_string(),
        })?;
        posts.truncate(limit);
        Ok(posts)
    }
}

// ── Listing wire format ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: LinkData,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    /// Fullname, e.g. `t3_abc`.
    name: String,
    permalink: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    created_utc: Option<f64>,
}

/// Parse a listing body into posts, preserving Reddit's newest-first order.
fn parse_listing(body: &str) -> Result<Vec<Post>, serde_json::Error> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(listing
        .data
        .children
        .into_iter()
        .map(|thing| {
            let link = thing.data;
            let mut post = Post::new(link.name, link.permalink).with_title(link.title);
            if let Some(created) = link
                .created_utc
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0))
            {
                post = post.with_created_at(created);
            }
            post
        })
        .collect())
}
