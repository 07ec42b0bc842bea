//! Discourse forum client.
//!
//! Fetches governance proposal topics through the public `/t/{id}.json`
//! endpoint and flattens them into [`ProposalRecord`] values. The first post
//! in the stream is the proposal body, every later post is a comment.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::AnalyzerError;
use crate::text;

/// Some Discourse installs reject requests without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Records
// ============================================================================

/// A governance proposal flattened from a Discourse topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalRecord {
    pub title: String,
    /// Topic creation timestamp as the forum reports it.
    pub created_at: String,
    /// Normalized plain text of the opening post.
    pub content: String,
    /// Replies in forum post order.
    pub comments: Vec<CommentRecord>,
    pub post_count: u32,
    pub participant_count: u32,
    pub like_count: u32,
    pub views: u32,
    pub tags: Vec<String>,
}

/// A single reply on a proposal topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentRecord {
    /// Normalized plain text of the reply.
    pub content: String,
    pub created_at: String,
    pub author: String,
    pub post_number: u32,
    pub like_count: u32,
    pub reply_count: u32,
    /// Discourse's internal ranking score for the post.
    pub score: f64,
    pub is_solution: bool,
    pub reactions: Vec<ReactionCount>,
}

/// Emoji reaction tally on a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionCount {
    pub id: String,
    pub count: u32,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for public Discourse topic endpoints.
#[derive(Debug, Clone)]
pub struct DiscourseClient {
    client: Client,
}

impl DiscourseClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Splits a topic link into `(base_url, topic_id)`.
    ///
    /// Discourse links look like `https://forum.example.org/t/<slug>/<id>`
    /// with optional trailing post numbers, and some installs serve plain
    /// `/t/<id>`. The topic id is the first all-numeric path segment after
    /// `/t/`. The base URL keeps everything before `/t/`, so subfolder
    /// installs like `example.org/forum/t/...` fetch under `/forum`.
    /// Anything else fails before any network call.
    pub fn parse_proposal_url(url: &str) -> Result<(String, String), AnalyzerError> {
        let parsed = Url::parse(url)
            .map_err(|e| AnalyzerError::InvalidUrlFormat(format!("{}: {}", url, e)))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| AnalyzerError::InvalidUrlFormat(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AnalyzerError::InvalidUrlFormat(url.to_string()));
        }

        let parts: Vec<&str> = parsed.path().split("/t/").collect();
        if parts.len() != 2 {
            return Err(AnalyzerError::InvalidUrlFormat(url.to_string()));
        }

        let topic_id = parts[1]
            .split('/')
            .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| AnalyzerError::InvalidUrlFormat(url.to_string()))?;

        let prefix = parts[0].trim_end_matches('/');
        let base_url = match parsed.port() {
            Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, prefix),
            None => format!("{}://{}{}", parsed.scheme(), host, prefix),
        };

        Ok((base_url, topic_id.to_string()))
    }

    /// Fetches the raw topic JSON from `{base_url}/t/{topic_id}.json`.
    pub async fn fetch_topic(
        &self,
        base_url: &str,
        topic_id: &str,
    ) -> Result<Value, AnalyzerError> {
        let url = format!("{}/t/{}.json", base_url.trim_end_matches('/'), topic_id);
        tracing::debug!(url = %url, "Fetching Discourse topic");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalyzerError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Fetch {
                url,
                reason: format!("HTTP {}", status.as_u16()),
                status: Some(status.as_u16()),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AnalyzerError::Fetch {
                url,
                reason: format!("invalid JSON body: {}", e),
                status: Some(status.as_u16()),
            })
    }

    /// Parses the URL, fetches the topic and flattens it into a record.
    pub async fn fetch_proposal(
        &self,
        url: &str,
    ) -> Result<(String, ProposalRecord), AnalyzerError> {
        let (base_url, topic_id) = Self::parse_proposal_url(url)?;
        let topic = self.fetch_topic(&base_url, &topic_id).await?;
        let record = Self::extract_proposal(&topic);

        tracing::info!(
            topic_id = %topic_id,
            title = %record.title,
            comment_count = record.comments.len(),
            "Fetched proposal"
        );

        Ok((topic_id, record))
    }

    /// Flattens topic JSON into a [`ProposalRecord`]. Absent fields default
    /// rather than fail; forums differ in which counters they expose.
    pub fn extract_proposal(topic: &Value) -> ProposalRecord {
        let posts = topic
            .get("post_stream")
            .and_then(|s| s.get("posts"))
            .and_then(Value::as_array);

        let content = posts
            .and_then(|p| p.first())
            .map(|post| text::normalize(str_field(post, "cooked")))
            .unwrap_or_default();

        let comments = posts
            .map(|p| p.iter().skip(1).map(extract_comment).collect())
            .unwrap_or_default();

        ProposalRecord {
            title: str_field(topic, "title").to_string(),
            created_at: str_field(topic, "created_at").to_string(),
            content,
            comments,
            post_count: u32_field(topic, "posts_count"),
            participant_count: u32_field(topic, "participant_count"),
            like_count: u32_field(topic, "like_count"),
            views: u32_field(topic, "views"),
            tags: string_array(topic, "tags"),
        }
    }
}

impl Default for DiscourseClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Extraction helpers
// ============================================================================

fn extract_comment(post: &Value) -> CommentRecord {
    CommentRecord {
        content: text::normalize(str_field(post, "cooked")),
        created_at: str_field(post, "created_at").to_string(),
        author: str_field(post, "username").to_string(),
        post_number: u32_field(post, "post_number"),
        like_count: like_count(post),
        reply_count: u32_field(post, "reply_count"),
        score: post.get("score").and_then(Value::as_f64).unwrap_or(0.0),
        is_solution: post
            .get("accepted_answer")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        reactions: reactions(post),
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn u32_field(value: &Value, key: &str) -> u32 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0) as u32
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Post like counts live either in `like_count` or in the `actions_summary`
/// entry with action id 2, depending on the Discourse version.
fn like_count(post: &Value) -> u32 {
    if let Some(count) = post.get("like_count").and_then(Value::as_u64) {
        return count as u32;
    }

    post.get("actions_summary")
        .and_then(Value::as_array)
        .and_then(|actions| {
            actions
                .iter()
                .find(|action| action.get("id").and_then(Value::as_u64) == Some(2))
        })
        .and_then(|action| action.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32
}

fn reactions(post: &Value) -> Vec<ReactionCount> {
    post.get("reactions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id").and_then(Value::as_str)?;
                    Some(ReactionCount {
                        id: id.to_string(),
                        count: item.get("count").and_then(Value::as_u64).unwrap_or(0) as u32,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
