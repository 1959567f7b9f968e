//! X API v2 adapter.
//!
//! Implements the `xmb-core` PlatformClient port over the v2 REST endpoints:
//! `GET /2/users/me`, `GET /2/users/:id/mentions`, `POST /2/tweets`.
//! Authentication is an OAuth2 user-context bearer token; posting requires
//! the `tweet.write` scope, and a 403 here almost always means the app lacks
//! it, which is why that status maps to a dedicated error variant.

use std::time::Duration;

use async_trait::async_trait;

use xmb_core::{
    domain::{AccountId, AccountIdentity, Mention, MentionId, PostReceipt},
    errors::Error,
    ports::PlatformClient,
    Result,
};

const API_BASE: &str = "https://api.twitter.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// The mentions endpoint only accepts max_results in this window.
const MIN_MENTION_RESULTS: u32 = 5;
const MAX_MENTION_RESULTS: u32 = 100;

#[derive(Clone, Debug)]
pub struct TwitterClient {
    http: reqwest::Client,
    bearer_token: String,
    base_url: String,
}

impl TwitterClient {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent("xmb/0.1")
            .build()
            .expect("reqwest client build");
        Self {
            http,
            bearer_token: bearer_token.into(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the client at a different API host (local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json(&self, url: String) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| Error::Platform(format!("x api request error: {e}")))?;

        check_status(resp).await
    }
}

#[async_trait]
impl PlatformClient for TwitterClient {
    async fn get_self(&self) -> Result<AccountIdentity> {
        let url = format!("{}/2/users/me?user.fields=username,name", self.base_url);
        let v = self.get_json(url).await?;
        parse_identity(&v)
    }

    async fn get_mentions(&self, account_id: &AccountId, limit: u32) -> Result<Vec<Mention>> {
        let max_results = limit.clamp(MIN_MENTION_RESULTS, MAX_MENTION_RESULTS);
        let url = format!(
            "{}/2/users/{}/mentions?max_results={max_results}&tweet.fields=author_id",
            self.base_url, account_id
        );
        let v = self.get_json(url).await?;
        // The endpoint minimum can overshoot the configured batch size.
        let mut mentions = parse_mentions(&v);
        mentions.truncate(limit as usize);
        Ok(mentions)
    }

    async fn post_reply(&self, text: &str, in_reply_to: &MentionId) -> Result<PostReceipt> {
        let url = format!("{}/2/tweets", self.base_url);
        let body = serde_json::json!({
            "text": text,
            "reply": { "in_reply_to_tweet_id": in_reply_to.0 }
        });

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Platform(format!("x api request error: {e}")))?;

        let v = check_status(resp).await?;
        let id = v
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(|x| x.as_str())
            .ok_or_else(|| Error::Platform("tweet response missing data.id".to_string()))?;
        Ok(PostReceipt {
            id: MentionId(id.to_string()),
        })
    }
}

async fn check_status(resp: reqwest::Response) -> Result<serde_json::Value> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json()
            .await
            .map_err(|e| Error::Platform(format!("x api json error: {e}")));
    }

    let body = resp.text().await.unwrap_or_default();
    Err(map_api_error(status.as_u16(), &body))
}

/// Map a non-success X API response to the core error taxonomy.
fn map_api_error(status: u16, body: &str) -> Error {
    let snippet: String = body.chars().take(200).collect();
    match status {
        403 => Error::Permission(format!(
            "x api returned 403: {snippet}. Ensure the app has write permissions \
             (tweet.write scope) enabled in the developer portal"
        )),
        429 => Error::Platform(format!("x api rate limited (429): {snippet}")),
        _ => Error::Platform(format!("x api returned {status}: {snippet}")),
    }
}

fn parse_identity(v: &serde_json::Value) -> Result<AccountIdentity> {
    let data = v
        .get("data")
        .ok_or_else(|| Error::Platform("users/me response missing data".to_string()))?;
    let id = data
        .get("id")
        .and_then(|x| x.as_str())
        .ok_or_else(|| Error::Platform("users/me response missing data.id".to_string()))?;

    Ok(AccountIdentity {
        id: AccountId(id.to_string()),
        username: data
            .get("username")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        name: data
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

/// Mentions arrive newest first; entries without an id are dropped.
fn parse_mentions(v: &serde_json::Value) -> Vec<Mention> {
    let Some(items) = v.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|t| {
            let id = t.get("id").and_then(|x| x.as_str())?;
            Some(Mention {
                id: MentionId(id.to_string()),
                author_id: AccountId(
                    t.get("author_id")
                        .and_then(|x| x.as_str())
                        .unwrap_or_default()
                        .to_string(),
                ),
                text: t
                    .get("text")
                    .and_then(|x| x.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_users_me_payload() {
        let v = serde_json::json!({
            "data": { "id": "123", "username": "mybot", "name": "My Bot" }
        });
        let me = parse_identity(&v).unwrap();
        assert_eq!(me.id, AccountId("123".to_string()));
        assert_eq!(me.username, "mybot");
        assert_eq!(me.name, "My Bot");
    }

    #[test]
    fn identity_without_data_is_an_error() {
        let v = serde_json::json!({ "errors": [{ "title": "Unauthorized" }] });
        assert!(parse_identity(&v).is_err());
    }

    #[test]
    fn parses_mentions_payload_in_order() {
        let v = serde_json::json!({
            "data": [
                { "id": "2", "author_id": "9", "text": "newest" },
                { "id": "1", "author_id": "8", "text": "older" }
            ],
            "meta": { "result_count": 2 }
        });
        let mentions = parse_mentions(&v);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].id, MentionId("2".to_string()));
        assert_eq!(mentions[0].text, "newest");
        assert_eq!(mentions[1].author_id, AccountId("8".to_string()));
    }

    #[test]
    fn empty_mention_window_parses_to_empty_vec() {
        // result_count 0 responses omit `data` entirely.
        let v = serde_json::json!({ "meta": { "result_count": 0 } });
        assert!(parse_mentions(&v).is_empty());
    }

    #[test]
    fn mentions_without_ids_are_dropped() {
        let v = serde_json::json!({
            "data": [ { "text": "no id" }, { "id": "1", "text": "ok" } ]
        });
        let mentions = parse_mentions(&v);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].id, MentionId("1".to_string()));
    }

    #[test]
    fn forbidden_maps_to_permission_error_with_hint() {
        let err = map_api_error(403, "{\"detail\":\"Forbidden\"}");
        match err {
            Error::Permission(msg) => {
                assert!(msg.contains("write permissions"));
                assert!(msg.contains("Forbidden"));
            }
            other => panic!("expected permission error, got {other:?}"),
        }
    }

    #[test]
    fn other_statuses_map_to_platform_errors() {
        assert!(matches!(map_api_error(429, ""), Error::Platform(_)));
        assert!(matches!(map_api_error(500, "oops"), Error::Platform(_)));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(5000);
        let Error::Platform(msg) = map_api_error(500, &body) else {
            panic!("expected platform error");
        };
        assert!(msg.len() < 300);
    }
}
