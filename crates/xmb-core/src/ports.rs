use async_trait::async_trait;

use crate::{
    domain::{AccountId, AccountIdentity, Mention, MentionId, PostReceipt},
    Result,
};

/// Hexagonal port for the social platform.
///
/// X is the first implementation; the shape is deliberately small so a future
/// adapter (Mastodon, Bluesky) can fit behind the same interface.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Identity of the authenticated account.
    async fn get_self(&self) -> Result<AccountIdentity>;

    /// Up to `limit` most recent mentions of `account_id`, newest first.
    async fn get_mentions(&self, account_id: &AccountId, limit: u32) -> Result<Vec<Mention>>;

    /// Submit `text` as a threaded reply to `in_reply_to`.
    async fn post_reply(&self, text: &str, in_reply_to: &MentionId) -> Result<PostReceipt>;
}

/// Hexagonal port for augmented reply generation.
#[async_trait]
pub trait ReplyModel: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}

/// Deterministic [`ReplyModel`] used when no real backend is configured.
///
/// Always succeeds with a fixed candidate, so the augmented path stays
/// exercisable (and testable) without network access.
#[derive(Clone, Debug, Default)]
pub struct CannedReplyModel;

#[async_trait]
impl ReplyModel for CannedReplyModel {
    async fn generate(&self, _system_prompt: &str, user_text: &str) -> Result<String> {
        let mut snippet = user_text.trim().to_string();
        if snippet.chars().count() > 80 {
            snippet = snippet.chars().take(80).collect();
        }
        Ok(format!("Thanks for reaching out! I hear you on: {snippet}"))
    }
}
