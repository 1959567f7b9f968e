//! Reply text generation.
//!
//! Two strategies behind one infallible entry point: a deterministic template
//! and an augmented path backed by a [`ReplyModel`]. Failures on the
//! augmented path degrade to a fixed fallback so a bad model call can never
//! abort a polling cycle. Post-processing (prefix + length cap) is applied
//! uniformly regardless of strategy.

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::warn;

use crate::{config::BotConfig, domain::Mention, ports::ReplyModel};

const GENERATE_TIMEOUT: Duration = Duration::from_secs(15);
const ELLIPSIS: &str = "...";

/// Sent when the augmented backend fails or times out.
pub const FALLBACK_REPLY: &str =
    "Thanks for the mention! I couldn't come up with a proper reply just now.";

/// Deterministic template reply, no external calls.
pub fn simple_reply(text: &str) -> String {
    format!("Thanks for the mention! You said: \"{}\"", text.trim())
}

pub struct ReplyGenerator {
    model: Arc<dyn ReplyModel>,
}

impl ReplyGenerator {
    pub fn new(model: Arc<dyn ReplyModel>) -> Self {
        Self { model }
    }

    /// Produce the final reply text for `mention`. Never fails.
    pub async fn generate(&self, cfg: &BotConfig, mention: &Mention) -> String {
        let body = if cfg.use_augmented_reply {
            self.augmented_reply(cfg, mention).await
        } else {
            simple_reply(&mention.text)
        };

        post_process(&body, cfg.reply_prefix.as_deref(), cfg.max_reply_length)
    }

    async fn augmented_reply(&self, cfg: &BotConfig, mention: &Mention) -> String {
        match timeout(
            GENERATE_TIMEOUT,
            self.model.generate(&cfg.system_prompt, &mention.text),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!(mention = %mention.id, "model returned empty reply, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Ok(Err(e)) => {
                warn!(mention = %mention.id, error = %e, "augmented reply failed, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(_) => {
                warn!(mention = %mention.id, "augmented reply timed out, using fallback");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

/// Prepend the configured prefix (single-space separated) and cap the result
/// at `max_len` characters, ellipsizing when over.
pub fn post_process(text: &str, prefix: Option<&str>, max_len: usize) -> String {
    let full = match prefix {
        Some(p) if !p.trim().is_empty() => format!("{} {}", p.trim(), text),
        _ => text.to_string(),
    };
    truncate_with_ellipsis(&full, max_len)
}

fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_len).collect();
    }
    let mut out: String = s.chars().take(max_len - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::{
        domain::{AccountId, MentionId},
        Error, Result,
    };

    struct FailingModel;

    #[async_trait]
    impl ReplyModel for FailingModel {
        async fn generate(&self, _system_prompt: &str, _user_text: &str) -> Result<String> {
            Err(Error::External("backend down".to_string()))
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ReplyModel for EchoModel {
        async fn generate(&self, _system_prompt: &str, user_text: &str) -> Result<String> {
            Ok(format!("echo: {user_text}"))
        }
    }

    fn mention(text: &str) -> Mention {
        Mention {
            id: MentionId("m1".to_string()),
            author_id: AccountId("u1".to_string()),
            text: text.to_string(),
        }
    }

    #[test]
    fn simple_reply_is_a_pure_template() {
        assert_eq!(
            simple_reply("  hi bot  "),
            "Thanks for the mention! You said: \"hi bot\""
        );
        assert_eq!(simple_reply("hi bot"), simple_reply("hi bot"));
    }

    #[test]
    fn post_process_prepends_prefix_with_single_space() {
        assert_eq!(post_process("hello", Some("[bot]"), 280), "[bot] hello");
        assert_eq!(post_process("hello", None, 280), "hello");
        assert_eq!(post_process("hello", Some("  "), 280), "hello");
    }

    #[test]
    fn post_process_never_exceeds_max_length() {
        for max in [1usize, 3, 4, 10, 20, 280] {
            let out = post_process(&"x".repeat(400), Some("prefix"), max);
            assert!(out.chars().count() <= max, "max={max} len={}", out.chars().count());
        }
    }

    #[test]
    fn truncation_ends_with_ellipsis_at_exact_length() {
        let out = post_process(&"a".repeat(300), None, 20);
        assert_eq!(out.chars().count(), 20);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn oversized_prefix_alone_is_truncated_to_exact_length() {
        let prefix = "this prefix alone is far longer than twenty characters";
        let out = post_process("hi", Some(prefix), 20);
        assert_eq!(out.chars().count(), 20);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn short_text_is_untouched() {
        let out = post_process("short", None, 280);
        assert_eq!(out, "short");
    }

    #[tokio::test]
    async fn augmented_failure_degrades_to_fallback() {
        let gen = ReplyGenerator::new(Arc::new(FailingModel));
        let cfg = BotConfig {
            use_augmented_reply: true,
            ..BotConfig::default()
        };

        let out = gen.generate(&cfg, &mention("hello")).await;
        assert_eq!(out, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn augmented_success_goes_through_post_processing() {
        let gen = ReplyGenerator::new(Arc::new(EchoModel));
        let cfg = BotConfig {
            use_augmented_reply: true,
            reply_prefix: Some("[bot]".to_string()),
            ..BotConfig::default()
        };

        let out = gen.generate(&cfg, &mention("hello")).await;
        assert_eq!(out, "[bot] echo: hello");
    }

    #[tokio::test]
    async fn simple_strategy_ignores_the_model() {
        let gen = ReplyGenerator::new(Arc::new(FailingModel));
        let cfg = BotConfig::default();

        let out = gen.generate(&cfg, &mention("hello")).await;
        assert_eq!(out, simple_reply("hello"));
    }
}
