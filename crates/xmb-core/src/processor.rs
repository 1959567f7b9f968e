//! One polling cycle: fetch mentions, filter, reply, record.
//!
//! All cycles (periodic and manual) serialize on an internal gate so two
//! cycles can never race on the dedup cache. Per-mention submission failures
//! are logged and skipped; only a failed fetch surfaces as a cycle error,
//! which the scheduler answers with its cooldown policy.

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::{
    config::BotConfig,
    dedup::DedupCache,
    domain::{AccountId, AccountIdentity},
    ports::PlatformClient,
    quota::QuotaTracker,
    reply::ReplyGenerator,
    Error, Result,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const POST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REPLY_PAUSE: Duration = Duration::from_secs(2);

/// Outcome of one cycle, for logs and the control plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub attempted: u32,
    pub succeeded: u32,
}

pub struct MentionProcessor {
    platform: Arc<dyn PlatformClient>,
    generator: ReplyGenerator,
    quota: Arc<QuotaTracker>,
    dedup: Arc<DedupCache>,
    identity: Mutex<Option<AccountIdentity>>,
    cycle_gate: Mutex<()>,
    reply_pause: Duration,
}

impl MentionProcessor {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        generator: ReplyGenerator,
        quota: Arc<QuotaTracker>,
        dedup: Arc<DedupCache>,
    ) -> Self {
        Self {
            platform,
            generator,
            quota,
            dedup,
            identity: Mutex::new(None),
            cycle_gate: Mutex::new(()),
            reply_pause: DEFAULT_REPLY_PAUSE,
        }
    }

    /// Override the pause inserted between successive successful replies.
    pub fn with_reply_pause(mut self, pause: Duration) -> Self {
        self.reply_pause = pause;
        self
    }

    /// Run one full cycle under the cycle gate.
    pub async fn run_cycle(&self, cfg: &BotConfig) -> Result<CycleSummary> {
        let _gate = self.cycle_gate.lock().await;

        let account_id = self.self_account().await?;

        self.quota.record_read().await;
        let mentions = timeout(
            FETCH_TIMEOUT,
            self.platform
                .get_mentions(&account_id, cfg.max_mentions_per_cycle),
        )
        .await
        .map_err(|_| Error::Platform("mention fetch timed out".to_string()))??;

        if mentions.is_empty() {
            debug!("no new mentions this cycle");
            return Ok(CycleSummary::default());
        }

        let mut summary = CycleSummary::default();
        let total = mentions.len();
        for (idx, mention) in mentions.into_iter().enumerate() {
            if cfg.suppress_duplicates && self.dedup.is_processed(&mention.id).await {
                debug!(mention = %mention.id, "skipping already-processed mention");
                continue;
            }

            summary.attempted += 1;
            let text = self.generator.generate(cfg, &mention).await;

            match timeout(POST_TIMEOUT, self.platform.post_reply(&text, &mention.id)).await {
                Ok(Ok(receipt)) => {
                    info!(mention = %mention.id, reply = %receipt.id, "replied to mention");
                    self.dedup.mark_processed(mention.id).await;
                    self.quota.record_post().await;
                    summary.succeeded += 1;

                    // Pace outbound writes against platform rate limits.
                    if idx + 1 < total && !self.reply_pause.is_zero() {
                        sleep(self.reply_pause).await;
                    }
                }
                Ok(Err(e)) => {
                    warn!(mention = %mention.id, error = %e, "failed to submit reply, continuing");
                }
                Err(_) => {
                    warn!(mention = %mention.id, "reply submission timed out, continuing");
                }
            }
        }

        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            "mention cycle complete"
        );
        Ok(summary)
    }

    /// Cached bot account id; resolved via `get_self` on first use.
    async fn self_account(&self) -> Result<AccountId> {
        let mut identity = self.identity.lock().await;
        if let Some(me) = identity.as_ref() {
            return Ok(me.id.clone());
        }

        self.quota.record_read().await;
        let me = timeout(FETCH_TIMEOUT, self.platform.get_self())
            .await
            .map_err(|_| Error::Platform("identity lookup timed out".to_string()))??;
        info!(account = %me.username, id = %me.id, "resolved bot account identity");

        let id = me.id.clone();
        *identity = Some(me);
        Ok(id)
    }
}
