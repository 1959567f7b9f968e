//! Bot lifecycle and control plane.
//!
//! `MentionBot` owns the shared configuration, the polling worker, and the
//! control-plane operations (enable/disable/configure/manual trigger). The
//! worker is a single spawned task driven by a `CancellationToken`; disable
//! is cooperative and never interrupts an in-flight cycle.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    config::BotConfig,
    dedup::DedupCache,
    processor::MentionProcessor,
    quota::{QuotaTracker, UsageSnapshot},
    Error, Result,
};

/// Back-off after a failed cycle, so a broken upstream is not hammered at
/// the normal poll cadence.
const CYCLE_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Serialize)]
pub struct BotStatus {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub max_mentions_per_cycle: u32,
    pub reply_prefix: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TriggerAck {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AugmentedSettings {
    pub use_augmented_reply: bool,
    pub system_prompt: String,
}

#[derive(Clone)]
pub struct MentionBot {
    inner: Arc<BotInner>,
}

struct BotInner {
    config: Mutex<BotConfig>,
    processor: Arc<MentionProcessor>,
    quota: Arc<QuotaTracker>,
    dedup: Arc<DedupCache>,
    worker: Mutex<Option<WorkerHandle>>,
    cooldown: Duration,
}

struct WorkerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl MentionBot {
    pub fn new(
        processor: Arc<MentionProcessor>,
        quota: Arc<QuotaTracker>,
        dedup: Arc<DedupCache>,
        config: BotConfig,
    ) -> Self {
        Self {
            inner: Arc::new(BotInner {
                config: Mutex::new(config),
                processor,
                quota,
                dedup,
                worker: Mutex::new(None),
                cooldown: CYCLE_COOLDOWN,
            }),
        }
    }

    /// Override the post-failure cooldown. Only effective before the bot is
    /// cloned or enabled.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.cooldown = cooldown;
        }
        self
    }

    /// Turn the bot on, starting the polling worker if none is active.
    /// Idempotent.
    pub async fn enable(&self) -> BotStatus {
        {
            let mut cfg = self.inner.config.lock().await;
            cfg.enabled = true;
        }

        let mut worker = self.inner.worker.lock().await;
        let active = worker
            .as_ref()
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false);
        if active {
            debug!("enable called while worker already running");
        } else {
            let cancel = CancellationToken::new();
            let bot = self.clone();
            let token = cancel.clone();
            let handle = tokio::spawn(async move { bot.worker_loop(token).await });
            *worker = Some(WorkerHandle { cancel, handle });
            info!("mention polling worker started");
        }
        drop(worker);

        self.status().await
    }

    /// Turn the bot off. The worker observes the stop signal at the end of
    /// its sleep or before its next cycle; an in-flight cycle completes.
    pub async fn disable(&self) -> BotStatus {
        {
            let mut cfg = self.inner.config.lock().await;
            cfg.enabled = false;
        }

        let mut worker = self.inner.worker.lock().await;
        if let Some(w) = worker.take() {
            w.cancel.cancel();
            info!("mention polling worker stopping");
        }
        drop(worker);

        self.status().await
    }

    /// Run one cycle out-of-band, dispatched asynchronously. Requires the
    /// bot to be enabled; the periodic worker is unaffected.
    pub async fn trigger_once(&self) -> TriggerAck {
        let cfg = self.inner.config.lock().await.clone();
        if !cfg.enabled {
            return TriggerAck {
                message: "bot is disabled; enable it before triggering a cycle".to_string(),
            };
        }

        let bot = self.clone();
        tokio::spawn(async move {
            match bot.inner.processor.run_cycle(&cfg).await {
                Ok(summary) => info!(
                    attempted = summary.attempted,
                    succeeded = summary.succeeded,
                    "manual mention cycle complete"
                ),
                Err(Error::Permission(msg)) => error!(
                    %msg,
                    "manual mention cycle rejected; check the app's write permissions"
                ),
                Err(e) => error!(error = %e, "manual mention cycle failed"),
            }
        });

        TriggerAck {
            message: "mention cycle triggered".to_string(),
        }
    }

    /// Replace the configuration wholesale. Never starts or stops the
    /// worker; invalid configs are rejected with the prior state retained.
    pub async fn configure(&self, new: BotConfig) -> Result<BotConfig> {
        new.validate()?;
        let mut cfg = self.inner.config.lock().await;
        *cfg = new;
        info!(
            poll_interval_secs = cfg.poll_interval.as_secs(),
            max_mentions = cfg.max_mentions_per_cycle,
            "bot reconfigured"
        );
        Ok(cfg.clone())
    }

    pub async fn configure_augmented_reply(
        &self,
        use_augmented: bool,
        system_prompt: Option<String>,
    ) -> AugmentedSettings {
        let mut cfg = self.inner.config.lock().await;
        cfg.use_augmented_reply = use_augmented;
        if let Some(prompt) = system_prompt {
            cfg.system_prompt = prompt;
        }
        AugmentedSettings {
            use_augmented_reply: cfg.use_augmented_reply,
            system_prompt: cfg.system_prompt.clone(),
        }
    }

    pub async fn status(&self) -> BotStatus {
        let cfg = self.inner.config.lock().await;
        BotStatus {
            enabled: cfg.enabled,
            poll_interval_secs: cfg.poll_interval.as_secs(),
            max_mentions_per_cycle: cfg.max_mentions_per_cycle,
            reply_prefix: cfg.reply_prefix.clone(),
        }
    }

    pub async fn usage(&self) -> UsageSnapshot {
        self.inner.quota.snapshot().await
    }

    pub async fn clear_dedup_cache(&self) -> usize {
        let removed = self.inner.dedup.clear().await;
        info!(removed, "cleared processed-mention cache");
        removed
    }

    async fn worker_loop(self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let cfg = self.inner.config.lock().await.clone();
            let mut delay = cfg.poll_interval;

            if cfg.enabled {
                match self.inner.processor.run_cycle(&cfg).await {
                    Ok(summary) => debug!(
                        attempted = summary.attempted,
                        succeeded = summary.succeeded,
                        "scheduled mention cycle complete"
                    ),
                    Err(e) => {
                        error!(
                            error = %e,
                            cooldown_secs = self.inner.cooldown.as_secs(),
                            "polling cycle failed, backing off"
                        );
                        delay = self.inner.cooldown;
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }
        info!("mention polling worker stopped");
    }
}
