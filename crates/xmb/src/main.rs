use std::sync::Arc;

use tracing::info;

use xmb_core::{
    bot::MentionBot,
    config::Config,
    dedup::DedupCache,
    ports::{CannedReplyModel, ReplyModel},
    processor::MentionProcessor,
    quota::QuotaTracker,
    reply::ReplyGenerator,
};
use xmb_openai::OpenAiReplyModel;
use xmb_twitter::TwitterClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    xmb_core::logging::init("xmb")?;

    let cfg = Config::load()?;

    let platform = Arc::new(TwitterClient::new(cfg.x_bearer_token.clone()));

    let model: Arc<dyn ReplyModel> = match &cfg.openai_api_key {
        Some(key) => Arc::new(OpenAiReplyModel::new(key.clone(), cfg.openai_model.clone())),
        None => {
            info!("no OPENAI_API_KEY set, augmented replies use the canned model");
            Arc::new(CannedReplyModel)
        }
    };

    let quota = Arc::new(QuotaTracker::new());
    let dedup = Arc::new(DedupCache::new());
    let processor = Arc::new(MentionProcessor::new(
        platform,
        ReplyGenerator::new(model),
        quota.clone(),
        dedup.clone(),
    ));

    let bot = MentionBot::new(processor, quota, dedup, cfg.bot.clone());

    if cfg.bot_autostart {
        let status = bot.enable().await;
        info!(
            poll_interval_secs = status.poll_interval_secs,
            max_mentions = status.max_mentions_per_cycle,
            "mention bot enabled at startup"
        );
    } else {
        info!("mention bot idle (set XMB_BOT_AUTOSTART=true to poll at startup)");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    bot.disable().await;

    Ok(())
}
