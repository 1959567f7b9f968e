/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (skip vs cooldown vs user-facing
/// message). `Permission` is kept distinct from `Platform` because rejected
/// writes usually mean the app lacks write scope, and manual actions want to
/// say so.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("external error: {0}")]
    External(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
