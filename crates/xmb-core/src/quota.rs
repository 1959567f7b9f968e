//! Monthly API usage tracking against the free-tier ceilings.
//!
//! The ceilings are advisory: crossing one logs a warning but never rejects
//! the call. Counters reset on the first calendar-month boundary observed
//! after `period_start`, checked under the same lock as every increment so
//! the reset happens exactly once per boundary.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Free tier: 100 reads per month.
pub const READ_CEILING: u64 = 100;
/// Free tier: 500 posts per month, at app and user level independently.
pub const POST_CEILING: u64 = 500;

#[derive(Clone, Debug)]
struct UsageCounters {
    reads_this_month: u64,
    posts_this_month_app: u64,
    posts_this_month_user: u64,
    period_start: NaiveDate,
}

/// Point-in-time view of the counters with derived remaining quotas.
#[derive(Clone, Debug, Serialize)]
pub struct UsageSnapshot {
    pub reads_this_month: u64,
    pub posts_this_month_app: u64,
    pub posts_this_month_user: u64,
    pub reads_remaining: u64,
    pub posts_remaining_app: u64,
    pub posts_remaining_user: u64,
    pub period_start: String,
}

pub struct QuotaTracker {
    counters: Mutex<UsageCounters>,
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::starting_at(month_start(Local::now().date_naive()))
    }

    fn starting_at(period_start: NaiveDate) -> Self {
        Self {
            counters: Mutex::new(UsageCounters {
                reads_this_month: 0,
                posts_this_month_app: 0,
                posts_this_month_user: 0,
                period_start,
            }),
        }
    }

    /// Count one read against the monthly quota.
    pub async fn record_read(&self) {
        let mut c = self.counters.lock().await;
        roll_over_if_needed(&mut c);
        c.reads_this_month += 1;
        if c.reads_this_month > READ_CEILING {
            warn!(
                reads = c.reads_this_month,
                "free tier read limit exceeded: {READ_CEILING} reads per month"
            );
        }
    }

    /// Count one post against both the app-level and user-level quotas.
    pub async fn record_post(&self) {
        let mut c = self.counters.lock().await;
        roll_over_if_needed(&mut c);
        c.posts_this_month_app += 1;
        c.posts_this_month_user += 1;
        if c.posts_this_month_app > POST_CEILING {
            warn!(
                posts = c.posts_this_month_app,
                "free tier app post limit exceeded: {POST_CEILING} posts per month"
            );
        }
        if c.posts_this_month_user > POST_CEILING {
            warn!(
                posts = c.posts_this_month_user,
                "free tier user post limit exceeded: {POST_CEILING} posts per month"
            );
        }
    }

    pub async fn snapshot(&self) -> UsageSnapshot {
        let mut c = self.counters.lock().await;
        roll_over_if_needed(&mut c);
        UsageSnapshot {
            reads_this_month: c.reads_this_month,
            posts_this_month_app: c.posts_this_month_app,
            posts_this_month_user: c.posts_this_month_user,
            reads_remaining: READ_CEILING.saturating_sub(c.reads_this_month),
            posts_remaining_app: POST_CEILING.saturating_sub(c.posts_this_month_app),
            posts_remaining_user: POST_CEILING.saturating_sub(c.posts_this_month_user),
            period_start: c.period_start.to_string(),
        }
    }
}

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

fn roll_over_if_needed(c: &mut UsageCounters) {
    let current = month_start(Local::now().date_naive());
    if current > c.period_start {
        info!(
            from = %c.period_start,
            to = %current,
            "resetting monthly usage counters"
        );
        c.reads_this_month = 0;
        c.posts_this_month_app = 0;
        c.posts_this_month_user = 0;
        c.period_start = current;
    }
}
