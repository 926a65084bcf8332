// config.rs
use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;

use crate::service::fair_use::{FairUsePolicy, PenaltyTarget};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub app_url: String,
    pub port: u16,
    pub log_level: LevelFilter,
    // Demo roster for the in-memory store
    pub seed_demo_data: bool,
    pub accrual_job_interval_secs: u64,
    // Referral programme policy
    pub max_referrals_per_month: usize,
    pub fair_use_rejection_block: i32,
    pub fair_use_penalty_target: PenaltyTarget,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let app_url = std::env::var("APP_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let log_level = env_or("LOG_LEVEL", LevelFilter::DEBUG);

        let seed_demo_data = env_or("SEED_DEMO_DATA", true);
        let accrual_job_interval_secs = env_or("ACCRUAL_JOB_INTERVAL_SECS", 86400u64);

        let max_referrals_per_month = env_or("MAX_REFERRALS_PER_MONTH", 5usize);
        let fair_use_rejection_block = env_or("FAIR_USE_REJECTION_BLOCK", 10i32).max(1);
        let fair_use_penalty_target = env_or("FAIR_USE_PENALTY_TARGET", PenaltyTarget::TotalBalance);

        Config {
            database_url,
            app_url,
            port: env_or("PORT", 8000u16),
            log_level,
            seed_demo_data,
            accrual_job_interval_secs,
            max_referrals_per_month,
            fair_use_rejection_block,
            fair_use_penalty_target,
        }
    }

    pub fn fair_use_policy(&self) -> FairUsePolicy {
        FairUsePolicy {
            rejection_block: self.fair_use_rejection_block,
            max_referrals_per_month: self.max_referrals_per_month,
            penalty_target: self.fair_use_penalty_target,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            app_url: "http://localhost:8000".to_string(),
            port: 8000,
            log_level: LevelFilter::DEBUG,
            seed_demo_data: true,
            accrual_job_interval_secs: 86400,
            max_referrals_per_month: 5,
            fair_use_rejection_block: 10,
            fair_use_penalty_target: PenaltyTarget::TotalBalance,
        }
    }
}
