// service/background_jobs.rs
use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::AppState;

/// Periodically refreshes hired referrals' tenure and credits any newly
/// crossed milestones.
pub async fn start_accrual_job(app_state: Arc<AppState>) {
    let period = app_state.env.accrual_job_interval_secs.max(1);
    let mut interval = interval(Duration::from_secs(period));

    tracing::info!("⏱️  Referral accrual job running every {}s", period);

    loop {
        interval.tick().await;

        match app_state.referral_service.accrue_all().await {
            Ok(summary) => {
                if summary.points_credited > 0 || summary.failures > 0 {
                    tracing::info!(
                        "Accrual run: {} checked, {} credited ({} points), {} failed",
                        summary.referrals_checked,
                        summary.referrals_credited,
                        summary.points_credited,
                        summary.failures
                    );
                } else {
                    tracing::debug!(
                        "Accrual run: {} hired referrals checked, nothing owed",
                        summary.referrals_checked
                    );
                }
            }
            Err(e) => {
                tracing::error!("Accrual run failed: {}", e);
            }
        }
    }
}
