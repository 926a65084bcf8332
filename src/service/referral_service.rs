// service/referral_service.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{LedgerExt, PortalStore, ReferralExt, UserExt},
    models::{
        referralmodel::{Referral, ReferralStats, ReferralStatus},
        transactionmodel::{Transaction, TransactionSource, TransactionType},
        usermodel::User,
    },
    service::{
        accrual::{calculate_accrual, AccrualOutcome, MAX_TRACKED_MONTHS},
        error::ServiceError,
        fair_use::FairUsePolicy,
        reference::{generate_reference_number, PENALTY_PREFIX, REFERRAL_PREFIX},
    },
};

/// Candidate details supplied by the referrer.
#[derive(Debug, Clone)]
pub struct NewReferral {
    pub referrer_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: String,
    pub position: String,
    pub relationship: String,
    pub years_known: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccrualReceipt {
    pub referral: Referral,
    pub credited: i32,
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchAccrualSummary {
    pub referrals_checked: usize,
    pub referrals_credited: usize,
    pub points_credited: i32,
    pub failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PenaltyReceipt {
    pub referrer_id: Uuid,
    pub rejected_referrals: i64,
    pub penalty_owed: i32,
    pub deducted_now: i32,
    pub transaction: Option<Transaction>,
}

/// Whole calendar months between `start` and `end`, never negative. A month
/// completes at the same day and time of day as `start`.
pub fn completed_months(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    if end <= start {
        return 0;
    }
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if (end.day(), end.time()) < (start.day(), start.time()) {
        months -= 1;
    }
    months.clamp(0, MAX_TRACKED_MONTHS)
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(Debug, Clone)]
pub struct ReferralService {
    db_client: Arc<dyn PortalStore>,
    policy: FairUsePolicy,
}

impl ReferralService {
    pub fn new(db_client: Arc<dyn PortalStore>, policy: FairUsePolicy) -> Self {
        Self { db_client, policy }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    pub async fn get_referral(&self, referral_id: Uuid) -> Result<Referral, ServiceError> {
        self.db_client
            .get_referral(referral_id)
            .await?
            .ok_or(ServiceError::ReferralNotFound(referral_id))
    }

    pub async fn list_referrals(
        &self,
        referrer_id: Option<Uuid>,
        status: Option<ReferralStatus>,
    ) -> Result<Vec<Referral>, ServiceError> {
        Ok(self.db_client.get_referrals(referrer_id, status).await?)
    }

    pub async fn submit_referral(&self, new_referral: NewReferral) -> Result<Referral, ServiceError> {
        self.require_user(new_referral.referrer_id).await?;

        let now = Utc::now();
        let referral = Referral {
            id: Uuid::new_v4(),
            referrer_id: new_referral.referrer_id,
            candidate_name: new_referral.candidate_name.trim().to_string(),
            candidate_email: new_referral.candidate_email.trim().to_lowercase(),
            candidate_phone: new_referral.candidate_phone.trim().to_string(),
            position: new_referral.position,
            relationship: new_referral.relationship,
            years_known: new_referral.years_known,
            date_submitted: now,
            status: ReferralStatus::Applied,
            points_earned: 0,
            months_completed: 0,
            hired_at: None,
        };

        let saved = self
            .db_client
            .insert_referral_within_cap(
                &referral,
                start_of_month(now),
                self.policy.max_referrals_per_month as i64,
            )
            .await?
            .ok_or_else(|| {
                tracing::warn!("Referrer {} hit the monthly cap", referral.referrer_id);
                ServiceError::ReferralLimitReached {
                    limit: self.policy.max_referrals_per_month,
                }
            })?;
        tracing::info!(
            "Referral {} submitted by {} for {}",
            saved.id,
            saved.referrer_id,
            saved.position
        );
        Ok(saved)
    }

    pub async fn update_status(
        &self,
        referral_id: Uuid,
        next: ReferralStatus,
    ) -> Result<Referral, ServiceError> {
        let referral = self.get_referral(referral_id).await?;

        if !referral.status.can_transition_to(next) {
            return Err(ServiceError::InvalidReferralTransition(
                referral_id,
                referral.status,
                next,
            ));
        }

        let hired_at = (next == ReferralStatus::Hired).then(Utc::now);

        let saved = self
            .db_client
            .transition_referral(referral_id, referral.status, next, hired_at)
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(referral_id))?;
        tracing::info!("Referral {} moved to {}", referral_id, next);
        Ok(saved)
    }

    /// Records elapsed months for a hired referral. Tenure only moves forward.
    pub async fn record_tenure(
        &self,
        referral_id: Uuid,
        months_completed: i32,
    ) -> Result<Referral, ServiceError> {
        let referral = self.get_referral(referral_id).await?;

        if referral.status != ReferralStatus::Hired {
            return Err(ServiceError::Validation(format!(
                "referral {} is {}, tenure is only tracked for hired referrals",
                referral_id, referral.status
            )));
        }
        if !(0..=MAX_TRACKED_MONTHS).contains(&months_completed) {
            return Err(ServiceError::Validation(format!(
                "months completed must be between 0 and {}",
                MAX_TRACKED_MONTHS
            )));
        }
        if months_completed < referral.months_completed {
            return Err(ServiceError::Validation(format!(
                "months completed cannot go back from {} to {}",
                referral.months_completed, months_completed
            )));
        }

        self.db_client
            .record_referral_tenure(referral_id, months_completed)
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(referral_id))
    }

    pub fn preview(&self, referral: &Referral) -> Result<AccrualOutcome, ServiceError> {
        Ok(calculate_accrual(
            referral.status,
            referral.months_completed,
            referral.points_earned,
        )?)
    }

    /// Credits whatever the milestone schedule owes. Safe to call repeatedly.
    pub async fn accrue(&self, referral_id: Uuid) -> Result<AccrualReceipt, ServiceError> {
        let referral = self.get_referral(referral_id).await?;
        let outcome = self.preview(&referral)?;

        if outcome.is_overpaid() {
            tracing::warn!(
                "Referral {} has {} points paid but only {} scheduled",
                referral.id,
                referral.points_earned,
                outcome.scheduled_points
            );
        }

        if outcome.payable_delta == 0 {
            return Ok(AccrualReceipt {
                referral,
                credited: 0,
                transaction: None,
            });
        }

        let milestones = outcome
            .payable_milestones
            .iter()
            .map(|m| format!("{} months", m.threshold_months))
            .collect::<Vec<_>>()
            .join(", ");

        let mut credit = Transaction::approved(
            referral.referrer_id,
            TransactionType::Referral,
            outcome.payable_delta,
            format!(
                "Referral bonus - {} hired ({})",
                referral.candidate_name, milestones
            ),
            TransactionSource::ReferralMilestone,
        );
        credit.referral_id = Some(referral.id);
        credit.reference_number = Some(generate_reference_number(REFERRAL_PREFIX));

        let updated = self
            .db_client
            .credit_referral_points(referral.id, referral.points_earned, &credit)
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(referral.id))?;

        tracing::info!(
            "Credited {} points to {} for referral {}",
            outcome.payable_delta,
            referral.referrer_id,
            referral.id
        );

        Ok(AccrualReceipt {
            referral: updated,
            credited: outcome.payable_delta,
            transaction: Some(credit),
        })
    }

    /// Refreshes tenure from the hire date and credits every hired referral.
    pub async fn accrue_all(&self) -> Result<BatchAccrualSummary, ServiceError> {
        let hired = self
            .db_client
            .get_referrals(None, Some(ReferralStatus::Hired))
            .await?;

        let now = Utc::now();
        let mut summary = BatchAccrualSummary::default();

        for referral in hired {
            summary.referrals_checked += 1;

            if let Some(hired_at) = referral.hired_at {
                let elapsed = completed_months(hired_at, now);
                if elapsed > referral.months_completed {
                    if let Err(e) = self.record_tenure(referral.id, elapsed).await {
                        tracing::error!("Failed to refresh tenure for {}: {}", referral.id, e);
                        summary.failures += 1;
                        continue;
                    }
                }
            }

            match self.accrue(referral.id).await {
                Ok(receipt) if receipt.credited > 0 => {
                    summary.referrals_credited += 1;
                    summary.points_credited += receipt.credited;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Accrual failed for referral {}: {}", referral.id, e);
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }

    pub async fn referrer_stats(&self, referrer_id: Uuid) -> Result<ReferralStats, ServiceError> {
        self.require_user(referrer_id).await?;
        let referrals = self.db_client.get_referrals(Some(referrer_id), None).await?;
        Ok(ReferralStats::from_referrals(&referrals))
    }

    /// Deducts whatever fair-use penalty is still outstanding for a referrer.
    pub async fn apply_fair_use_penalty(
        &self,
        referrer_id: Uuid,
    ) -> Result<PenaltyReceipt, ServiceError> {
        self.require_user(referrer_id).await?;

        let rejected = self
            .db_client
            .get_referrals(Some(referrer_id), Some(ReferralStatus::Rejected))
            .await?
            .len() as i64;

        let already_applied: i32 = self
            .db_client
            .get_transactions(Some(referrer_id))
            .await?
            .iter()
            .filter(|t| t.source == TransactionSource::FairUsePenalty && t.counts())
            .map(|t| -t.amount)
            .sum();

        let owed = self.policy.penalty_owed(rejected);
        let outstanding = self.policy.outstanding_penalty(rejected, already_applied);

        if outstanding == 0 {
            return Ok(PenaltyReceipt {
                referrer_id,
                rejected_referrals: rejected,
                penalty_owed: owed,
                deducted_now: 0,
                transaction: None,
            });
        }

        let mut deduction = Transaction::approved(
            referrer_id,
            self.policy.penalty_target.ledger_type(),
            -outstanding,
            format!("Fair-use penalty - {} rejected referrals", rejected),
            TransactionSource::FairUsePenalty,
        );
        deduction.reference_number = Some(generate_reference_number(PENALTY_PREFIX));

        let deduction = self
            .db_client
            .insert_penalty(&deduction, already_applied)
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(referrer_id))?;
        tracing::warn!(
            "Fair-use penalty of {} points applied to {} ({} rejected, target {})",
            outstanding,
            referrer_id,
            rejected,
            self.policy.penalty_target
        );

        Ok(PenaltyReceipt {
            referrer_id,
            rejected_referrals: rejected,
            penalty_owed: owed,
            deducted_now: outstanding,
            transaction: Some(deduction),
        })
    }
}
