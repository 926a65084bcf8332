// service/nomination_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{NominationExt, PortalStore, UserExt},
    models::{
        nominationmodel::{Nomination, NominationStatus},
        transactionmodel::{Transaction, TransactionSource, TransactionType},
        usermodel::{User, UserRole},
    },
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NominationService {
    db_client: Arc<dyn PortalStore>,
}

impl NominationService {
    pub fn new(db_client: Arc<dyn PortalStore>) -> Self {
        Self { db_client }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    pub async fn list_nominations(
        &self,
        nominator_id: Option<Uuid>,
        status: Option<NominationStatus>,
    ) -> Result<Vec<Nomination>, ServiceError> {
        Ok(self.db_client.get_nominations(nominator_id, status).await?)
    }

    pub async fn nominate(
        &self,
        nominator_id: Uuid,
        employee_id: Uuid,
        points: i32,
        reason: String,
    ) -> Result<Nomination, ServiceError> {
        let nominator = self.require_user(nominator_id).await?;
        if nominator.role != UserRole::Manager {
            return Err(ServiceError::Forbidden(
                nominator_id,
                "nominate employees".to_string(),
            ));
        }

        if employee_id == nominator_id {
            return Err(ServiceError::Validation(
                "managers cannot nominate themselves".to_string(),
            ));
        }

        let employee = self.require_user(employee_id).await?;
        if employee.role != UserRole::Employee {
            return Err(ServiceError::Validation(format!(
                "{} is not an employee",
                employee.name
            )));
        }
        if employee.department != nominator.department {
            return Err(ServiceError::Validation(format!(
                "{} is not in the {} department",
                employee.name, nominator.department
            )));
        }

        if points < 1 {
            return Err(ServiceError::Validation(
                "nominations must carry at least 1 point".to_string(),
            ));
        }
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::Validation(
                "a reason is required".to_string(),
            ));
        }

        let nomination = Nomination {
            id: Uuid::new_v4(),
            nominator_id,
            employee_id,
            points,
            reason,
            date_submitted: Utc::now(),
            status: NominationStatus::Pending,
            approved_by: None,
            approved_date: None,
        };

        let saved = self.db_client.save_nomination(&nomination).await?;
        tracing::info!(
            "{} nominated {} for {} points",
            nominator.name,
            employee.name,
            points
        );
        Ok(saved)
    }

    /// Admin decision. Approval credits performance points in the same step.
    pub async fn decide(
        &self,
        admin_id: Uuid,
        nomination_id: Uuid,
        approve: bool,
    ) -> Result<Nomination, ServiceError> {
        let admin = self.require_user(admin_id).await?;
        if admin.role != UserRole::Admin {
            return Err(ServiceError::Forbidden(
                admin_id,
                "decide nominations".to_string(),
            ));
        }

        let mut nomination = self
            .db_client
            .get_nomination(nomination_id)
            .await?
            .ok_or(ServiceError::NominationNotFound(nomination_id))?;

        if nomination.status != NominationStatus::Pending {
            return Err(ServiceError::NominationAlreadyDecided(
                nomination_id,
                nomination.status,
            ));
        }

        nomination.status = if approve {
            NominationStatus::Approved
        } else {
            NominationStatus::Rejected
        };
        nomination.approved_by = Some(admin.name.clone());
        nomination.approved_date = Some(Utc::now());

        let credit = approve.then(|| {
            let mut credit = Transaction::approved(
                nomination.employee_id,
                TransactionType::Performance,
                nomination.points,
                format!("Manager nomination: {}", nomination.reason),
                TransactionSource::Nomination,
            );
            credit.approved_by = Some(admin.name.clone());
            credit
        });

        let decided = self
            .db_client
            .decide_nomination(&nomination, credit.as_ref())
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(nomination_id))?;

        tracing::info!(
            "Nomination {} {:?} by {}",
            nomination_id,
            decided.status,
            admin.name
        );
        Ok(decided)
    }
}
