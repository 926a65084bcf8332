use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::{
        nominationmodel::NominationStatus, referralmodel::ReferralStatus,
        rewardmodel::RedemptionStatus,
    },
    service::accrual::AccrualError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Referral {0} not found")]
    ReferralNotFound(Uuid),

    #[error("Reward {0} not found")]
    RewardNotFound(Uuid),

    #[error("Redemption {0} not found")]
    RedemptionNotFound(Uuid),

    #[error("Nomination {0} not found")]
    NominationNotFound(Uuid),

    #[error("Transaction {0} not found")]
    TransactionNotFound(Uuid),

    #[error("Referral {0} cannot move from {1} to {2}")]
    InvalidReferralTransition(Uuid, ReferralStatus, ReferralStatus),

    #[error("Redemption {0} cannot move from {1:?} to {2:?}")]
    InvalidRedemptionTransition(Uuid, RedemptionStatus, RedemptionStatus),

    #[error("Nomination {0} is already {1:?}")]
    NominationAlreadyDecided(Uuid, NominationStatus),

    #[error("Referral limit reached: at most {limit} referrals per month")]
    ReferralLimitReached { limit: usize },

    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i32, available: i32 },

    #[error("User {0} is not allowed to {1}")]
    Forbidden(Uuid, String),

    #[error("Record {0} was updated concurrently, retry the request")]
    ConcurrentUpdate(Uuid),

    #[error(transparent)]
    Accrual(#[from] AccrualError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UserNotFound(_)
            | ServiceError::ReferralNotFound(_)
            | ServiceError::RewardNotFound(_)
            | ServiceError::RedemptionNotFound(_)
            | ServiceError::NominationNotFound(_)
            | ServiceError::TransactionNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidReferralTransition(_, _, _)
            | ServiceError::InvalidRedemptionTransition(_, _, _)
            | ServiceError::NominationAlreadyDecided(_, _)
            | ServiceError::Accrual(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::ReferralLimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,

            ServiceError::InsufficientPoints { .. } => StatusCode::PAYMENT_REQUIRED,

            ServiceError::Forbidden(_, _) => StatusCode::FORBIDDEN,

            ServiceError::ConcurrentUpdate(_) => StatusCode::CONFLICT,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Database(ref e) => {
                tracing::error!("database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            ServiceError::Forbidden(user_id, ref action) => {
                tracing::warn!("user {} attempted to {}", user_id, action);
                HttpError::forbidden(ErrorMessage::PermissionDenied.to_string())
            }
            other => HttpError::new(other.to_string(), other.status_code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let id = Uuid::nil();
        assert_eq!(ServiceError::ReferralNotFound(id).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::InvalidReferralTransition(id, ReferralStatus::Hired, ReferralStatus::Applied)
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InsufficientPoints { required: 8, available: 3 }.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ServiceError::ReferralLimitReached { limit: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ServiceError::Accrual(AccrualError::InvalidInput("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_into_http_error_keeps_message() {
        let error: HttpError = ServiceError::InsufficientPoints { required: 8, available: 3 }.into();
        assert_eq!(error.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(error.message, "Insufficient points: required 8, available 3");
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let error: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, ErrorMessage::ServerError.to_string());

        let error: HttpError = ServiceError::Forbidden(Uuid::nil(), "award points".into()).into();
        assert_eq!(error.status, StatusCode::FORBIDDEN);
    }
}
