pub mod accrual;
pub mod audit_service;
pub mod background_jobs;
pub mod dashboard;
pub mod error;
pub mod fair_use;
pub mod ledger;
pub mod nomination_service;
pub mod points_service;
pub mod reference;
pub mod referral_service;
pub mod reward_service;
