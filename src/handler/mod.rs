pub mod admin;
pub mod nominations;
pub mod points;
pub mod redemptions;
pub mod referrals;
pub mod rewards;
pub mod users;
