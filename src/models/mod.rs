pub mod nominationmodel;
pub mod referralmodel;
pub mod rewardmodel;
pub mod status;
pub mod transactionmodel;
pub mod usermodel;
