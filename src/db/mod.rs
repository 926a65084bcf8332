pub mod db;
pub mod ledgerdb;
pub mod memorydb;
pub mod nominationdb;
pub mod referraldb;
pub mod rewarddb;
pub mod seed;
pub mod userdb;

use std::fmt;

pub use db::DBClient;
pub use ledgerdb::LedgerExt;
pub use memorydb::MemoryDb;
pub use nominationdb::NominationExt;
pub use referraldb::ReferralExt;
pub use rewarddb::RewardExt;
pub use userdb::UserExt;

/// Everything the services need from storage. Implemented by the
/// Postgres-backed [`DBClient`] and the in-process [`MemoryDb`].
pub trait PortalStore:
    UserExt + ReferralExt + LedgerExt + RewardExt + NominationExt + Send + Sync + fmt::Debug
{
}

impl<T> PortalStore for T where
    T: UserExt + ReferralExt + LedgerExt + RewardExt + NominationExt + Send + Sync + fmt::Debug
{
}
