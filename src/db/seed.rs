//! Demo roster, catalogue and history for the in-memory store.
//!
//! Users get fixed ids (`...0001` to `...0005`) so a fresh instance can be
//! explored without looking anything up first.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use super::{LedgerExt, NominationExt, PortalStore, ReferralExt, RewardExt, UserExt};
use crate::models::{
    nominationmodel::{Nomination, NominationStatus},
    referralmodel::{Referral, ReferralStatus},
    rewardmodel::{Redemption, RedemptionStatus, RewardItem},
    transactionmodel::{Transaction, TransactionSource, TransactionStatus, TransactionType},
    usermodel::{User, UserRole},
};

pub const JOHN_ID: Uuid = Uuid::from_u128(1);
pub const SARAH_ID: Uuid = Uuid::from_u128(2);
pub const ADMIN_ID: Uuid = Uuid::from_u128(3);
pub const ALICE_ID: Uuid = Uuid::from_u128(4);
pub const BOB_ID: Uuid = Uuid::from_u128(5);

pub const POSITIONS: [&str; 10] = [
    "Software Engineer",
    "Senior Software Engineer",
    "Product Manager",
    "Marketing Specialist",
    "Sales Executive",
    "HR Manager",
    "Business Analyst",
    "Designer",
    "Data Scientist",
    "DevOps Engineer",
];

pub const RELATIONSHIPS: [&str; 8] = [
    "Former colleague",
    "Friend",
    "Family member",
    "Professional network",
    "University classmate",
    "Previous company colleague",
    "Industry contact",
    "Other",
];

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

struct RosterEntry {
    id: Uuid,
    name: &'static str,
    email: &'static str,
    role: UserRole,
    department: &'static str,
    joined: (i32, u32, u32),
    referral: i32,
    performance: i32,
    travel: i32,
}

const ROSTER: [RosterEntry; 5] = [
    RosterEntry { id: JOHN_ID, name: "John Doe", email: "john.doe@travclan.com", role: UserRole::Employee, department: "Engineering", joined: (2023, 1, 15), referral: 25, performance: 15, travel: 5 },
    RosterEntry { id: SARAH_ID, name: "Sarah Manager", email: "sarah.manager@travclan.com", role: UserRole::Manager, department: "HR", joined: (2022, 3, 20), referral: 40, performance: 28, travel: 10 },
    RosterEntry { id: ADMIN_ID, name: "Admin User", email: "admin@travclan.com", role: UserRole::Admin, department: "Administration", joined: (2021, 1, 1), referral: 60, performance: 40, travel: 20 },
    RosterEntry { id: ALICE_ID, name: "Alice Smith", email: "alice.smith@travclan.com", role: UserRole::Employee, department: "Marketing", joined: (2023, 6, 10), referral: 20, performance: 8, travel: 4 },
    RosterEntry { id: BOB_ID, name: "Bob Johnson", email: "bob.johnson@travclan.com", role: UserRole::Employee, department: "Sales", joined: (2022, 11, 5), referral: 30, performance: 18, travel: 8 },
];

pub fn demo_users() -> Vec<User> {
    ROSTER
        .iter()
        .map(|entry| User {
            id: entry.id,
            name: entry.name.to_string(),
            email: entry.email.to_string(),
            role: entry.role,
            department: entry.department.to_string(),
            join_date: date(entry.joined.0, entry.joined.1, entry.joined.2),
        })
        .collect()
}

pub fn demo_rewards() -> Vec<RewardItem> {
    let items: [(&str, &str, i32, &str, &str, Option<i32>); 9] = [
        ("International Trip", "All-expenses-paid international vacation", 50, "Travel", "https://images.pexels.com/photos/346885/pexels-photo-346885.jpeg", Some(100000)),
        ("MacBook Air", "Latest MacBook Air or equivalent tech gadget", 40, "Technology", "https://images.pexels.com/photos/205421/pexels-photo-205421.jpeg", Some(49999)),
        ("Travacation Package", "Premium domestic travel package", 30, "Travel", "https://images.pexels.com/photos/1371360/pexels-photo-1371360.jpeg", None),
        ("Annual Gym Membership", "Premium gym membership for one year", 20, "Health", "https://images.pexels.com/photos/1552242/pexels-photo-1552242.jpeg", Some(19999)),
        ("Designer Items", "Premium designer accessories or clothing", 12, "Fashion", "https://images.pexels.com/photos/934070/pexels-photo-934070.jpeg", Some(14999)),
        ("Amazon Voucher ₹5,000", "Amazon shopping voucher", 8, "Shopping", "https://images.pexels.com/photos/4058219/pexels-photo-4058219.jpeg", None),
        ("Monthly Mutual Fund ₹1,000", "Investment in mutual funds for your future", 4, "Investment", "https://images.pexels.com/photos/259027/pexels-photo-259027.jpeg", None),
        ("Restaurant Vouchers ₹1,999", "Dine at premium restaurants and cafes", 2, "Food", "https://images.pexels.com/photos/262978/pexels-photo-262978.jpeg", None),
        ("Spa Vouchers ₹500", "Relaxing spa and wellness treatments", 1, "Wellness", "https://images.pexels.com/photos/3757942/pexels-photo-3757942.jpeg", None),
    ];

    items
        .iter()
        .enumerate()
        .map(|(i, (name, description, cost, category, image, max_value))| RewardItem {
            id: Uuid::from_u128(0x100 + i as u128 + 1),
            name: name.to_string(),
            description: description.to_string(),
            points_cost: *cost,
            category: category.to_string(),
            image: image.to_string(),
            available: true,
            max_value: *max_value,
        })
        .collect()
}

fn demo_referrals() -> Vec<Referral> {
    vec![
        Referral {
            id: Uuid::from_u128(0x201),
            referrer_id: JOHN_ID,
            candidate_name: "Alex Thompson".to_string(),
            candidate_email: "alex.thompson@email.com".to_string(),
            candidate_phone: "+91-9876543210".to_string(),
            position: "Software Engineer".to_string(),
            relationship: "Former colleague".to_string(),
            years_known: 2,
            date_submitted: date(2023, 10, 15),
            status: ReferralStatus::Hired,
            points_earned: 3,
            months_completed: 3,
            // keeps the demo hire at three completed months
            hired_at: Some(Utc::now() - Duration::days(100)),
        },
        Referral {
            id: Uuid::from_u128(0x202),
            referrer_id: SARAH_ID,
            candidate_name: "Maria Garcia".to_string(),
            candidate_email: "maria.garcia@email.com".to_string(),
            candidate_phone: "+91-9876543211".to_string(),
            position: "Marketing Specialist".to_string(),
            relationship: "Friend".to_string(),
            years_known: 5,
            date_submitted: date(2023, 12, 1),
            status: ReferralStatus::Interview,
            points_earned: 0,
            months_completed: 0,
            hired_at: None,
        },
        Referral {
            id: Uuid::from_u128(0x203),
            referrer_id: JOHN_ID,
            candidate_name: "David Wilson".to_string(),
            candidate_email: "david.wilson@email.com".to_string(),
            candidate_phone: "+91-9876543212".to_string(),
            position: "Product Manager".to_string(),
            relationship: "University classmate".to_string(),
            years_known: 4,
            date_submitted: date(2024, 1, 10),
            status: ReferralStatus::Applied,
            points_earned: 0,
            months_completed: 0,
            hired_at: None,
        },
    ]
}

fn entry(
    user_id: Uuid,
    kind: TransactionType,
    amount: i32,
    description: &str,
    source: TransactionSource,
    at: DateTime<Utc>,
) -> Transaction {
    let mut tx = Transaction::approved(user_id, kind, amount, description, source);
    tx.created_at = at;
    tx
}

/// Itemised history plus an opening balance per category, so each user's
/// derived totals line up with the roster figures before redemptions.
fn demo_transactions() -> Vec<Transaction> {
    let mut alex_bonus = entry(
        JOHN_ID,
        TransactionType::Referral,
        3,
        "Referral bonus - Alex Thompson hired (3 months)",
        TransactionSource::ReferralMilestone,
        date(2024, 1, 15),
    );
    alex_bonus.referral_id = Some(Uuid::from_u128(0x201));
    alex_bonus.reference_number = Some("REF-001".to_string());

    let mut award = entry(
        JOHN_ID,
        TransactionType::Performance,
        10,
        "Q4 Performance Excellence Award",
        TransactionSource::Manual,
        date(2024, 1, 10),
    );
    award.approved_by = Some("Admin User".to_string());

    let itemised = vec![
        alex_bonus,
        award,
        entry(
            SARAH_ID,
            TransactionType::Travel,
            5,
            "Business Travel - Client Meeting Mumbai",
            TransactionSource::Manual,
            date(2024, 1, 8),
        ),
    ];

    let mut ledger = Vec::new();
    for member in ROSTER.iter() {
        for (kind, target) in [
            (TransactionType::Referral, member.referral),
            (TransactionType::Performance, member.performance),
            (TransactionType::Travel, member.travel),
        ] {
            let itemised_sum: i32 = itemised
                .iter()
                .filter(|t| t.user_id == member.id && t.kind == kind)
                .map(|t| t.amount)
                .sum();
            let opening = target - itemised_sum;
            if opening > 0 {
                ledger.push(entry(
                    member.id,
                    kind,
                    opening,
                    &format!("Opening {} balance", kind.to_str()),
                    TransactionSource::Manual,
                    date(2023, 12, 31),
                ));
            }
        }
    }
    ledger.extend(itemised);
    ledger
}

fn demo_redemptions(rewards: &[RewardItem]) -> Vec<(Redemption, Transaction)> {
    let plan = [
        (JOHN_ID, "Amazon Voucher ₹5,000", date(2024, 1, 5), RedemptionStatus::Approved, "123 Main St, Mumbai", Some("TRK123456789")),
        (SARAH_ID, "Spa Vouchers ₹500", date(2024, 1, 12), RedemptionStatus::Pending, "456 Park Ave, Delhi", None),
        (JOHN_ID, "Restaurant Vouchers ₹1,999", date(2024, 1, 18), RedemptionStatus::Pending, "123 Main St, Mumbai", None),
    ];

    plan.iter()
        .enumerate()
        .filter_map(|(i, (user_id, item, at, status, address, tracking))| {
            let reward = rewards.iter().find(|r| r.name == *item)?;
            let mut debit = entry(
                *user_id,
                TransactionType::Redemption,
                -reward.points_cost,
                &format!("Redeemed: {}", reward.name),
                TransactionSource::Redemption,
                *at,
            );
            let reference = format!("RDM-{:03}", i + 1);
            debit.reference_number = Some(reference.clone());

            let redemption = Redemption {
                id: Uuid::from_u128(0x301 + i as u128),
                user_id: *user_id,
                reward_id: reward.id,
                item_name: reward.name.clone(),
                points_used: reward.points_cost,
                date_submitted: *at,
                status: *status,
                transaction_id: debit.id,
                reference_number: reference,
                delivery_address: Some(address.to_string()),
                tracking_number: tracking.map(str::to_string),
                notes: None,
            };
            Some((redemption, debit))
        })
        .collect()
}

fn demo_nominations() -> Vec<Nomination> {
    vec![
        Nomination {
            id: Uuid::from_u128(0x401),
            nominator_id: SARAH_ID,
            employee_id: JOHN_ID,
            points: 5,
            reason: "Exceptional work on the new product launch, went above and beyond expectations".to_string(),
            date_submitted: date(2024, 1, 12),
            status: NominationStatus::Pending,
            approved_by: None,
            approved_date: None,
        },
        Nomination {
            id: Uuid::from_u128(0x402),
            nominator_id: SARAH_ID,
            employee_id: ALICE_ID,
            points: 3,
            reason: "Great teamwork and collaboration on the marketing campaign".to_string(),
            date_submitted: date(2024, 1, 10),
            status: NominationStatus::Approved,
            approved_by: Some("Admin User".to_string()),
            approved_date: Some(date(2024, 1, 11)),
        },
    ]
}

pub async fn seed_demo_data(db: &dyn PortalStore) -> Result<(), sqlx::Error> {
    for user in demo_users() {
        db.save_user(&user).await?;
    }

    let rewards = demo_rewards();
    for reward in &rewards {
        db.save_reward(reward).await?;
    }

    for referral in demo_referrals() {
        db.save_referral(&referral).await?;
    }

    for transaction in demo_transactions() {
        db.insert_transaction(&transaction).await?;
    }

    for (redemption, debit) in demo_redemptions(&rewards) {
        if db.create_redemption(&redemption, &debit).await?.is_none() {
            tracing::warn!("Skipped demo redemption {}: balance too low", redemption.reference_number);
        }
    }

    for nomination in demo_nominations() {
        db.save_nomination(&nomination).await?;
    }

    tracing::info!(
        "🌱 Seeded demo data: {} users, {} rewards",
        ROSTER.len(),
        rewards.len()
    );
    Ok(())
}

#[cfg(test)]
pub fn sample_referral(
    referrer_id: Uuid,
    status: ReferralStatus,
    months_completed: i32,
    points_earned: i32,
) -> Referral {
    Referral {
        id: Uuid::new_v4(),
        referrer_id,
        candidate_name: "Priya Raman".to_string(),
        candidate_email: "priya.raman@email.com".to_string(),
        candidate_phone: "+91-9876500000".to_string(),
        position: POSITIONS[0].to_string(),
        relationship: RELATIONSHIPS[0].to_string(),
        years_known: 3,
        date_submitted: Utc::now(),
        status,
        points_earned,
        months_completed,
        hired_at: (status == ReferralStatus::Hired).then(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::service::ledger::PointBalances;

    #[tokio::test]
    async fn test_seeded_balances_are_consistent() {
        let db = MemoryDb::new();
        seed_demo_data(&db).await.unwrap();

        let john = db.get_transactions(Some(JOHN_ID)).await.unwrap();
        let balances = PointBalances::from_transactions(&john);
        assert!(balances.is_consistent());
        assert_eq!(balances.referral_points, 25);
        assert_eq!(balances.performance_points, 15);
        assert_eq!(balances.travel_miles, 5);
        // Amazon voucher (8) plus the pending restaurant voucher (2)
        assert_eq!(balances.redemptions, 10);
        assert_eq!(balances.total_points, 35);

        assert_eq!(db.get_users().await.unwrap().len(), 5);
        assert_eq!(db.get_rewards().await.unwrap().len(), 9);
        assert_eq!(db.get_redemptions(None, None).await.unwrap().len(), 3);
    }

    #[test]
    fn test_reference_lists() {
        assert!(POSITIONS.contains(&"Data Scientist"));
        assert!(RELATIONSHIPS.contains(&"Industry contact"));
    }
}
