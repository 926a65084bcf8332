use serde::{Deserialize, Serialize};

use crate::models::transactionmodel::{Transaction, TransactionStatus, TransactionType};

/// Per-category totals derived from a user's approved ledger entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBalances {
    pub referral_points: i32,
    pub performance_points: i32,
    pub travel_miles: i32,
    /// Points spent on rewards (positive).
    pub redemptions: i32,
    /// Points removed by deductions (positive).
    pub deductions: i32,
    pub total_points: i32,
}

impl PointBalances {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut balances = PointBalances::default();
        let mut ledger_sum = 0;

        for tx in transactions.into_iter().filter(|tx| tx.counts()) {
            ledger_sum += tx.amount;
            match tx.kind {
                TransactionType::Referral => balances.referral_points += tx.amount,
                TransactionType::Performance => balances.performance_points += tx.amount,
                TransactionType::Travel => balances.travel_miles += tx.amount,
                TransactionType::Redemption => balances.redemptions -= tx.amount,
                TransactionType::Deduction => balances.deductions -= tx.amount,
            }
        }

        balances.total_points = balances.expected_total();
        debug_assert_eq!(balances.total_points, ledger_sum);
        balances
    }

    fn expected_total(&self) -> i32 {
        self.referral_points + self.performance_points + self.travel_miles
            - self.redemptions
            - self.deductions
    }

    pub fn is_consistent(&self) -> bool {
        self.total_points == self.expected_total()
    }

    pub fn can_afford(&self, cost: i32) -> bool {
        self.total_points >= cost
    }
}

/// Keep entries matching the optional filters, newest first.
pub fn filter_transactions(
    mut transactions: Vec<Transaction>,
    kind: Option<TransactionType>,
    status: Option<TransactionStatus>,
    search: Option<&str>,
) -> Vec<Transaction> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

    transactions.retain(|tx| {
        kind.map_or(true, |k| tx.kind == k)
            && status.map_or(true, |s| tx.status == s)
            && needle
                .as_deref()
                .map_or(true, |n| tx.description.to_lowercase().contains(n))
    });
    transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    transactions
}
