use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::Category;

/// Aggregate view over a set of transactions. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,

    /// total_income - total_expense
    pub balance: Decimal,

    /// Expenses flagged as recurring
    pub fixed_expenses: Decimal,

    /// Expenses not flagged as recurring
    pub variable_expenses: Decimal,

    /// balance / total_income × 100 when both are positive, else 0
    pub savings_rate: Decimal,

    pub transaction_count: usize,
}

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    /// Share of all expenses in percent
    pub share_pct: Decimal,
}

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// 1..=12
    pub month: u32,
    pub income: Decimal,
    pub expense: Decimal,
}
