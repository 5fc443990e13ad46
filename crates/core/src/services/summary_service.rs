use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::summary::{CategoryTotal, FinancialSummary, MonthlyTotals};
use crate::models::transaction::{Transaction, TransactionKind};

/// Projects aggregate figures out of a transaction set.
///
/// Pure functions over a slice: no I/O, no state, safe to call on every
/// change.
pub struct SummaryService;

impl SummaryService {
    pub fn new() -> Self {
        Self
    }

    /// Totals, fixed/variable split and savings rate.
    ///
    /// The savings rate is `balance / income × 100`, and is 0 whenever income
    /// or balance is not positive: it never goes negative and never divides
    /// by zero.
    pub fn summarize(&self, transactions: &[Transaction]) -> FinancialSummary {
        let mut summary = FinancialSummary {
            transaction_count: transactions.len(),
            ..FinancialSummary::default()
        };

        for tx in transactions {
            match tx.kind {
                TransactionKind::Income => summary.total_income += tx.amount,
                TransactionKind::Expense => {
                    summary.total_expense += tx.amount;
                    if tx.is_fixed {
                        summary.fixed_expenses += tx.amount;
                    } else {
                        summary.variable_expenses += tx.amount;
                    }
                }
            }
        }

        summary.balance = summary.total_income - summary.total_expense;
        summary.savings_rate = savings_rate(summary.total_income, summary.balance);
        summary
    }

    /// `summarize` restricted to transactions dated within `from..=to`.
    pub fn summarize_period(
        &self,
        transactions: &[Transaction],
        from: NaiveDate,
        to: NaiveDate,
    ) -> FinancialSummary {
        let in_range: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| tx.date >= from && tx.date <= to)
            .cloned()
            .collect();
        self.summarize(&in_range)
    }

    /// Expense totals per category, largest first.
    pub fn expenses_by_category(&self, transactions: &[Transaction]) -> Vec<CategoryTotal> {
        let mut totals: HashMap<_, Decimal> = HashMap::new();
        let mut total_expense = Decimal::ZERO;

        for tx in transactions
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Expense)
        {
            *totals.entry(tx.category).or_insert(Decimal::ZERO) += tx.amount;
            total_expense += tx.amount;
        }

        let mut breakdown: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category,
                total,
                share_pct: if total_expense > Decimal::ZERO {
                    (total / total_expense * Decimal::ONE_HUNDRED).round_dp(2)
                } else {
                    Decimal::ZERO
                },
            })
            .collect();

        // Ties broken by name so the chart order is stable.
        breakdown.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        });
        breakdown
    }

    /// Income and expense per month of `year`, January first. Always 12 entries.
    pub fn monthly_totals(&self, transactions: &[Transaction], year: i32) -> Vec<MonthlyTotals> {
        let mut months: Vec<MonthlyTotals> = (1..=12)
            .map(|month| MonthlyTotals {
                month,
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
            })
            .collect();

        for tx in transactions.iter().filter(|tx| tx.date.year() == year) {
            let bucket = &mut months[tx.date.month0() as usize];
            match tx.kind {
                TransactionKind::Income => bucket.income += tx.amount,
                TransactionKind::Expense => bucket.expense += tx.amount,
            }
        }
        months
    }
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new()
    }
}

fn savings_rate(income: Decimal, balance: Decimal) -> Decimal {
    if income > Decimal::ZERO && balance > Decimal::ZERO {
        balance / income * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}
