use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::CoreError;

use super::wire::{
    AccountRow, GoalRow, NewAccountRow, NewGoalRow, NewSubscriptionRow, NewTransactionRow,
    SubscriptionRow, TransactionRow,
};

/// Trait abstraction for the hosted relational store.
///
/// The reconciliation service only talks to the remote through this trait, so
/// the HTTP backend can be swapped for an offline stub or a test double.
/// Every method may fail with a remote-class error (`Remote`, `Network`,
/// `Offline`); callers fall back to the local mirror on those.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    // ── transactions ────────────────────────────────────────────────

    /// All of the user's transactions, newest date first.
    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<TransactionRow>, CoreError>;

    /// Insert a transaction; the returned row carries the canonical id.
    async fn insert_transaction(&self, row: NewTransactionRow) -> Result<TransactionRow, CoreError>;

    async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<(), CoreError>;

    // ── accounts ────────────────────────────────────────────────────

    /// All of the user's accounts, by name ascending.
    async fn fetch_accounts(&self, user_id: &str) -> Result<Vec<AccountRow>, CoreError>;

    async fn insert_account(&self, row: NewAccountRow) -> Result<AccountRow, CoreError>;

    /// Overwrite the stored balance of one account.
    async fn update_account_balance(
        &self,
        user_id: &str,
        id: &str,
        balance: Decimal,
    ) -> Result<(), CoreError>;

    async fn delete_account(&self, user_id: &str, id: &str) -> Result<(), CoreError>;

    // ── goals ───────────────────────────────────────────────────────

    async fn fetch_goals(&self, user_id: &str) -> Result<Vec<GoalRow>, CoreError>;

    async fn insert_goal(&self, row: NewGoalRow) -> Result<GoalRow, CoreError>;

    /// Overwrite the saved amount of one goal.
    async fn update_goal_amount(
        &self,
        user_id: &str,
        id: &str,
        current_amount: Decimal,
    ) -> Result<(), CoreError>;

    async fn delete_goal(&self, user_id: &str, id: &str) -> Result<(), CoreError>;

    // ── subscriptions ───────────────────────────────────────────────

    async fn fetch_subscriptions(&self, user_id: &str) -> Result<Vec<SubscriptionRow>, CoreError>;

    async fn insert_subscription(
        &self,
        row: NewSubscriptionRow,
    ) -> Result<SubscriptionRow, CoreError>;

    async fn delete_subscription(&self, user_id: &str, id: &str) -> Result<(), CoreError>;
}
