use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::CoreError;

use super::traits::RemoteStore;
use super::wire::{
    AccountRow, GoalRow, NewAccountRow, NewGoalRow, NewSubscriptionRow, NewTransactionRow,
    SubscriptionRow, TransactionRow,
};

/// Remote store used when no remote is configured.
///
/// Every call fails with `CoreError::Offline`, which sends the ledger down its
/// local-mirror path for every operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemoteStore;

impl OfflineRemoteStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteStore for OfflineRemoteStore {
    fn name(&self) -> &str {
        "Offline"
    }

    async fn fetch_transactions(&self, _user_id: &str) -> Result<Vec<TransactionRow>, CoreError> {
        Err(CoreError::Offline)
    }

    async fn insert_transaction(&self, _row: NewTransactionRow) -> Result<TransactionRow, CoreError> {
        Err(CoreError::Offline)
    }

    async fn delete_transaction(&self, _user_id: &str, _id: &str) -> Result<(), CoreError> {
        Err(CoreError::Offline)
    }

    async fn fetch_accounts(&self, _user_id: &str) -> Result<Vec<AccountRow>, CoreError> {
        Err(CoreError::Offline)
    }

    async fn insert_account(&self, _row: NewAccountRow) -> Result<AccountRow, CoreError> {
        Err(CoreError::Offline)
    }

    async fn update_account_balance(
        &self,
        _user_id: &str,
        _id: &str,
        _balance: Decimal,
    ) -> Result<(), CoreError> {
        Err(CoreError::Offline)
    }

    async fn delete_account(&self, _user_id: &str, _id: &str) -> Result<(), CoreError> {
        Err(CoreError::Offline)
    }

    async fn fetch_goals(&self, _user_id: &str) -> Result<Vec<GoalRow>, CoreError> {
        Err(CoreError::Offline)
    }

    async fn insert_goal(&self, _row: NewGoalRow) -> Result<GoalRow, CoreError> {
        Err(CoreError::Offline)
    }

    async fn update_goal_amount(
        &self,
        _user_id: &str,
        _id: &str,
        _current_amount: Decimal,
    ) -> Result<(), CoreError> {
        Err(CoreError::Offline)
    }

    async fn delete_goal(&self, _user_id: &str, _id: &str) -> Result<(), CoreError> {
        Err(CoreError::Offline)
    }

    async fn fetch_subscriptions(&self, _user_id: &str) -> Result<Vec<SubscriptionRow>, CoreError> {
        Err(CoreError::Offline)
    }

    async fn insert_subscription(
        &self,
        _row: NewSubscriptionRow,
    ) -> Result<SubscriptionRow, CoreError> {
        Err(CoreError::Offline)
    }

    async fn delete_subscription(&self, _user_id: &str, _id: &str) -> Result<(), CoreError> {
        Err(CoreError::Offline)
    }
}
