pub mod errors;
pub mod models;
pub mod remote;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use errors::CoreError;
use models::{
    account::{Account, AccountDraft},
    goal::{Goal, GoalDraft},
    ledger::{EntityKind, Synced},
    settings::Settings,
    subscription::{Subscription, SubscriptionDraft, UpcomingPayment},
    summary::{CategoryTotal, FinancialSummary, MonthlyTotals},
    transaction::{Transaction, TransactionDraft},
};
use remote::{offline::OfflineRemoteStore, rest::RestRemoteStore, traits::RemoteStore};
use services::{
    ledger_service::{LedgerService, QuickSave, Transfer},
    subscription_service::SubscriptionService,
    summary_service::SummaryService,
    sync_queue::SyncStats,
};
use storage::{file::FileMirror, memory::MemoryMirror, traits::LocalMirror};

/// Today's date on the local calendar. Transfers, quick saves and the
/// duplicate check all use it.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Main entry point for the finance ledger core library.
///
/// Wraps a [`LedgerService`] for one user and keeps a snapshot of the four
/// collections, refreshed from the local mirror after every mutation, so the
/// UI layer can read without awaiting.
#[must_use]
pub struct FinanceLedger {
    service: LedgerService,
    summary_service: SummaryService,
    subscription_service: SubscriptionService,
    transactions: Vec<Transaction>,
    accounts: Vec<Account>,
    goals: Vec<Goal>,
    subscriptions: Vec<Subscription>,
    /// Set when the last `load()` could not reach the remote for transactions.
    offline: bool,
}

impl std::fmt::Debug for FinanceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceLedger")
            .field("user_id", &self.service.user_id())
            .field("transactions", &self.transactions.len())
            .field("accounts", &self.accounts.len())
            .field("goals", &self.goals.len())
            .field("subscriptions", &self.subscriptions.len())
            .field("offline", &self.offline)
            .finish()
    }
}

impl FinanceLedger {
    /// Build a ledger from settings: REST remote if configured (offline stub
    /// otherwise), file mirror if a directory is configured (memory otherwise).
    ///
    /// Must be called inside a Tokio runtime.
    pub fn connect(settings: &Settings, user_id: impl Into<String>) -> Result<Self, CoreError> {
        settings.validate()?;
        let mirror: Arc<dyn LocalMirror> = match &settings.mirror_dir {
            Some(dir) => Arc::new(FileMirror::open(dir)?),
            None => Arc::new(MemoryMirror::new()),
        };
        Ok(Self::with_stores(user_id, Self::build_remote(settings)?, mirror, settings))
    }

    /// Like [`connect`](Self::connect), with the mirror directory encrypted
    /// under `passphrase`.
    pub fn connect_encrypted(
        settings: &Settings,
        user_id: impl Into<String>,
        passphrase: &str,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let dir = settings.mirror_dir.as_ref().ok_or_else(|| {
            CoreError::Config("An encrypted mirror needs mirror_dir to be set".into())
        })?;
        let mirror: Arc<dyn LocalMirror> = Arc::new(FileMirror::encrypted(dir, passphrase)?);
        Ok(Self::with_stores(user_id, Self::build_remote(settings)?, mirror, settings))
    }

    /// Build a ledger over caller-provided stores.
    pub fn with_stores(
        user_id: impl Into<String>,
        remote: Arc<dyn RemoteStore>,
        mirror: Arc<dyn LocalMirror>,
        settings: &Settings,
    ) -> Self {
        Self {
            service: LedgerService::new(user_id, remote, mirror, settings),
            summary_service: SummaryService::new(),
            subscription_service: SubscriptionService::new(),
            transactions: Vec::new(),
            accounts: Vec::new(),
            goals: Vec::new(),
            subscriptions: Vec::new(),
            offline: false,
        }
    }

    fn build_remote(settings: &Settings) -> Result<Arc<dyn RemoteStore>, CoreError> {
        Ok(match &settings.remote {
            Some(remote) => Arc::new(RestRemoteStore::new(remote)?),
            None => Arc::new(OfflineRemoteStore::new()),
        })
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Refresh all four collections. Never fails; check `is_offline()` to
    /// find out whether transactions came from the remote.
    pub async fn load(&mut self) {
        let transactions = self.service.list_transactions().await;
        self.offline = transactions.is_degraded();
        self.transactions = transactions.into_inner();
        self.accounts = self.service.list_accounts().await.into_inner();
        self.goals = self.service.list_goals().await.into_inner();
        self.subscriptions = self.service.list_subscriptions().await.into_inner();
    }

    /// Forget this user's on-device data, e.g. on sign-out. Empties the
    /// snapshots too; queued background pushes still run.
    pub async fn clear_local_data(&mut self) -> Result<(), CoreError> {
        self.service.clear_local().await?;
        self.transactions.clear();
        self.accounts.clear();
        self.goals.clear();
        self.subscriptions.clear();
        Ok(())
    }

    /// Degraded-mode signal for the "working offline" indicator.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    #[must_use]
    pub fn get_account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn get_goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    #[must_use]
    pub fn service(&self) -> &LedgerService {
        &self.service
    }

    // ── Transactions ────────────────────────────────────────────────

    pub async fn add_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> Result<Synced<Transaction>, CoreError> {
        let result = self.service.add_transaction(draft).await;
        self.reload(&[EntityKind::Transactions, EntityKind::Accounts])?;
        result
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<(), CoreError> {
        let result = self.service.delete_transaction(id).await;
        self.reload(&[EntityKind::Transactions, EntityKind::Accounts])?;
        result
    }

    pub async fn transfer(
        &mut self,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
    ) -> Result<Transfer, CoreError> {
        let result = self.service.transfer(from_account, to_account, amount).await;
        self.reload(&[EntityKind::Transactions, EntityKind::Accounts])?;
        result
    }

    #[must_use]
    pub fn check_possible_duplicate(&self, amount: Decimal, description: &str) -> bool {
        self.service.check_possible_duplicate(amount, description)
    }

    // ── Goals ───────────────────────────────────────────────────────

    pub async fn quick_save(&mut self, goal_id: &str, amount: Decimal) -> Result<QuickSave, CoreError> {
        let result = self.service.quick_save(goal_id, amount).await;
        self.reload(&[EntityKind::Transactions, EntityKind::Accounts, EntityKind::Goals])?;
        result
    }

    pub async fn contribute_to_goal(
        &mut self,
        goal_id: &str,
        amount: Decimal,
    ) -> Result<Synced<Goal>, CoreError> {
        let result = self.service.contribute_to_goal(goal_id, amount).await;
        self.reload(&[EntityKind::Goals])?;
        result
    }

    pub async fn add_goal(&mut self, draft: GoalDraft) -> Result<Synced<Goal>, CoreError> {
        let result = self.service.add_goal(draft).await;
        self.reload(&[EntityKind::Goals])?;
        result
    }

    pub async fn delete_goal(&mut self, id: &str) -> Result<(), CoreError> {
        let result = self.service.delete_goal(id).await;
        self.reload(&[EntityKind::Goals])?;
        result
    }

    // ── Accounts ────────────────────────────────────────────────────

    pub async fn add_account(&mut self, draft: AccountDraft) -> Result<Synced<Account>, CoreError> {
        let result = self.service.add_account(draft).await;
        self.reload(&[EntityKind::Accounts])?;
        result
    }

    pub async fn delete_account(&mut self, id: &str) -> Result<(), CoreError> {
        let result = self.service.delete_account(id).await;
        self.reload(&[EntityKind::Accounts])?;
        result
    }

    /// Sum of all account balances.
    #[must_use]
    pub fn total_balance(&self) -> Decimal {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    // ── Subscriptions ───────────────────────────────────────────────

    pub async fn add_subscription(
        &mut self,
        draft: SubscriptionDraft,
    ) -> Result<Synced<Subscription>, CoreError> {
        let result = self.service.add_subscription(draft).await;
        self.reload(&[EntityKind::Subscriptions])?;
        result
    }

    pub async fn delete_subscription(&mut self, id: &str) -> Result<(), CoreError> {
        let result = self.service.delete_subscription(id).await;
        self.reload(&[EntityKind::Subscriptions])?;
        result
    }

    /// Charges due within `within_days` of today.
    #[must_use]
    pub fn upcoming_payments(&self, within_days: i64) -> Vec<UpcomingPayment> {
        self.subscription_service
            .upcoming(&self.subscriptions, today(), within_days)
    }

    #[must_use]
    pub fn monthly_subscription_cost(&self) -> Decimal {
        self.subscription_service
            .total_monthly_cost(&self.subscriptions)
    }

    // ── Summary ─────────────────────────────────────────────────────

    #[must_use]
    pub fn summary(&self) -> FinancialSummary {
        self.summary_service.summarize(&self.transactions)
    }

    #[must_use]
    pub fn summary_for_period(&self, from: NaiveDate, to: NaiveDate) -> FinancialSummary {
        self.summary_service
            .summarize_period(&self.transactions, from, to)
    }

    #[must_use]
    pub fn expenses_by_category(&self) -> Vec<CategoryTotal> {
        self.summary_service
            .expenses_by_category(&self.transactions)
    }

    #[must_use]
    pub fn monthly_totals(&self, year: i32) -> Vec<MonthlyTotals> {
        self.summary_service
            .monthly_totals(&self.transactions, year)
    }

    // ── Background sync ─────────────────────────────────────────────

    #[must_use]
    pub fn sync_stats(&self) -> SyncStats {
        self.service.sync_queue().stats()
    }

    /// Wait until every queued background push has been attempted.
    pub async fn flush_sync(&self) {
        self.service.sync_queue().flush().await;
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Re-read the snapshot of `kinds` from the mirror.
    fn reload(&mut self, kinds: &[EntityKind]) -> Result<(), CoreError> {
        let mirror = self.service.mirror();
        for kind in kinds {
            match kind {
                EntityKind::Transactions => self.transactions = mirror.load(*kind)?,
                EntityKind::Accounts => self.accounts = mirror.load(*kind)?,
                EntityKind::Goals => self.goals = mirror.load(*kind)?,
                EntityKind::Subscriptions => self.subscriptions = mirror.load(*kind)?,
            }
        }
        Ok(())
    }
}
