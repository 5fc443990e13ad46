use log::{debug, warn};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::account::{Account, AccountDraft, AccountKind};
use crate::models::goal::{Goal, GoalDraft};
use crate::models::ledger::{EntityKind, Record, Synced};
use crate::models::settings::Settings;
use crate::models::subscription::{Subscription, SubscriptionDraft};
use crate::models::transaction::{Category, Transaction, TransactionDraft, TransactionKind};
use crate::remote::traits::RemoteStore;
use crate::remote::wire::{NewAccountRow, NewGoalRow, NewSubscriptionRow, NewTransactionRow};
use crate::services::sync_queue::{SyncQueue, SyncTask};
use crate::storage::mirror::UserMirror;
use crate::storage::traits::LocalMirror;
use crate::today;

/// Prefix of identifiers synthesized while the remote store is unreachable.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// How a local change is pushed to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSync {
    /// Await the remote write; a failure is logged and otherwise ignored.
    Await,
    /// Hand the write to the background sync queue (offline path).
    Background,
}

/// Both legs of an account-to-account transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub outgoing: Synced<Transaction>,
    pub incoming: Synced<Transaction>,
}

/// Result of a quick save: the funding expense and the updated goal.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickSave {
    pub transaction: Synced<Transaction>,
    pub goal: Synced<Goal>,
    pub account_id: String,
}

/// Single point of access for reading and mutating one user's ledger.
///
/// Every operation tries the remote store first. When the remote answers,
/// its records are canonical and get mirrored locally. When it fails, reads
/// serve the local mirror as-is and writes synthesize a local record, so the
/// common paths never return a remote error to the caller.
///
/// Adding a transaction and adjusting its account's balance are two separate
/// writes. If the process dies between them the balance is off by that
/// transaction; nothing detects or repairs this. The same holds for the two
/// legs of a transfer and for quick saves.
///
/// Reads and mutations are serialized per service instance for their whole
/// duration, remote call included. Overlapping adds can't lose each other's
/// mirror write, and a list can't overwrite the mirror with a remote snapshot
/// taken before a concurrent add landed.
pub struct LedgerService {
    user_id: String,
    remote: Arc<dyn RemoteStore>,
    mirror: UserMirror,
    sync: SyncQueue,
    reverse_balance_on_delete: bool,
    write_lock: Mutex<()>,
}

impl LedgerService {
    /// Build the service for one user. Spawns the background sync worker, so
    /// this must run inside a Tokio runtime.
    pub fn new(
        user_id: impl Into<String>,
        remote: Arc<dyn RemoteStore>,
        mirror: Arc<dyn LocalMirror>,
        settings: &Settings,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            mirror: UserMirror::new(mirror, settings.mirror_namespace.clone(), user_id.clone()),
            sync: SyncQueue::spawn(Arc::clone(&remote)),
            user_id,
            remote,
            reverse_balance_on_delete: settings.reverse_balance_on_delete,
            write_lock: Mutex::new(()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn sync_queue(&self) -> &SyncQueue {
        &self.sync
    }

    pub fn mirror(&self) -> &UserMirror {
        &self.mirror
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// All transactions, newest date first.
    pub async fn list_transactions(&self) -> Synced<Vec<Transaction>> {
        self.list_with_fallback(
            EntityKind::Transactions,
            self.remote.fetch_transactions(&self.user_id),
        )
        .await
    }

    /// All accounts, by name.
    pub async fn list_accounts(&self) -> Synced<Vec<Account>> {
        self.list_with_fallback(
            EntityKind::Accounts,
            self.remote.fetch_accounts(&self.user_id),
        )
        .await
    }

    pub async fn list_goals(&self) -> Synced<Vec<Goal>> {
        self.list_with_fallback(EntityKind::Goals, self.remote.fetch_goals(&self.user_id))
            .await
    }

    /// All subscriptions, soonest payment first.
    pub async fn list_subscriptions(&self) -> Synced<Vec<Subscription>> {
        self.list_with_fallback(
            EntityKind::Subscriptions,
            self.remote.fetch_subscriptions(&self.user_id),
        )
        .await
    }

    /// Fetch from the remote and overwrite the mirror with the result, or
    /// serve the mirror untouched if the fetch fails. Never fails.
    ///
    /// The write lock is held from before the fetch until the mirror is
    /// written, so the snapshot can't be older than a mutation it replaces.
    async fn list_with_fallback<R, T, F>(&self, kind: EntityKind, fetch: F) -> Synced<Vec<T>>
    where
        F: Future<Output = Result<Vec<R>, CoreError>>,
        T: From<R> + Serialize + DeserializeOwned,
    {
        let _guard = self.write_lock.lock().await;
        match fetch.await {
            Ok(rows) => {
                let items: Vec<T> = rows.into_iter().map(T::from).collect();
                if let Err(e) = self.mirror.save(kind, &items) {
                    warn!("Failed to mirror {} fetched {kind}: {e}", items.len());
                }
                debug!("{}: fetched {} {kind}", self.remote.name(), items.len());
                Synced::remote(items)
            }
            Err(e) => {
                warn!(
                    "{}: fetching {kind} failed, serving local mirror: {e}",
                    self.remote.name()
                );
                Synced::local(self.load_or_empty(kind))
            }
        }
    }

    fn load_or_empty<T: DeserializeOwned>(&self, kind: EntityKind) -> Vec<T> {
        self.mirror.load(kind).unwrap_or_else(|e| {
            warn!("Local mirror for {kind} unreadable, treating as empty: {e}");
            Vec::new()
        })
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Record a transaction and apply it to its account's balance.
    ///
    /// Remote path: the remote assigns the id, the balance update is awaited.
    /// Offline path: a fresh local id is synthesized and the new balance is
    /// pushed through the background queue. Either way the transaction ends
    /// up at the head of the mirrored list.
    pub async fn add_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<Synced<Transaction>, CoreError> {
        validate_transaction(&draft)?;
        let _guard = self.write_lock.lock().await;
        self.add_transaction_locked(draft).await
    }

    async fn add_transaction_locked(
        &self,
        draft: TransactionDraft,
    ) -> Result<Synced<Transaction>, CoreError> {
        let mut transactions: Vec<Transaction> = self.mirror.load(EntityKind::Transactions)?;
        let row = NewTransactionRow::from_draft(&draft, &self.user_id);

        let (synced, sync) = match self.remote.insert_transaction(row).await {
            Ok(row) => {
                let tx = Transaction::from(row);
                debug!("{}: inserted transaction {}", self.remote.name(), tx.id);
                (Synced::remote(tx), RemoteSync::Await)
            }
            Err(e) => {
                let id = synthesize_id(transactions.iter().map(|t| t.id.as_str()));
                warn!(
                    "{}: insert transaction failed, recording locally as {id}: {e}",
                    self.remote.name()
                );
                (Synced::local(draft.into_transaction(id)), RemoteSync::Background)
            }
        };

        if let Some(account_id) = &synced.value.account_id {
            self.adjust_balance_locked(account_id, synced.value.amount, synced.value.kind, sync)
                .await?;
        }

        transactions.retain(|t| t.id != synced.value.id);
        Transaction::place(&mut transactions, synced.value.clone());
        self.mirror.save(EntityKind::Transactions, &transactions)?;

        Ok(synced)
    }

    /// Remove a transaction from both stores. Always succeeds for unknown ids.
    ///
    /// The account balance keeps the adjustment made when the transaction was
    /// added, unless `reverse_balance_on_delete` is set.
    pub async fn delete_transaction(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;

        let sync = match self.remote.delete_transaction(&self.user_id, id).await {
            Ok(()) => RemoteSync::Await,
            Err(e) => {
                warn!(
                    "{}: delete transaction {id} failed, removing locally only: {e}",
                    self.remote.name()
                );
                RemoteSync::Background
            }
        };

        let removed: Option<Transaction> = self.remove_local(id)?;

        if self.reverse_balance_on_delete {
            if let Some(tx) = removed {
                if let Some(account_id) = &tx.account_id {
                    self.adjust_balance_locked(account_id, tx.amount, tx.kind.opposite(), sync)
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Move money between two accounts as an expense on `from_account` and an
    /// income on `to_account`, both dated today.
    ///
    /// Both accounts are checked before anything is written. If the second leg
    /// fails the first one stays applied.
    pub async fn transfer(
        &self,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
    ) -> Result<Transfer, CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Transfer amount must be positive".into(),
            ));
        }
        if from_account == to_account {
            return Err(CoreError::ValidationError(
                "Cannot transfer to the same account".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let accounts: Vec<Account> = self.mirror.load(EntityKind::Accounts)?;
        let find = |id: &str| {
            accounts
                .iter()
                .find(|a| a.id == id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Accounts.label(), id))
        };
        let source = find(from_account)?;
        let destination = find(to_account)?;

        let date = today();
        let outgoing = self
            .add_transaction_locked(
                TransactionDraft::expense(amount, Category::TransferOut, date)
                    .with_description(format!("Transfer to {}", destination.name))
                    .with_account(source.id.clone()),
            )
            .await?;
        let incoming = self
            .add_transaction_locked(
                TransactionDraft::income(amount, Category::TransferIn, date)
                    .with_description(format!("Transfer from {}", source.name))
                    .with_account(destination.id.clone()),
            )
            .await?;

        Ok(Transfer { outgoing, incoming })
    }

    /// Whether a transaction with the same amount and description
    /// (case-insensitive) was already recorded today. Advisory only.
    pub fn check_possible_duplicate(&self, amount: Decimal, description: &str) -> bool {
        let transactions: Vec<Transaction> = self.load_or_empty(EntityKind::Transactions);
        is_possible_duplicate(&transactions, amount, description, today())
    }

    // ── Balances ────────────────────────────────────────────────────

    /// Apply a signed amount to an account's balance in the mirror, then push
    /// the new balance to the remote as requested.
    ///
    /// Returns the new balance, or `None` if the account isn't mirrored.
    pub async fn adjust_balance(
        &self,
        account_id: &str,
        amount: Decimal,
        kind: TransactionKind,
        sync: RemoteSync,
    ) -> Result<Option<Decimal>, CoreError> {
        let _guard = self.write_lock.lock().await;
        self.adjust_balance_locked(account_id, amount, kind, sync)
            .await
    }

    async fn adjust_balance_locked(
        &self,
        account_id: &str,
        amount: Decimal,
        kind: TransactionKind,
        sync: RemoteSync,
    ) -> Result<Option<Decimal>, CoreError> {
        let mut accounts: Vec<Account> = self.mirror.load(EntityKind::Accounts)?;
        let Some(account) = accounts.iter_mut().find(|a| a.id == account_id) else {
            warn!("Account {account_id} is not in the local mirror; balance left unchanged");
            return Ok(None);
        };

        account.balance = apply_adjustment(account.balance, amount, kind);
        let balance = account.balance;
        self.mirror.save(EntityKind::Accounts, &accounts)?;

        match sync {
            RemoteSync::Await => {
                if let Err(e) = self
                    .remote
                    .update_account_balance(&self.user_id, account_id, balance)
                    .await
                {
                    warn!(
                        "{}: balance update for account {account_id} failed: {e}",
                        self.remote.name()
                    );
                }
            }
            RemoteSync::Background => self.sync.submit(SyncTask::AccountBalance {
                user_id: self.user_id.clone(),
                account_id: account_id.to_string(),
                balance,
            }),
        }

        Ok(Some(balance))
    }

    // ── Goals ───────────────────────────────────────────────────────

    /// Move `amount` from an account into a goal.
    ///
    /// The funding account is the first BANK account that covers the amount,
    /// else the first account of any kind that does. The goal, the accounts
    /// and the balance are all checked before anything is written.
    pub async fn quick_save(&self, goal_id: &str, amount: Decimal) -> Result<QuickSave, CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Quick save amount must be positive".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let goals: Vec<Goal> = self.mirror.load(EntityKind::Goals)?;
        let goal = goals
            .iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Goals.label(), goal_id))?;

        let accounts: Vec<Account> = self.mirror.load(EntityKind::Accounts)?;
        let account_id = select_funding_account(&accounts, amount)?.id.clone();

        let transaction = self
            .add_transaction_locked(
                TransactionDraft::expense(amount, Category::Savings, today())
                    .with_description(format!("Quick save: {}", goal.name))
                    .with_account(account_id.clone()),
            )
            .await?;

        let sync = if transaction.is_degraded() {
            RemoteSync::Background
        } else {
            RemoteSync::Await
        };
        let goal = self.increment_goal_locked(goal_id, amount, sync).await?;

        Ok(QuickSave {
            transaction,
            goal,
            account_id,
        })
    }

    /// Manual top-up of a goal. Goals only ever grow.
    pub async fn contribute_to_goal(
        &self,
        goal_id: &str,
        amount: Decimal,
    ) -> Result<Synced<Goal>, CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Contribution must be positive".into(),
            ));
        }
        let _guard = self.write_lock.lock().await;
        self.increment_goal_locked(goal_id, amount, RemoteSync::Await)
            .await
    }

    async fn increment_goal_locked(
        &self,
        goal_id: &str,
        amount: Decimal,
        sync: RemoteSync,
    ) -> Result<Synced<Goal>, CoreError> {
        let mut goals: Vec<Goal> = self.mirror.load(EntityKind::Goals)?;
        let goal = goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Goals.label(), goal_id))?;

        goal.current_amount += amount;
        let updated = goal.clone();
        self.mirror.save(EntityKind::Goals, &goals)?;

        match sync {
            RemoteSync::Await => match self
                .remote
                .update_goal_amount(&self.user_id, goal_id, updated.current_amount)
                .await
            {
                Ok(()) => Ok(Synced::remote(updated)),
                Err(e) => {
                    warn!(
                        "{}: goal {goal_id} update failed, kept locally: {e}",
                        self.remote.name()
                    );
                    Ok(Synced::local(updated))
                }
            },
            RemoteSync::Background => {
                self.sync.submit(SyncTask::GoalAmount {
                    user_id: self.user_id.clone(),
                    goal_id: goal_id.to_string(),
                    current_amount: updated.current_amount,
                });
                Ok(Synced::local(updated))
            }
        }
    }

    pub async fn add_goal(&self, draft: GoalDraft) -> Result<Synced<Goal>, CoreError> {
        validate_name(&draft.name, "Goal")?;
        if draft.target_amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Goal target amount must be positive".into(),
            ));
        }
        if draft.current_amount < Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Goal current amount must not be negative".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let row = NewGoalRow::from_draft(&draft, &self.user_id);
        self.insert_with_fallback(self.remote.insert_goal(row), |id| draft.into_goal(id))
            .await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.remote.delete_goal(&self.user_id, id).await {
            warn!("{}: delete goal {id} failed: {e}", self.remote.name());
        }
        self.remove_local::<Goal>(id).map(|_| ())
    }

    // ── Local data ──────────────────────────────────────────────────

    /// Drop every mirrored collection for this user. The remote is untouched;
    /// the next successful list repopulates the mirror.
    pub async fn clear_local(&self) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        for kind in EntityKind::ALL {
            self.mirror.clear(kind)?;
        }
        debug!("Cleared local mirror for user {}", self.user_id);
        Ok(())
    }

    // ── Accounts ────────────────────────────────────────────────────

    pub async fn add_account(&self, draft: AccountDraft) -> Result<Synced<Account>, CoreError> {
        validate_name(&draft.name, "Account")?;

        let _guard = self.write_lock.lock().await;
        let row = NewAccountRow::from_draft(&draft, &self.user_id);
        self.insert_with_fallback(self.remote.insert_account(row), |id| draft.into_account(id))
            .await
    }

    /// Remove an account. Transactions referencing it keep the dangling id.
    pub async fn delete_account(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.remote.delete_account(&self.user_id, id).await {
            warn!("{}: delete account {id} failed: {e}", self.remote.name());
        }
        self.remove_local::<Account>(id).map(|_| ())
    }

    // ── Subscriptions ───────────────────────────────────────────────

    pub async fn add_subscription(
        &self,
        draft: SubscriptionDraft,
    ) -> Result<Synced<Subscription>, CoreError> {
        validate_name(&draft.name, "Subscription")?;
        if draft.amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Subscription amount must be positive".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let row = NewSubscriptionRow::from_draft(&draft, &self.user_id);
        self.insert_with_fallback(self.remote.insert_subscription(row), |id| {
            draft.into_subscription(id)
        })
        .await
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.remote.delete_subscription(&self.user_id, id).await {
            warn!("{}: delete subscription {id} failed: {e}", self.remote.name());
        }
        self.remove_local::<Subscription>(id).map(|_| ())
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Remote insert with local fallback, then mirror the record in its
    /// collection's natural position. Caller holds the write lock.
    async fn insert_with_fallback<R, T, F>(
        &self,
        insert: F,
        local: impl FnOnce(String) -> T,
    ) -> Result<Synced<T>, CoreError>
    where
        F: Future<Output = Result<R, CoreError>>,
        T: Record + From<R> + Serialize + DeserializeOwned,
    {
        let kind = T::KIND;
        let mut items: Vec<T> = self.mirror.load(kind)?;

        let synced = match insert.await {
            Ok(row) => Synced::remote(T::from(row)),
            Err(e) => {
                let id = synthesize_id(items.iter().map(|i| i.id()));
                warn!(
                    "{}: insert into {kind} failed, recording locally as {id}: {e}",
                    self.remote.name()
                );
                Synced::local(local(id))
            }
        };

        items.retain(|i| i.id() != synced.value.id());
        T::place(&mut items, synced.value.clone());
        self.mirror.save(kind, &items)?;
        Ok(synced)
    }

    /// Drop `id` from the mirrored collection. The mirror is only rewritten
    /// when something was removed.
    fn remove_local<T>(&self, id: &str) -> Result<Option<T>, CoreError>
    where
        T: Record + Serialize + DeserializeOwned,
    {
        let mut items: Vec<T> = self.mirror.load(T::KIND)?;
        let Some(pos) = items.iter().position(|i| i.id() == id) else {
            debug!("{id} not in local {}; nothing to remove", T::KIND);
            return Ok(None);
        };
        let removed = items.remove(pos);
        self.mirror.save(T::KIND, &items)?;
        Ok(Some(removed))
    }
}

// ── Pure helpers ────────────────────────────────────────────────────

/// `balance` after applying a transaction of `amount` and `kind`.
pub fn apply_adjustment(balance: Decimal, amount: Decimal, kind: TransactionKind) -> Decimal {
    balance + kind.signed(amount)
}

/// First BANK account covering `amount`, else the first account of any kind
/// covering it. Ties go to iteration order.
pub fn select_funding_account(accounts: &[Account], amount: Decimal) -> Result<&Account, CoreError> {
    if accounts.is_empty() {
        return Err(CoreError::NoAccounts);
    }

    accounts
        .iter()
        .find(|a| a.kind == AccountKind::Bank && a.balance >= amount)
        .or_else(|| accounts.iter().find(|a| a.balance >= amount))
        .ok_or_else(|| CoreError::InsufficientBalance {
            required: amount,
            available: accounts
                .iter()
                .map(|a| a.balance)
                .max()
                .unwrap_or(Decimal::ZERO),
        })
}

/// True if a transaction dated `today` has the same amount and the same
/// description ignoring case.
pub fn is_possible_duplicate(
    transactions: &[Transaction],
    amount: Decimal,
    description: &str,
    today: chrono::NaiveDate,
) -> bool {
    let needle = description.to_lowercase();
    transactions.iter().any(|tx| {
        tx.date == today && tx.amount == amount && tx.description.to_lowercase() == needle
    })
}

/// A fresh local identifier not present in `existing`.
pub fn synthesize_id<'a>(existing: impl Iterator<Item = &'a str> + Clone) -> String {
    loop {
        let id = format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4());
        if !existing.clone().any(|e| e == id) {
            return id;
        }
    }
}

fn validate_transaction(draft: &TransactionDraft) -> Result<(), CoreError> {
    if draft.amount <= Decimal::ZERO {
        return Err(CoreError::ValidationError(
            "Transaction amount must be positive".into(),
        ));
    }
    if matches!(&draft.account_id, Some(id) if id.trim().is_empty()) {
        return Err(CoreError::ValidationError(
            "Account reference must not be blank".into(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str, what: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::ValidationError(format!(
            "{what} name must not be empty"
        )));
    }
    Ok(())
}
