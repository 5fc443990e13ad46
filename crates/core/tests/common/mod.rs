// ═══════════════════════════════════════════════════════════════════
// Shared test doubles — scripted remote store, service builders
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use finance_ledger_core::errors::CoreError;
use finance_ledger_core::models::account::AccountKind;
use finance_ledger_core::models::settings::Settings;
use finance_ledger_core::models::transaction::{Category, TransactionKind};
use finance_ledger_core::remote::traits::RemoteStore;
use finance_ledger_core::remote::wire::{
    AccountRow, GoalRow, NewAccountRow, NewGoalRow, NewSubscriptionRow, NewTransactionRow,
    SubscriptionRow, TransactionRow,
};
use finance_ledger_core::services::ledger_service::LedgerService;
use finance_ledger_core::storage::memory::MemoryMirror;
use finance_ledger_core::storage::mirror::UserMirror;

pub const USER: &str = "user-1";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn dec(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

pub fn amount(units: i64) -> Decimal {
    Decimal::from(units)
}

pub fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct Tables {
    transactions: Vec<TransactionRow>,
    accounts: Vec<AccountRow>,
    goals: Vec<GoalRow>,
    subscriptions: Vec<SubscriptionRow>,
}

/// In-memory remote store that can be switched offline, or made to fail
/// individual operations. Records every call by operation name.
pub struct MockRemote {
    tables: Mutex<Tables>,
    online: AtomicBool,
    failing: Mutex<HashSet<&'static str>>,
    next_id: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tables: Mutex::new(Tables::default()),
            online: AtomicBool::new(true),
            failing: Mutex::new(HashSet::new()),
            next_id: AtomicUsize::new(1),
            calls: Mutex::new(Vec::new()),
            fetch_gate: Mutex::new(None),
        })
    }

    pub fn offline() -> Arc<Self> {
        let remote = Self::new();
        remote.set_online(false);
        remote
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn fail_op(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    fn check(&self, op: &'static str) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(op);
        if !self.online.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(op) {
            return Err(CoreError::Network(format!("mock: {op} unavailable")));
        }
        Ok(())
    }

    /// Make `fetch_transactions` stall after reading its rows until the
    /// returned semaphore gets a permit.
    pub fn hold_fetches(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.fetch_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    async fn wait_at_gate(&self) {
        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
    }

    fn new_id(&self) -> String {
        format!("remote-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    // ── seeding & inspection ────────────────────────────────────────

    pub fn seed_account(&self, id: &str, name: &str, kind: AccountKind, balance: Decimal) {
        self.tables.lock().unwrap().accounts.push(AccountRow {
            id: id.into(),
            name: name.into(),
            kind,
            balance,
            color: None,
            icon: None,
            user_id: USER.into(),
        });
    }

    pub fn seed_goal(&self, id: &str, name: &str, target: Decimal, current: Decimal) {
        self.tables.lock().unwrap().goals.push(GoalRow {
            id: id.into(),
            name: name.into(),
            target_amount: target,
            current_amount: current,
            deadline: None,
            color: None,
            icon: None,
            media_url: None,
            user_id: USER.into(),
        });
    }

    pub fn seed_transaction(
        &self,
        id: &str,
        date: NaiveDate,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
    ) {
        self.tables.lock().unwrap().transactions.push(TransactionRow {
            id: id.into(),
            date,
            amount,
            kind,
            category: Category::Other,
            description: Some(description.into()),
            is_fixed: Some(false),
            account_id: None,
            user_id: USER.into(),
        });
    }

    pub fn account_balance(&self, id: &str) -> Option<Decimal> {
        let tables = self.tables.lock().unwrap();
        tables.accounts.iter().find(|a| a.id == id).map(|a| a.balance)
    }

    pub fn goal_amount(&self, id: &str) -> Option<Decimal> {
        let tables = self.tables.lock().unwrap();
        tables.goals.iter().find(|g| g.id == id).map(|g| g.current_amount)
    }

    pub fn transaction_count(&self) -> usize {
        self.tables.lock().unwrap().transactions.len()
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    fn name(&self) -> &str {
        "MockRemote"
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<TransactionRow>, CoreError> {
        self.check("fetch_transactions")?;
        let mut rows: Vec<TransactionRow> = self
            .tables
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        self.wait_at_gate().await;
        Ok(rows)
    }

    async fn insert_transaction(&self, row: NewTransactionRow) -> Result<TransactionRow, CoreError> {
        self.check("insert_transaction")?;
        let created = TransactionRow {
            id: self.new_id(),
            date: row.date,
            amount: row.amount,
            kind: row.kind,
            category: row.category,
            description: Some(row.description),
            is_fixed: Some(row.is_fixed),
            account_id: row.account_id,
            user_id: row.user_id,
        };
        self.tables.lock().unwrap().transactions.push(created.clone());
        Ok(created)
    }

    async fn delete_transaction(&self, _user_id: &str, id: &str) -> Result<(), CoreError> {
        self.check("delete_transaction")?;
        self.tables.lock().unwrap().transactions.retain(|r| r.id != id);
        Ok(())
    }

    async fn fetch_accounts(&self, user_id: &str) -> Result<Vec<AccountRow>, CoreError> {
        self.check("fetch_accounts")?;
        let mut rows: Vec<AccountRow> = self
            .tables
            .lock()
            .unwrap()
            .accounts
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_account(&self, row: NewAccountRow) -> Result<AccountRow, CoreError> {
        self.check("insert_account")?;
        let created = AccountRow {
            id: self.new_id(),
            name: row.name,
            kind: row.kind,
            balance: row.balance,
            color: Some(row.color),
            icon: Some(row.icon),
            user_id: row.user_id,
        };
        self.tables.lock().unwrap().accounts.push(created.clone());
        Ok(created)
    }

    async fn update_account_balance(
        &self,
        _user_id: &str,
        id: &str,
        balance: Decimal,
    ) -> Result<(), CoreError> {
        self.check("update_account_balance")?;
        if let Some(row) = self.tables.lock().unwrap().accounts.iter_mut().find(|a| a.id == id) {
            row.balance = balance;
        }
        Ok(())
    }

    async fn delete_account(&self, _user_id: &str, id: &str) -> Result<(), CoreError> {
        self.check("delete_account")?;
        self.tables.lock().unwrap().accounts.retain(|r| r.id != id);
        Ok(())
    }

    async fn fetch_goals(&self, user_id: &str) -> Result<Vec<GoalRow>, CoreError> {
        self.check("fetch_goals")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .goals
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_goal(&self, row: NewGoalRow) -> Result<GoalRow, CoreError> {
        self.check("insert_goal")?;
        let created = GoalRow {
            id: self.new_id(),
            name: row.name,
            target_amount: row.target_amount,
            current_amount: row.current_amount,
            deadline: row.deadline,
            color: Some(row.color),
            icon: Some(row.icon),
            media_url: row.media_url,
            user_id: row.user_id,
        };
        self.tables.lock().unwrap().goals.push(created.clone());
        Ok(created)
    }

    async fn update_goal_amount(
        &self,
        _user_id: &str,
        id: &str,
        current_amount: Decimal,
    ) -> Result<(), CoreError> {
        self.check("update_goal_amount")?;
        if let Some(row) = self.tables.lock().unwrap().goals.iter_mut().find(|g| g.id == id) {
            row.current_amount = current_amount;
        }
        Ok(())
    }

    async fn delete_goal(&self, _user_id: &str, id: &str) -> Result<(), CoreError> {
        self.check("delete_goal")?;
        self.tables.lock().unwrap().goals.retain(|r| r.id != id);
        Ok(())
    }

    async fn fetch_subscriptions(&self, user_id: &str) -> Result<Vec<SubscriptionRow>, CoreError> {
        self.check("fetch_subscriptions")?;
        let mut rows: Vec<SubscriptionRow> = self
            .tables
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.next_payment_date);
        Ok(rows)
    }

    async fn insert_subscription(
        &self,
        row: NewSubscriptionRow,
    ) -> Result<SubscriptionRow, CoreError> {
        self.check("insert_subscription")?;
        let created = SubscriptionRow {
            id: self.new_id(),
            name: row.name,
            amount: row.amount,
            billing_cycle: row.billing_cycle,
            next_payment_date: row.next_payment_date,
            category: row.category,
            logo_url: row.logo_url,
            user_id: row.user_id,
        };
        self.tables.lock().unwrap().subscriptions.push(created.clone());
        Ok(created)
    }

    async fn delete_subscription(&self, _user_id: &str, id: &str) -> Result<(), CoreError> {
        self.check("delete_subscription")?;
        self.tables.lock().unwrap().subscriptions.retain(|r| r.id != id);
        Ok(())
    }
}

/// A service over `remote` and a fresh memory mirror, plus a typed handle on
/// that mirror for assertions.
pub fn make_service(remote: &Arc<MockRemote>) -> (LedgerService, UserMirror) {
    make_service_with(remote, Settings::default())
}

pub fn make_service_with(remote: &Arc<MockRemote>, settings: Settings) -> (LedgerService, UserMirror) {
    init_logging();
    let backend = Arc::new(MemoryMirror::new());
    let svc = LedgerService::new(
        USER,
        Arc::clone(remote) as Arc<dyn RemoteStore>,
        backend.clone(),
        &settings,
    );
    let mirror = UserMirror::new(backend, settings.mirror_namespace.clone(), USER);
    (svc, mirror)
}
