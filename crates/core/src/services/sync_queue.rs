use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::remote::traits::RemoteStore;

/// A remote write that nobody waits for.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncTask {
    AccountBalance {
        user_id: String,
        account_id: String,
        balance: Decimal,
    },
    GoalAmount {
        user_id: String,
        goal_id: String,
        current_amount: Decimal,
    },
}

impl SyncTask {
    fn describe(&self) -> String {
        match self {
            SyncTask::AccountBalance {
                account_id, balance, ..
            } => format!("balance of account {account_id} -> {balance}"),
            SyncTask::GoalAmount {
                goal_id,
                current_amount,
                ..
            } => format!("amount of goal {goal_id} -> {current_amount}"),
        }
    }
}

enum Message {
    Task(SyncTask),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Snapshot of the queue's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncStats {
    /// Tasks submitted but not yet attempted.
    pub fn pending(&self) -> usize {
        self.submitted
            .saturating_sub(self.succeeded)
            .saturating_sub(self.failed)
    }
}

/// Background queue for best-effort remote pushes made while offline.
///
/// Tasks run one at a time, in submission order, on a spawned Tokio task.
/// A failed push is logged and counted, never retried: the next successful
/// `list` overwrites the mirror with whatever the remote holds.
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::UnboundedSender<Message>,
    counters: Arc<Counters>,
}

impl SyncQueue {
    /// Start the worker. Must be called from within a Tokio runtime.
    pub fn spawn(remote: Arc<dyn RemoteStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        tokio::spawn(run_worker(remote, rx, Arc::clone(&counters)));
        Self { tx, counters }
    }

    /// Queue a task without waiting for it.
    pub fn submit(&self, task: SyncTask) {
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        debug!("Queued background sync: {}", task.describe());
        if self.tx.send(Message::Task(task)).is_err() {
            warn!("Background sync worker is gone; dropping task");
            self.counters.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Resolve once every task submitted before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Message::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            submitted: self.counters.submitted.load(Ordering::SeqCst),
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }
}

async fn run_worker(
    remote: Arc<dyn RemoteStore>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    counters: Arc<Counters>,
) {
    while let Some(message) = rx.recv().await {
        let task = match message {
            Message::Task(task) => task,
            Message::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };

        let result = match &task {
            SyncTask::AccountBalance {
                user_id,
                account_id,
                balance,
            } => {
                remote
                    .update_account_balance(user_id, account_id, *balance)
                    .await
            }
            SyncTask::GoalAmount {
                user_id,
                goal_id,
                current_amount,
            } => {
                remote
                    .update_goal_amount(user_id, goal_id, *current_amount)
                    .await
            }
        };

        match result {
            Ok(()) => {
                counters.succeeded.fetch_add(1, Ordering::SeqCst);
                debug!("{}: synced {}", remote.name(), task.describe());
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!("{}: background sync of {} failed: {e}", remote.name(), task.describe());
            }
        }
    }
}
