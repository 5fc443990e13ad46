use serde::{Deserialize, Serialize};

/// The four collections that make up a user's ledger.
///
/// Each kind maps to one remote table and one local mirror namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Transactions,
    Accounts,
    Goals,
    Subscriptions,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Transactions,
        EntityKind::Accounts,
        EntityKind::Goals,
        EntityKind::Subscriptions,
    ];

    /// Remote table name, also used as the mirror key suffix.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Transactions => "transactions",
            EntityKind::Accounts => "accounts",
            EntityKind::Goals => "goals",
            EntityKind::Subscriptions => "subscriptions",
        }
    }

    /// Singular label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Transactions => "Transaction",
            EntityKind::Accounts => "Account",
            EntityKind::Goals => "Goal",
            EntityKind::Subscriptions => "Subscription",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// The remote store answered; the value is canonical.
    Remote,
    /// The remote store failed; the value comes from (or was written only to)
    /// the local mirror.
    LocalMirror,
}

/// A value tagged with the store that produced it.
///
/// `is_degraded()` is the signal the UI uses to show a "working offline"
/// indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct Synced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Synced<T> {
    pub fn remote(value: T) -> Self {
        Self {
            value,
            source: DataSource::Remote,
        }
    }

    pub fn local(value: T) -> Self {
        Self {
            value,
            source: DataSource::LocalMirror,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.source == DataSource::LocalMirror
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Synced<U> {
        Synced {
            value: f(self.value),
            source: self.source,
        }
    }
}

/// A ledger record stored in the mirror as part of a per-kind list.
pub trait Record: Clone {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Insert `item` where the collection's natural order puts it.
    fn place(items: &mut Vec<Self>, item: Self);
}

impl Record for super::transaction::Transaction {
    const KIND: EntityKind = EntityKind::Transactions;

    fn id(&self) -> &str {
        &self.id
    }

    /// Newest entry goes first, regardless of its date.
    fn place(items: &mut Vec<Self>, item: Self) {
        items.insert(0, item);
    }
}

impl Record for super::account::Account {
    const KIND: EntityKind = EntityKind::Accounts;

    fn id(&self) -> &str {
        &self.id
    }

    fn place(items: &mut Vec<Self>, item: Self) {
        let pos = items.partition_point(|a| a.name <= item.name);
        items.insert(pos, item);
    }
}

impl Record for super::goal::Goal {
    const KIND: EntityKind = EntityKind::Goals;

    fn id(&self) -> &str {
        &self.id
    }

    fn place(items: &mut Vec<Self>, item: Self) {
        let pos = items.partition_point(|g| g.name <= item.name);
        items.insert(pos, item);
    }
}

impl Record for super::subscription::Subscription {
    const KIND: EntityKind = EntityKind::Subscriptions;

    fn id(&self) -> &str {
        &self.id
    }

    fn place(items: &mut Vec<Self>, item: Self) {
        let pos = items.partition_point(|s| s.next_payment_date <= item.next_payment_date);
        items.insert(pos, item);
    }
}
