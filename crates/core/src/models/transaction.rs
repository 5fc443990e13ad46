use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a transaction relative to its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money coming in (adds to the account balance)
    Income,
    /// Money going out (subtracts from the account balance)
    Expense,
}

impl TransactionKind {
    /// Signed form of `amount` as applied to an account balance.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            TransactionKind::Income => TransactionKind::Expense,
            TransactionKind::Expense => TransactionKind::Income,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "INCOME"),
            TransactionKind::Expense => write!(f, "EXPENSE"),
        }
    }
}

/// Closed set of transaction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Food,
    Transport,
    Housing,
    Utilities,
    Health,
    Education,
    Entertainment,
    Shopping,
    Subscriptions,
    Salary,
    Freelance,
    Investment,
    Savings,
    TransferIn,
    TransferOut,
    Other,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Utilities,
        Category::Health,
        Category::Education,
        Category::Entertainment,
        Category::Shopping,
        Category::Subscriptions,
        Category::Salary,
        Category::Freelance,
        Category::Investment,
        Category::Savings,
        Category::TransferIn,
        Category::TransferOut,
        Category::Other,
    ];

    /// Wire name, as stored in the remote `category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "FOOD",
            Category::Transport => "TRANSPORT",
            Category::Housing => "HOUSING",
            Category::Utilities => "UTILITIES",
            Category::Health => "HEALTH",
            Category::Education => "EDUCATION",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Shopping => "SHOPPING",
            Category::Subscriptions => "SUBSCRIPTIONS",
            Category::Salary => "SALARY",
            Category::Freelance => "FREELANCE",
            Category::Investment => "INVESTMENT",
            Category::Savings => "SAVINGS",
            Category::TransferIn => "TRANSFER_IN",
            Category::TransferOut => "TRANSFER_OUT",
            Category::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense entry in the ledger.
///
/// Transactions are immutable once created: the ledger can add and delete
/// them, never edit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque identifier (remote-assigned, or synthesized while offline)
    pub id: String,

    /// Calendar day (no time component)
    pub date: NaiveDate,

    /// Always positive; the direction comes from `kind`
    pub amount: Decimal,

    pub kind: TransactionKind,

    pub category: Category,

    /// Free text, may be empty
    #[serde(default)]
    pub description: String,

    /// Recurring (rent, salary) vs one-off
    #[serde(default)]
    pub is_fixed: bool,

    /// Owning account; `None` means unassigned / cash
    #[serde(default)]
    pub account_id: Option<String>,
}

/// A transaction as submitted by the caller, before an identifier exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl TransactionDraft {
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            date,
            amount,
            kind,
            category,
            description: String::new(),
            is_fixed: false,
            account_id: None,
        }
    }

    pub fn income(amount: Decimal, category: Category, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Income, amount, category, date)
    }

    pub fn expense(amount: Decimal, category: Category, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Expense, amount, category, date)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn fixed(mut self, is_fixed: bool) -> Self {
        self.is_fixed = is_fixed;
        self
    }

    /// Attach an identifier, producing the stored record.
    pub fn into_transaction(self, id: String) -> Transaction {
        Transaction {
            id,
            date: self.date,
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            description: self.description,
            is_fixed: self.is_fixed,
            account_id: self.account_id,
        }
    }
}
