use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of money container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Cash,
    Bank,
    Credit,
    Investment,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Cash => write!(f, "CASH"),
            AccountKind::Bank => write!(f, "BANK"),
            AccountKind::Credit => write!(f, "CREDIT"),
            AccountKind::Investment => write!(f, "INVESTMENT"),
        }
    }
}

/// An account with a running balance.
///
/// The balance is maintained incrementally: every transaction added against
/// the account adjusts it once. It is never recomputed from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,

    /// Signed running total
    pub balance: Decimal,

    /// Presentation only
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

/// An account as submitted by the caller, before an identifier exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDraft {
    pub name: String,
    pub kind: AccountKind,
    /// Opening balance
    pub balance: Decimal,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

impl AccountDraft {
    pub fn new(name: impl Into<String>, kind: AccountKind, balance: Decimal) -> Self {
        Self {
            name: name.into(),
            kind,
            balance,
            color: String::new(),
            icon: String::new(),
        }
    }

    pub fn into_account(self, id: String) -> Account {
        Account {
            id,
            name: self.name,
            kind: self.kind,
            balance: self.balance,
            color: self.color,
            icon: self.icon,
        }
    }
}
