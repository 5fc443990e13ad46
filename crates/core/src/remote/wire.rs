//! Row shapes exchanged with the remote store.
//!
//! Field names are the remote schema and must not change. Decimals travel as
//! JSON numbers; identifiers may arrive as strings or integers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::account::{Account, AccountDraft, AccountKind};
use crate::models::goal::{Goal, GoalDraft};
use crate::models::subscription::{BillingCycle, Subscription, SubscriptionDraft};
use crate::models::transaction::{Category, Transaction, TransactionDraft, TransactionKind};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn id_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

// ── transactions ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_fixed: Option<bool>,
    #[serde(default, deserialize_with = "optional_id")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransactionRow {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Category,
    pub description: String,
    pub is_fixed: bool,
    pub account_id: Option<String>,
    pub user_id: String,
}

impl NewTransactionRow {
    pub fn from_draft(draft: &TransactionDraft, user_id: &str) -> Self {
        Self {
            date: draft.date,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            description: draft.description.clone(),
            is_fixed: draft.is_fixed,
            account_id: draft.account_id.clone(),
            user_id: user_id.to_string(),
        }
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            date: row.date,
            amount: row.amount,
            kind: row.kind,
            category: row.category,
            description: row.description.unwrap_or_default(),
            is_fixed: row.is_fixed.unwrap_or(false),
            account_id: row.account_id.filter(|id| !id.is_empty()),
        }
    }
}

// ── accounts ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRow {
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccountRow {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub color: String,
    pub icon: String,
    pub user_id: String,
}

impl NewAccountRow {
    pub fn from_draft(draft: &AccountDraft, user_id: &str) -> Self {
        Self {
            name: draft.name.clone(),
            kind: draft.kind,
            balance: draft.balance,
            color: draft.color.clone(),
            icon: draft.icon.clone(),
            user_id: user_id.to_string(),
        }
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            kind: row.kind,
            balance: row.balance,
            color: row.color.unwrap_or_default(),
            icon: row.icon.unwrap_or_default(),
        }
    }
}

// ── goals ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRow {
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_amount: Decimal,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGoalRow {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub color: String,
    pub icon: String,
    pub media_url: Option<String>,
    pub user_id: String,
}

impl NewGoalRow {
    pub fn from_draft(draft: &GoalDraft, user_id: &str) -> Self {
        Self {
            name: draft.name.clone(),
            target_amount: draft.target_amount,
            current_amount: draft.current_amount,
            deadline: draft.deadline,
            color: draft.color.clone(),
            icon: draft.icon.clone(),
            media_url: draft.media_url.clone(),
            user_id: user_id.to_string(),
        }
    }
}

impl From<GoalRow> for Goal {
    fn from(row: GoalRow) -> Self {
        Goal {
            id: row.id,
            name: row.name,
            target_amount: row.target_amount,
            current_amount: row.current_amount,
            deadline: row.deadline,
            color: row.color.unwrap_or_default(),
            icon: row.icon.unwrap_or_default(),
            media_url: row.media_url.filter(|url| !url.is_empty()),
        }
    }
}

// ── subscriptions ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub billing_cycle: BillingCycle,
    pub next_payment_date: NaiveDate,
    pub category: Category,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSubscriptionRow {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub billing_cycle: BillingCycle,
    pub next_payment_date: NaiveDate,
    pub category: Category,
    pub logo_url: Option<String>,
    pub user_id: String,
}

impl NewSubscriptionRow {
    pub fn from_draft(draft: &SubscriptionDraft, user_id: &str) -> Self {
        Self {
            name: draft.name.clone(),
            amount: draft.amount,
            billing_cycle: draft.billing_cycle,
            next_payment_date: draft.next_payment_date,
            category: draft.category,
            logo_url: draft.logo_url.clone(),
            user_id: user_id.to_string(),
        }
    }
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            name: row.name,
            amount: row.amount,
            billing_cycle: row.billing_cycle,
            next_payment_date: row.next_payment_date,
            category: row.category,
            logo_url: row.logo_url.filter(|url| !url.is_empty()),
        }
    }
}
