use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingCycle::Monthly => write!(f, "MONTHLY"),
            BillingCycle::Yearly => write!(f, "YEARLY"),
        }
    }
}

/// A recurring bill. Read-mostly: used for the calendar and upcoming-bills
/// views, never touches account balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub billing_cycle: BillingCycle,
    pub next_payment_date: NaiveDate,
    pub category: Category,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDraft {
    pub name: String,
    pub amount: Decimal,
    pub billing_cycle: BillingCycle,
    pub next_payment_date: NaiveDate,
    pub category: Category,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl SubscriptionDraft {
    pub fn into_subscription(self, id: String) -> Subscription {
        Subscription {
            id,
            name: self.name,
            amount: self.amount,
            billing_cycle: self.billing_cycle,
            next_payment_date: self.next_payment_date,
            category: self.category,
            logo_url: self.logo_url,
        }
    }
}

/// A projected charge of one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingPayment {
    pub subscription_id: String,
    pub name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    /// Days from the reference date; 0 means due today
    pub days_until: i64,
}
