use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A savings goal. `current_amount` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub media_url: Option<String>,
}

impl Goal {
    /// Progress toward the target in percent. Not capped at 100: contributions
    /// past the target are allowed.
    pub fn progress_pct(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.current_amount / self.target_amount * Decimal::ONE_HUNDRED
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Amount still missing; zero once the target is reached.
    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDraft {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub media_url: Option<String>,
}

impl GoalDraft {
    pub fn new(name: impl Into<String>, target_amount: Decimal) -> Self {
        Self {
            name: name.into(),
            target_amount,
            current_amount: Decimal::ZERO,
            deadline: None,
            color: String::new(),
            icon: String::new(),
            media_url: None,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn into_goal(self, id: String) -> Goal {
        Goal {
            id,
            name: self.name,
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            deadline: self.deadline,
            color: self.color,
            icon: self.icon,
            media_url: self.media_url,
        }
    }
}
