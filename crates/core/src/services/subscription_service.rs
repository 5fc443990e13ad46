use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::subscription::{BillingCycle, Subscription, UpcomingPayment};

/// Upper bound on projected charges per subscription, so a far-away `to`
/// date can't produce an unbounded list.
const MAX_PROJECTED_PAYMENTS: u32 = 1200;

/// Calendar and upcoming-bills projections over subscriptions.
///
/// Dates are rolled from the stored `next_payment_date` by whole cycles,
/// always counted from that anchor so month-end dates don't drift
/// (Jan 31 → Feb 28 → Mar 31).
pub struct SubscriptionService;

impl SubscriptionService {
    pub fn new() -> Self {
        Self
    }

    /// Cost of one subscription normalized to a month.
    pub fn monthly_cost(&self, subscription: &Subscription) -> Decimal {
        match subscription.billing_cycle {
            BillingCycle::Monthly => subscription.amount,
            BillingCycle::Yearly => (subscription.amount / Decimal::from(12)).round_dp(2),
        }
    }

    pub fn total_monthly_cost(&self, subscriptions: &[Subscription]) -> Decimal {
        subscriptions.iter().map(|s| self.monthly_cost(s)).sum()
    }

    /// First charge on or after `date`.
    pub fn next_due_on_or_after(&self, subscription: &Subscription, date: NaiveDate) -> Option<NaiveDate> {
        (0..MAX_PROJECTED_PAYMENTS)
            .map_while(|k| nth_payment(subscription, k))
            .find(|due| *due >= date)
    }

    /// Charges due within `within_days` of `today` (inclusive), soonest first.
    /// Overdue subscriptions are rolled forward to their next charge.
    pub fn upcoming(
        &self,
        subscriptions: &[Subscription],
        today: NaiveDate,
        within_days: i64,
    ) -> Vec<UpcomingPayment> {
        let mut payments: Vec<UpcomingPayment> = subscriptions
            .iter()
            .filter_map(|sub| {
                let due = self.next_due_on_or_after(sub, today)?;
                let days_until = (due - today).num_days();
                (days_until <= within_days).then(|| UpcomingPayment {
                    subscription_id: sub.id.clone(),
                    name: sub.name.clone(),
                    amount: sub.amount,
                    due_date: due,
                    days_until,
                })
            })
            .collect();

        payments.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.name.cmp(&b.name)));
        payments
    }

    /// Every scheduled charge of `subscription` within `from..=to`.
    pub fn payment_dates(
        &self,
        subscription: &Subscription,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<NaiveDate> {
        if from > to {
            return Vec::new();
        }
        (0..MAX_PROJECTED_PAYMENTS)
            .map_while(|k| nth_payment(subscription, k))
            .take_while(|due| *due <= to)
            .filter(|due| *due >= from)
            .collect()
    }
}

impl Default for SubscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

fn nth_payment(subscription: &Subscription, k: u32) -> Option<NaiveDate> {
    let months = match subscription.billing_cycle {
        BillingCycle::Monthly => k,
        BillingCycle::Yearly => k.checked_mul(12)?,
    };
    subscription
        .next_payment_date
        .checked_add_months(Months::new(months))
}
