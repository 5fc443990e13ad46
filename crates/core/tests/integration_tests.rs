// ═══════════════════════════════════════════════════════════════════
// Integration Tests — FinanceLedger facade end to end
// ═══════════════════════════════════════════════════════════════════

mod common;

use chrono::Duration;
use rust_decimal::Decimal;
use std::sync::Arc;

use common::*;
use finance_ledger_core::errors::CoreError;
use finance_ledger_core::models::account::{AccountDraft, AccountKind};
use finance_ledger_core::models::settings::Settings;
use finance_ledger_core::models::subscription::{BillingCycle, SubscriptionDraft};
use finance_ledger_core::models::goal::GoalDraft;
use finance_ledger_core::models::transaction::{Category, TransactionDraft, TransactionKind};
use finance_ledger_core::remote::offline::OfflineRemoteStore;
use finance_ledger_core::remote::traits::RemoteStore;
use finance_ledger_core::storage::memory::MemoryMirror;
use finance_ledger_core::{today, FinanceLedger};

fn ledger_over(remote: &Arc<MockRemote>) -> FinanceLedger {
    init_logging();
    FinanceLedger::with_stores(
        USER,
        Arc::clone(remote) as Arc<dyn RemoteStore>,
        Arc::new(MemoryMirror::new()),
        &Settings::default(),
    )
}

// ═══════════════════════════════════════════════════════════════════
// Loading & degraded mode
// ═══════════════════════════════════════════════════════════════════

mod loading {
    use super::*;

    #[tokio::test]
    async fn load_fills_every_collection() {
        let remote = MockRemote::new();
        remote.seed_account("a1", "Checking", AccountKind::Bank, amount(500));
        remote.seed_goal("g1", "Trip", amount(1000), amount(0));
        remote.seed_transaction("t1", make_date(2025, 3, 1), TransactionKind::Income, amount(10), "Gift");
        let mut ledger = ledger_over(&remote);

        ledger.load().await;

        assert!(!ledger.is_offline());
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.accounts().len(), 1);
        assert_eq!(ledger.goals().len(), 1);
        assert!(ledger.subscriptions().is_empty());
        assert_eq!(ledger.get_account("a1").map(|a| a.balance), Some(amount(500)));
        assert!(ledger.get_goal("missing").is_none());
    }

    #[tokio::test]
    async fn losing_the_remote_keeps_the_data() {
        let remote = MockRemote::new();
        remote.seed_account("a1", "Checking", AccountKind::Bank, amount(500));
        let mut ledger = ledger_over(&remote);
        ledger.load().await;

        remote.set_online(false);
        ledger.load().await;

        assert!(ledger.is_offline());
        assert_eq!(ledger.total_balance(), amount(500));
    }

    #[tokio::test]
    async fn offline_stub_reports_offline() {
        let store = OfflineRemoteStore::new();
        assert!(matches!(store.fetch_goals(USER).await, Err(CoreError::Offline)));
        assert_eq!(store.name(), "Offline");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Mutations through the facade
// ═══════════════════════════════════════════════════════════════════

mod mutations {
    use super::*;

    #[tokio::test]
    async fn month_of_activity_summarizes() {
        let remote = MockRemote::new();
        remote.seed_account("a1", "Checking", AccountKind::Bank, amount(0));
        let mut ledger = ledger_over(&remote);
        ledger.load().await;
        let day = make_date(2025, 3, 1);

        ledger
            .add_transaction(TransactionDraft::income(amount(1000), Category::Salary, day).with_account("a1"))
            .await
            .unwrap();
        ledger
            .add_transaction(
                TransactionDraft::expense(amount(300), Category::Housing, day)
                    .fixed(true)
                    .with_account("a1"),
            )
            .await
            .unwrap();
        ledger
            .add_transaction(TransactionDraft::expense(amount(100), Category::Food, day).with_account("a1"))
            .await
            .unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.total_income, amount(1000));
        assert_eq!(summary.total_expense, amount(400));
        assert_eq!(summary.balance, amount(600));
        assert_eq!(summary.fixed_expenses, amount(300));
        assert_eq!(summary.variable_expenses, amount(100));
        assert_eq!(summary.savings_rate, amount(60));

        assert_eq!(ledger.total_balance(), amount(600));
        assert_eq!(ledger.expenses_by_category()[0].category, Category::Housing);
        assert_eq!(ledger.monthly_totals(2025)[2].expense, amount(400));
        assert_eq!(
            ledger
                .summary_for_period(make_date(2025, 4, 1), make_date(2025, 4, 30))
                .transaction_count,
            0
        );
    }

    #[tokio::test]
    async fn snapshot_follows_delete() {
        let remote = MockRemote::new();
        let mut ledger = ledger_over(&remote);
        let added = ledger
            .add_transaction(TransactionDraft::expense(amount(5), Category::Food, today()).with_description("Coffee"))
            .await
            .unwrap();
        assert!(ledger.check_possible_duplicate(amount(5), "coffee"));

        ledger.delete_transaction(&added.value.id).await.unwrap();

        assert!(ledger.transactions().is_empty());
        assert!(!ledger.check_possible_duplicate(amount(5), "coffee"));
    }

    #[tokio::test]
    async fn quick_save_updates_three_snapshots() {
        let remote = MockRemote::new();
        remote.seed_account("a1", "Checking", AccountKind::Bank, amount(500));
        remote.seed_goal("g1", "Trip", amount(1000), amount(100));
        let mut ledger = ledger_over(&remote);
        ledger.load().await;

        ledger.quick_save("g1", amount(50)).await.unwrap();

        assert_eq!(ledger.get_goal("g1").map(|g| g.current_amount), Some(amount(150)));
        assert_eq!(ledger.get_account("a1").map(|a| a.balance), Some(amount(450)));
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.transactions()[0].category, Category::Savings);
    }

    #[tokio::test]
    async fn failed_quick_save_leaves_snapshots_alone() {
        let remote = MockRemote::new();
        remote.seed_account("a1", "Checking", AccountKind::Bank, amount(10));
        remote.seed_goal("g1", "Trip", amount(1000), amount(100));
        let mut ledger = ledger_over(&remote);
        ledger.load().await;

        let err = ledger.quick_save("g1", amount(20)).await.unwrap_err();

        assert!(matches!(err, CoreError::InsufficientBalance { .. }));
        assert_eq!(ledger.get_goal("g1").map(|g| g.current_amount), Some(amount(100)));
        assert!(ledger.transactions().is_empty());
    }

    #[tokio::test]
    async fn transfer_and_goal_contribution() {
        let remote = MockRemote::new();
        let mut ledger = ledger_over(&remote);
        let bank = ledger
            .add_account(AccountDraft::new("Bank", AccountKind::Bank, amount(300)))
            .await
            .unwrap()
            .into_inner();
        let cash = ledger
            .add_account(AccountDraft::new("Cash", AccountKind::Cash, amount(0)))
            .await
            .unwrap()
            .into_inner();
        let goal = ledger
            .add_goal(GoalDraft::new("Bike", amount(400)))
            .await
            .unwrap()
            .into_inner();

        ledger.transfer(&bank.id, &cash.id, amount(120)).await.unwrap();
        ledger.contribute_to_goal(&goal.id, amount(40)).await.unwrap();

        assert_eq!(ledger.get_account(&bank.id).map(|a| a.balance), Some(amount(180)));
        assert_eq!(ledger.get_account(&cash.id).map(|a| a.balance), Some(amount(120)));
        assert_eq!(ledger.total_balance(), amount(300));
        assert_eq!(ledger.get_goal(&goal.id).map(|g| g.current_amount), Some(amount(40)));

        ledger.delete_goal(&goal.id).await.unwrap();
        ledger.delete_account(&cash.id).await.unwrap();
        assert!(ledger.goals().is_empty());
        assert_eq!(ledger.accounts().len(), 1);
    }

    #[tokio::test]
    async fn subscriptions_feed_upcoming_payments() {
        let remote = MockRemote::new();
        let mut ledger = ledger_over(&remote);
        let soon = ledger
            .add_subscription(SubscriptionDraft {
                name: "Music".into(),
                amount: dec(999, 2),
                billing_cycle: BillingCycle::Monthly,
                next_payment_date: today() + Duration::days(3),
                category: Category::Subscriptions,
                logo_url: None,
            })
            .await
            .unwrap()
            .into_inner();
        ledger
            .add_subscription(SubscriptionDraft {
                name: "Domain".into(),
                amount: amount(24),
                billing_cycle: BillingCycle::Yearly,
                next_payment_date: today() + Duration::days(200),
                category: Category::Subscriptions,
                logo_url: None,
            })
            .await
            .unwrap();

        let upcoming = ledger.upcoming_payments(7);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].subscription_id, soon.id);
        assert_eq!(upcoming[0].days_until, 3);
        assert_eq!(ledger.monthly_subscription_cost(), dec(1199, 2));

        ledger.delete_subscription(&soon.id).await.unwrap();
        assert_eq!(ledger.subscriptions().len(), 1);
    }

    #[tokio::test]
    async fn offline_writes_reach_sync_stats() {
        let remote = MockRemote::new();
        remote.seed_account("a1", "Checking", AccountKind::Bank, amount(100));
        let mut ledger = ledger_over(&remote);
        ledger.load().await;
        remote.set_online(false);

        ledger
            .add_transaction(TransactionDraft::expense(amount(30), Category::Food, today()).with_account("a1"))
            .await
            .unwrap();
        ledger.flush_sync().await;

        let stats = ledger.sync_stats();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(ledger.total_balance(), amount(70));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Construction from settings
// ═══════════════════════════════════════════════════════════════════

mod connect {
    use super::*;

    #[tokio::test]
    async fn default_settings_run_offline_in_memory() {
        init_logging();
        let mut ledger = FinanceLedger::connect(&Settings::default(), USER).unwrap();
        ledger.load().await;
        assert!(ledger.is_offline());

        let account = ledger
            .add_account(AccountDraft::new("Wallet", AccountKind::Cash, amount(20)))
            .await
            .unwrap();

        assert!(account.is_degraded());
        assert_eq!(ledger.accounts().len(), 1);
    }

    #[tokio::test]
    async fn file_mirror_survives_restart() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            mirror_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };

        {
            let mut ledger = FinanceLedger::connect(&settings, USER).unwrap();
            ledger
                .add_transaction(TransactionDraft::income(amount(42), Category::Freelance, make_date(2025, 2, 2)))
                .await
                .unwrap();
        }

        let mut reopened = FinanceLedger::connect(&settings, USER).unwrap();
        reopened.load().await;
        assert!(reopened.is_offline());
        assert_eq!(reopened.transactions().len(), 1);
        assert_eq!(reopened.transactions()[0].amount, amount(42));

        let mut other_user = FinanceLedger::connect(&settings, "user-2").unwrap();
        other_user.load().await;
        assert!(other_user.transactions().is_empty());
    }

    #[tokio::test]
    async fn clearing_local_data_forgets_only_this_user() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            mirror_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let draft = || TransactionDraft::income(amount(42), Category::Freelance, make_date(2025, 2, 2));

        let mut mine = FinanceLedger::connect(&settings, USER).unwrap();
        mine.add_transaction(draft()).await.unwrap();
        let mut theirs = FinanceLedger::connect(&settings, "user-2").unwrap();
        theirs.add_transaction(draft()).await.unwrap();

        mine.clear_local_data().await.unwrap();
        assert!(mine.transactions().is_empty());
        assert!(mine.accounts().is_empty());

        let mut reopened = FinanceLedger::connect(&settings, USER).unwrap();
        reopened.load().await;
        assert!(reopened.transactions().is_empty());

        theirs.load().await;
        assert_eq!(theirs.transactions().len(), 1);
    }

    #[tokio::test]
    async fn encrypted_mirror_needs_a_directory() {
        let err = FinanceLedger::connect_encrypted(&Settings::default(), USER, "pass").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let settings = Settings {
            mirror_namespace: String::new(),
            ..Settings::default()
        };
        assert!(matches!(
            FinanceLedger::connect(&settings, USER),
            Err(CoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn encrypted_mirror_round_trip() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            mirror_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };

        {
            let mut ledger = FinanceLedger::connect_encrypted(&settings, USER, "s3cret").unwrap();
            ledger
                .add_goal(GoalDraft::new("House", Decimal::from(50_000)))
                .await
                .unwrap();
        }

        let mut reopened = FinanceLedger::connect_encrypted(&settings, USER, "s3cret").unwrap();
        reopened.load().await;
        assert_eq!(reopened.goals().len(), 1);
        assert_eq!(reopened.goals()[0].name, "House");
    }
}
