use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::ledger::EntityKind;
use crate::models::settings::RemoteSettings;

use super::traits::RemoteStore;
use super::wire::{
    AccountRow, GoalRow, NewAccountRow, NewGoalRow, NewSubscriptionRow, NewTransactionRow,
    SubscriptionRow, TransactionRow,
};

const STORE_NAME: &str = "Rest";
const REST_PATH: &str = "/rest/v1";

/// Remote store backed by a hosted Postgres exposed through a PostgREST-style
/// HTTP API.
///
/// - **Reads**: `GET /rest/v1/<table>?user_id=eq.<id>&order=<key>`
/// - **Inserts**: `POST` with `Prefer: return=representation`, the created row
///   (with its canonical id) comes back in the body.
/// - **Updates**: `PATCH ...?id=eq.<id>&user_id=eq.<user>`
/// - **Deletes**: `DELETE ...?id=eq.<id>&user_id=eq.<user>`; deleting a missing
///   row succeeds.
///
/// Every request carries the project API key plus a bearer token (the user's
/// session token, or the API key when none is configured).
pub struct RestRemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

#[derive(Serialize)]
struct BalancePatch {
    #[serde(with = "rust_decimal::serde::float")]
    balance: Decimal,
}

#[derive(Serialize)]
struct GoalAmountPatch {
    #[serde(with = "rust_decimal::serde::float")]
    current_amount: Decimal,
}

impl RestRemoteStore {
    pub fn new(settings: &RemoteSettings) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            access_token: settings
                .access_token
                .clone()
                .unwrap_or_else(|| settings.api_key.clone()),
        })
    }

    /// Replace the bearer token, e.g. after the user signs in.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    fn table_url(&self, kind: EntityKind) -> String {
        format!("{}{REST_PATH}/{}", self.base_url, kind.table())
    }

    fn request(&self, method: Method, kind: EntityKind) -> RequestBuilder {
        self.client
            .request(method, self.table_url(kind))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
    }

    /// Turn non-2xx responses into `CoreError::Remote` carrying the body text.
    async fn check(resp: Response, kind: EntityKind, op: &str) -> Result<Response, CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CoreError::Remote {
            store: STORE_NAME.into(),
            message: format!("{op} {kind} failed with HTTP {status}: {body}"),
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        user_id: &str,
    ) -> Result<Vec<T>, CoreError> {
        let resp = self
            .request(Method::GET, kind)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq_filter(user_id)),
                ("order", natural_order(kind).to_string()),
            ])
            .send()
            .await?;

        Self::check(resp, kind, "select")
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Remote {
                store: STORE_NAME.into(),
                message: format!("Failed to parse {kind} rows: {e}"),
            })
    }

    async fn insert<B, T>(&self, kind: EntityKind, body: &B) -> Result<T, CoreError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let resp = self
            .request(Method::POST, kind)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let mut rows: Vec<T> = Self::check(resp, kind, "insert")
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Remote {
                store: STORE_NAME.into(),
                message: format!("Failed to parse inserted {kind} row: {e}"),
            })?;

        if rows.is_empty() {
            return Err(CoreError::Remote {
                store: STORE_NAME.into(),
                message: format!("Insert into {kind} returned no rows"),
            });
        }
        Ok(rows.swap_remove(0))
    }

    async fn patch<B: Serialize + Sync>(
        &self,
        kind: EntityKind,
        user_id: &str,
        id: &str,
        body: &B,
    ) -> Result<(), CoreError> {
        let resp = self
            .request(Method::PATCH, kind)
            .query(&[("id", eq_filter(id)), ("user_id", eq_filter(user_id))])
            .json(body)
            .send()
            .await?;
        Self::check(resp, kind, "update").await?;
        debug!("{STORE_NAME}: updated {kind} {id}");
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, user_id: &str, id: &str) -> Result<(), CoreError> {
        let resp = self
            .request(Method::DELETE, kind)
            .query(&[("id", eq_filter(id)), ("user_id", eq_filter(user_id))])
            .send()
            .await?;
        Self::check(resp, kind, "delete").await?;
        debug!("{STORE_NAME}: deleted {kind} {id}");
        Ok(())
    }
}

fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

/// Natural ordering of each table as returned by `select`.
fn natural_order(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Transactions => "date.desc",
        EntityKind::Accounts => "name.asc",
        EntityKind::Goals => "name.asc",
        EntityKind::Subscriptions => "next_payment_date.asc",
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    fn name(&self) -> &str {
        STORE_NAME
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<TransactionRow>, CoreError> {
        self.select(EntityKind::Transactions, user_id).await
    }

    async fn insert_transaction(&self, row: NewTransactionRow) -> Result<TransactionRow, CoreError> {
        self.insert(EntityKind::Transactions, &row).await
    }

    async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<(), CoreError> {
        self.delete(EntityKind::Transactions, user_id, id).await
    }

    async fn fetch_accounts(&self, user_id: &str) -> Result<Vec<AccountRow>, CoreError> {
        self.select(EntityKind::Accounts, user_id).await
    }

    async fn insert_account(&self, row: NewAccountRow) -> Result<AccountRow, CoreError> {
        self.insert(EntityKind::Accounts, &row).await
    }

    async fn update_account_balance(
        &self,
        user_id: &str,
        id: &str,
        balance: Decimal,
    ) -> Result<(), CoreError> {
        self.patch(EntityKind::Accounts, user_id, id, &BalancePatch { balance })
            .await
    }

    async fn delete_account(&self, user_id: &str, id: &str) -> Result<(), CoreError> {
        self.delete(EntityKind::Accounts, user_id, id).await
    }

    async fn fetch_goals(&self, user_id: &str) -> Result<Vec<GoalRow>, CoreError> {
        self.select(EntityKind::Goals, user_id).await
    }

    async fn insert_goal(&self, row: NewGoalRow) -> Result<GoalRow, CoreError> {
        self.insert(EntityKind::Goals, &row).await
    }

    async fn update_goal_amount(
        &self,
        user_id: &str,
        id: &str,
        current_amount: Decimal,
    ) -> Result<(), CoreError> {
        self.patch(
            EntityKind::Goals,
            user_id,
            id,
            &GoalAmountPatch { current_amount },
        )
        .await
    }

    async fn delete_goal(&self, user_id: &str, id: &str) -> Result<(), CoreError> {
        self.delete(EntityKind::Goals, user_id, id).await
    }

    async fn fetch_subscriptions(&self, user_id: &str) -> Result<Vec<SubscriptionRow>, CoreError> {
        self.select(EntityKind::Subscriptions, user_id).await
    }

    async fn insert_subscription(
        &self,
        row: NewSubscriptionRow,
    ) -> Result<SubscriptionRow, CoreError> {
        self.insert(EntityKind::Subscriptions, &row).await
    }

    async fn delete_subscription(&self, user_id: &str, id: &str) -> Result<(), CoreError> {
        self.delete(EntityKind::Subscriptions, user_id, id).await
    }
}
