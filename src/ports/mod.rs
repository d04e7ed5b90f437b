//! Trait seams between the ledger core and its collaborators: the backing
//! store and the outbound notification/email gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Affiliate, Company, CompanyValuation, HoldingCompany, ShareClass, ShareLot, ShareTransaction,
    ShareTransactionStatus, Transaction, TransactionStatus, User,
};
use crate::error::LedgerResult;

/// Durable backing store for the ledger.
///
/// Registry entities (companies, classes, users, holding companies,
/// valuations) are read-only from the ledger's point of view. All multi-row
/// writes (`commit_purchase`, `commit_sale`) are atomic: a failure partway
/// leaves no partial Transaction/Lot/ShareTransaction state behind, and the
/// oversell check runs inside the same unit so concurrent purchases cannot
/// jointly exceed a class cap.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // -- registry (read-only) --

    async fn company(&self, id: Uuid) -> LedgerResult<Option<Company>>;
    async fn share_class(&self, company_id: Uuid, class_id: Uuid)
        -> LedgerResult<Option<ShareClass>>;
    async fn user(&self, id: Uuid) -> LedgerResult<Option<User>>;
    async fn holding_company(&self, id: Uuid) -> LedgerResult<Option<HoldingCompany>>;
    /// Valuations for a company, newest first.
    async fn valuations_for_company(&self, company_id: Uuid)
        -> LedgerResult<Vec<CompanyValuation>>;

    // -- share lots --

    async fn lot(&self, id: Uuid) -> LedgerResult<Option<ShareLot>>;
    async fn insert_lot(&self, lot: &ShareLot) -> LedgerResult<ShareLot>;
    /// Decrement a lot's remaining shares. `InsufficientShares` when the
    /// quantity exceeds what is left.
    async fn apply_sale(&self, lot_id: Uuid, quantity: i64) -> LedgerResult<ShareLot>;
    /// Lots for a user, restricted to outstanding statuses unless
    /// `include_sold`.
    async fn lots_for_user(&self, user_id: Uuid, include_sold: bool)
        -> LedgerResult<Vec<ShareLot>>;
    async fn lots_for_company(
        &self,
        company_id: Uuid,
        include_sold: bool,
    ) -> LedgerResult<Vec<ShareLot>>;

    // -- transaction log --

    async fn transaction(&self, id: Uuid) -> LedgerResult<Option<Transaction>>;
    async fn record_transaction(&self, tx: &Transaction) -> LedgerResult<Transaction>;
    async fn record_share_transaction(
        &self,
        st: &ShareTransaction,
    ) -> LedgerResult<ShareTransaction>;
    async fn set_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> LedgerResult<Transaction>;
    async fn set_share_transaction_status(
        &self,
        id: Uuid,
        status: ShareTransactionStatus,
    ) -> LedgerResult<ShareTransaction>;
    /// Movement records for a user, oldest first.
    async fn share_transactions_for_user(
        &self,
        user_id: Uuid,
    ) -> LedgerResult<Vec<ShareTransaction>>;
    /// Movement records that have touched a lot, oldest first.
    async fn share_transactions_for_lot(
        &self,
        lot_id: Uuid,
    ) -> LedgerResult<Vec<ShareTransaction>>;

    // -- atomic units --

    /// Availability check plus the purchase triple (payment transaction,
    /// lot, buy share-transaction) in one store transaction. `Oversold` when
    /// the lot's shares exceed what the class still has available.
    async fn commit_purchase(
        &self,
        tx: &Transaction,
        lot: &ShareLot,
        st: &ShareTransaction,
    ) -> LedgerResult<()>;

    /// Sale records plus the lot decrement in one store transaction, keeping
    /// `remaining_shares` consistent with the completed sell log.
    async fn commit_sale(
        &self,
        lot_id: Uuid,
        tx: &Transaction,
        st: &ShareTransaction,
    ) -> LedgerResult<ShareLot>;

    // -- affiliates --

    async fn affiliate_by_code(&self, code: &str) -> LedgerResult<Option<Affiliate>>;
    async fn affiliate_for_user(&self, user_id: Uuid) -> LedgerResult<Option<Affiliate>>;
    async fn upsert_affiliate(&self, affiliate: &Affiliate) -> LedgerResult<Affiliate>;
}

/// Failure talking to an outbound gateway. Never propagated out of the
/// purchase workflow; logged and swallowed there.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(String),

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("gateway circuit breaker open")]
    CircuitOpen,
}

/// Outcome reported by the email gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub success: bool,
    pub error: Option<String>,
}

/// In-app notification delivery, fire-and-forget from the ledger's side.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, title: &str, body: &str) -> Result<(), GatewayError>;
}

/// Transactional email delivery, fire-and-forget from the ledger's side.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<DeliveryReceipt, GatewayError>;
}
