#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use uuid::Uuid;

use shareledger_core::adapters::InMemoryLedgerStore;
use shareledger_core::domain::{
    Company, Identifier, ShareClass, ShareLot, ShareTransaction, ShareTransactionKind,
    Transaction, TransactionKind, User,
};
use shareledger_core::ports::{DeliveryReceipt, GatewayError, LedgerStore, Mailer, Notifier};
use shareledger_core::services::PurchaseInput;
use shareledger_core::Ledger;

pub struct NoopGateway;

#[async_trait]
impl Notifier for NoopGateway {
    async fn notify(&self, _user_id: Uuid, _title: &str, _body: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl Mailer for NoopGateway {
    async fn send_email(
        &self,
        _to: &str,
        _subject: &str,
        _text: &str,
        _html: &str,
    ) -> Result<DeliveryReceipt, GatewayError> {
        Ok(DeliveryReceipt {
            success: true,
            error: None,
        })
    }
}

pub struct FailingGateway;

#[async_trait]
impl Notifier for FailingGateway {
    async fn notify(&self, _user_id: Uuid, _title: &str, _body: &str) -> Result<(), GatewayError> {
        Err(GatewayError::Request("gateway down".to_string()))
    }
}

#[async_trait]
impl Mailer for FailingGateway {
    async fn send_email(
        &self,
        _to: &str,
        _subject: &str,
        _text: &str,
        _html: &str,
    ) -> Result<DeliveryReceipt, GatewayError> {
        Err(GatewayError::Request("gateway down".to_string()))
    }
}

pub struct TestContext {
    pub store: Arc<InMemoryLedgerStore>,
    pub ledger: Ledger,
}

pub fn setup() -> TestContext {
    let store = Arc::new(InMemoryLedgerStore::new());
    let ledger = Ledger::new(store.clone(), Arc::new(NoopGateway), Arc::new(NoopGateway));
    TestContext { store, ledger }
}

pub fn setup_with_failing_gateway() -> TestContext {
    let store = Arc::new(InMemoryLedgerStore::new());
    let ledger = Ledger::new(store.clone(), Arc::new(FailingGateway), Arc::new(FailingGateway));
    TestContext { store, ledger }
}

pub fn seed_company_with_class(
    store: &InMemoryLedgerStore,
    total_shares: i64,
    share_price: i64,
) -> (Company, ShareClass) {
    let company = Company::new("Fjordkraft Ventures AS", "987654321");
    let share_class = ShareClass::new(
        company.id,
        "Ordinary",
        total_shares,
        BigDecimal::from(share_price),
    );
    store.seed_company(company.clone());
    store.seed_share_class(share_class.clone());
    (company, share_class)
}

pub fn seed_user(store: &InMemoryLedgerStore, name: &str) -> User {
    let user = User::new(name, format!("{}@example.com", name.to_lowercase().replace(' ', ".")));
    store.seed_user(user.clone());
    user
}

pub fn purchase_input(user: &User, share_class: &ShareClass, quantity: i64) -> PurchaseInput {
    PurchaseInput {
        user_id: user.id,
        company_id: share_class.company_id,
        share_class_id: share_class.id,
        identifier: Identifier::ssn("12345678901"),
        quantity,
        holding_company_id: None,
        payment_method: "card".to_string(),
        currency: "NOK".to_string(),
    }
}

/// Commit a purchase triple dated `days_ago` in the past, bypassing the
/// workflow so chart tests control the event dates.
pub async fn commit_backdated_purchase(
    store: &InMemoryLedgerStore,
    user: &User,
    share_class: &ShareClass,
    quantity: i64,
    price: i64,
    days_ago: i64,
) -> (Transaction, ShareLot, ShareTransaction) {
    let when = Utc::now() - Duration::days(days_ago);
    let price = BigDecimal::from(price);

    let mut tx = Transaction::new(
        user.id,
        "card",
        TransactionKind::SharesPurchase,
        BigDecimal::from(quantity) * &price,
        "NOK",
        None,
    );
    tx.created_at = when;
    tx.updated_at = when;

    let mut lot = ShareLot::new(
        user.id,
        share_class.company_id,
        share_class.id,
        None,
        Identifier::ssn("12345678901"),
        quantity,
        price.clone(),
    );
    lot.purchase_date = when;
    lot.created_at = when;
    lot.updated_at = when;

    let mut st = ShareTransaction::new(
        lot.id,
        tx.id,
        user.id,
        share_class.company_id,
        share_class.id,
        ShareTransactionKind::Buy,
        quantity,
        price,
        when,
    )
    .expect("valid quantity");
    st.created_at = when;

    store
        .commit_purchase(&tx, &lot, &st)
        .await
        .expect("backdated purchase commits");
    (tx, lot, st)
}
