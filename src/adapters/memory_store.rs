//! In-process implementation of [`LedgerStore`].
//!
//! Serializes every operation through one mutex, so the availability check
//! and the purchase writes are atomic the same way the Postgres adapter's
//! row-locked transaction is. Suitable for tests and single-process
//! embedding, not for multi-process deployments.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Affiliate, Company, CompanyValuation, HoldingCompany, ShareClass, ShareLot, ShareTransaction,
    ShareTransactionStatus, Transaction, TransactionStatus, User,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::LedgerStore;
use crate::validation;

#[derive(Default)]
struct Inner {
    companies: HashMap<Uuid, Company>,
    share_classes: HashMap<Uuid, ShareClass>,
    users: HashMap<Uuid, User>,
    holding_companies: HashMap<Uuid, HoldingCompany>,
    valuations: Vec<CompanyValuation>,
    lots: HashMap<Uuid, ShareLot>,
    transactions: HashMap<Uuid, Transaction>,
    share_transactions: Vec<ShareTransaction>,
    affiliates: HashMap<Uuid, Affiliate>,
}

impl Inner {
    fn issued_in_class(&self, share_class_id: Uuid) -> i64 {
        self.lots
            .values()
            .filter(|l| l.share_class_id == share_class_id && l.status.is_outstanding())
            .map(|l| l.remaining_shares)
            .sum()
    }
}

#[derive(Default)]
pub struct InMemoryLedgerStore {
    inner: Mutex<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Registry seeding. The ledger never writes these; tests and embedding
    // applications do.

    pub fn seed_company(&self, company: Company) {
        self.lock().companies.insert(company.id, company);
    }

    pub fn seed_share_class(&self, share_class: ShareClass) {
        self.lock().share_classes.insert(share_class.id, share_class);
    }

    pub fn seed_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    pub fn seed_holding_company(&self, holding_company: HoldingCompany) {
        self.lock()
            .holding_companies
            .insert(holding_company.id, holding_company);
    }

    pub fn seed_valuation(&self, valuation: CompanyValuation) {
        self.lock().valuations.push(valuation);
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn company(&self, id: Uuid) -> LedgerResult<Option<Company>> {
        Ok(self.lock().companies.get(&id).cloned())
    }

    async fn share_class(
        &self,
        company_id: Uuid,
        class_id: Uuid,
    ) -> LedgerResult<Option<ShareClass>> {
        Ok(self
            .lock()
            .share_classes
            .get(&class_id)
            .filter(|c| c.company_id == company_id)
            .cloned())
    }

    async fn user(&self, id: Uuid) -> LedgerResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn holding_company(&self, id: Uuid) -> LedgerResult<Option<HoldingCompany>> {
        Ok(self.lock().holding_companies.get(&id).cloned())
    }

    async fn valuations_for_company(
        &self,
        company_id: Uuid,
    ) -> LedgerResult<Vec<CompanyValuation>> {
        let mut valuations: Vec<CompanyValuation> = self
            .lock()
            .valuations
            .iter()
            .filter(|v| v.company_id == company_id)
            .cloned()
            .collect();
        valuations.sort_by(|a, b| b.valued_at.cmp(&a.valued_at).then(a.id.cmp(&b.id)));
        Ok(valuations)
    }

    async fn lot(&self, id: Uuid) -> LedgerResult<Option<ShareLot>> {
        Ok(self.lock().lots.get(&id).cloned())
    }

    async fn insert_lot(&self, lot: &ShareLot) -> LedgerResult<ShareLot> {
        let mut inner = self.lock();
        inner.lots.insert(lot.id, lot.clone());
        Ok(lot.clone())
    }

    async fn apply_sale(&self, lot_id: Uuid, quantity: i64) -> LedgerResult<ShareLot> {
        let mut inner = self.lock();
        let lot = inner
            .lots
            .get_mut(&lot_id)
            .ok_or_else(|| LedgerError::not_found("share lot", lot_id))?;
        lot.apply_sale(quantity)?;
        Ok(lot.clone())
    }

    async fn lots_for_user(
        &self,
        user_id: Uuid,
        include_sold: bool,
    ) -> LedgerResult<Vec<ShareLot>> {
        let mut lots: Vec<ShareLot> = self
            .lock()
            .lots
            .values()
            .filter(|l| l.user_id == user_id && (include_sold || l.status.is_outstanding()))
            .cloned()
            .collect();
        lots.sort_by(|a, b| a.purchase_date.cmp(&b.purchase_date).then(a.id.cmp(&b.id)));
        Ok(lots)
    }

    async fn lots_for_company(
        &self,
        company_id: Uuid,
        include_sold: bool,
    ) -> LedgerResult<Vec<ShareLot>> {
        let mut lots: Vec<ShareLot> = self
            .lock()
            .lots
            .values()
            .filter(|l| l.company_id == company_id && (include_sold || l.status.is_outstanding()))
            .cloned()
            .collect();
        lots.sort_by(|a, b| a.purchase_date.cmp(&b.purchase_date).then(a.id.cmp(&b.id)));
        Ok(lots)
    }

    async fn transaction(&self, id: Uuid) -> LedgerResult<Option<Transaction>> {
        Ok(self.lock().transactions.get(&id).cloned())
    }

    async fn record_transaction(&self, tx: &Transaction) -> LedgerResult<Transaction> {
        let mut inner = self.lock();
        inner.transactions.insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn record_share_transaction(
        &self,
        st: &ShareTransaction,
    ) -> LedgerResult<ShareTransaction> {
        validation::validate_quantity("quantity", st.quantity)?;
        let mut inner = self.lock();
        inner.share_transactions.push(st.clone());
        Ok(st.clone())
    }

    async fn set_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> LedgerResult<Transaction> {
        let mut inner = self.lock();
        let tx = inner
            .transactions
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("transaction", id))?;
        if !tx.can_transition_to(status) {
            return Err(LedgerError::Consistency(format!(
                "invalid transaction status transition {} -> {}",
                tx.status.as_str(),
                status.as_str()
            )));
        }
        tx.status = status;
        tx.updated_at = chrono::Utc::now();
        Ok(tx.clone())
    }

    async fn set_share_transaction_status(
        &self,
        id: Uuid,
        status: ShareTransactionStatus,
    ) -> LedgerResult<ShareTransaction> {
        let mut inner = self.lock();
        let st = inner
            .share_transactions
            .iter_mut()
            .find(|st| st.id == id)
            .ok_or_else(|| LedgerError::not_found("share transaction", id))?;
        if !st.can_transition_to(status) {
            return Err(LedgerError::Consistency(format!(
                "invalid share transaction status transition {} -> {}",
                st.status.as_str(),
                status.as_str()
            )));
        }
        st.status = status;
        Ok(st.clone())
    }

    async fn share_transactions_for_user(
        &self,
        user_id: Uuid,
    ) -> LedgerResult<Vec<ShareTransaction>> {
        let mut records: Vec<ShareTransaction> = self
            .lock()
            .share_transactions
            .iter()
            .filter(|st| st.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(records)
    }

    async fn share_transactions_for_lot(
        &self,
        lot_id: Uuid,
    ) -> LedgerResult<Vec<ShareTransaction>> {
        let mut records: Vec<ShareTransaction> = self
            .lock()
            .share_transactions
            .iter()
            .filter(|st| st.lot_id == lot_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(records)
    }

    async fn commit_purchase(
        &self,
        tx: &Transaction,
        lot: &ShareLot,
        st: &ShareTransaction,
    ) -> LedgerResult<()> {
        validation::validate_quantity("quantity", st.quantity)?;

        let mut inner = self.lock();
        let total_shares = inner
            .share_classes
            .get(&lot.share_class_id)
            .filter(|c| c.company_id == lot.company_id)
            .ok_or_else(|| LedgerError::not_found("share class", lot.share_class_id))?
            .total_shares;

        let issued = inner.issued_in_class(lot.share_class_id);
        let available = total_shares - issued;
        if lot.initial_shares > available {
            return Err(LedgerError::Oversold {
                requested: lot.initial_shares,
                available,
            });
        }

        inner.transactions.insert(tx.id, tx.clone());
        inner.lots.insert(lot.id, lot.clone());
        inner.share_transactions.push(st.clone());
        Ok(())
    }

    async fn commit_sale(
        &self,
        lot_id: Uuid,
        tx: &Transaction,
        st: &ShareTransaction,
    ) -> LedgerResult<ShareLot> {
        let mut inner = self.lock();
        let updated = {
            let lot = inner
                .lots
                .get_mut(&lot_id)
                .ok_or_else(|| LedgerError::not_found("share lot", lot_id))?;
            lot.apply_sale(st.quantity)?;
            lot.clone()
        };
        inner.transactions.insert(tx.id, tx.clone());
        inner.share_transactions.push(st.clone());
        Ok(updated)
    }

    async fn affiliate_by_code(&self, code: &str) -> LedgerResult<Option<Affiliate>> {
        Ok(self
            .lock()
            .affiliates
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn affiliate_for_user(&self, user_id: Uuid) -> LedgerResult<Option<Affiliate>> {
        Ok(self
            .lock()
            .affiliates
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn upsert_affiliate(&self, affiliate: &Affiliate) -> LedgerResult<Affiliate> {
        let mut inner = self.lock();
        let code_taken = inner
            .affiliates
            .values()
            .any(|a| a.code == affiliate.code && a.id != affiliate.id);
        if code_taken {
            return Err(LedgerError::Validation(validation::ValidationError::new(
                "code",
                "already in use",
            )));
        }
        inner.affiliates.insert(affiliate.id, affiliate.clone());
        Ok(affiliate.clone())
    }
}
