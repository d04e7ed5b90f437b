//! Postgres implementation of [`LedgerStore`].
//!
//! Row types are internal to the adapter and converted into domain entities
//! on the way out. Multi-row writes run inside a single database transaction;
//! the purchase path takes a `FOR UPDATE` lock on the share-class row so two
//! concurrent purchases cannot jointly oversell a class.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use uuid::Uuid;

use crate::domain::{
    Affiliate, Company, CompanyValuation, HoldingCompany, Identifier, Referral, ShareClass,
    ShareLot, ShareTransaction, ShareTransactionStatus, Transaction, TransactionStatus, User,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::LedgerStore;
use crate::validation::{self, ValidationError};

#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

const LOT_COLUMNS: &str = "id, user_id, company_id, share_class_id, holding_company_id, \
     identifier_kind, identifier_value, initial_shares, remaining_shares, purchase_date, \
     purchase_price, status, is_locked, unlock_date, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, user_id, payment_method, kind, amount, currency, status, \
     tax_amount, discount, metadata, created_at, updated_at";

const SHARE_TRANSACTION_COLUMNS: &str = "id, lot_id, transaction_id, user_id, company_id, \
     share_class_id, kind, quantity, price_per_share, total_amount, transaction_date, status, \
     created_at";

async fn insert_transaction_tx(
    dbtx: &mut PgTransaction<'_, Postgres>,
    tx: &Transaction,
) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, user_id, payment_method, kind, amount, currency, status,
            tax_amount, discount, metadata, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(tx.id)
    .bind(tx.user_id)
    .bind(&tx.payment_method)
    .bind(tx.kind.as_str())
    .bind(&tx.amount)
    .bind(&tx.currency)
    .bind(tx.status.as_str())
    .bind(&tx.tax_amount)
    .bind(&tx.discount)
    .bind(&tx.metadata)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .execute(&mut **dbtx)
    .await?;

    Ok(())
}

async fn insert_lot_tx(
    dbtx: &mut PgTransaction<'_, Postgres>,
    lot: &ShareLot,
) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO share_lots (
            id, user_id, company_id, share_class_id, holding_company_id,
            identifier_kind, identifier_value, initial_shares, remaining_shares,
            purchase_date, purchase_price, status, is_locked, unlock_date,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(lot.id)
    .bind(lot.user_id)
    .bind(lot.company_id)
    .bind(lot.share_class_id)
    .bind(lot.holding_company_id)
    .bind(lot.identifier.kind.as_str())
    .bind(&lot.identifier.value)
    .bind(lot.initial_shares)
    .bind(lot.remaining_shares)
    .bind(lot.purchase_date)
    .bind(&lot.purchase_price)
    .bind(lot.status.as_str())
    .bind(lot.is_locked)
    .bind(lot.unlock_date)
    .bind(lot.created_at)
    .bind(lot.updated_at)
    .execute(&mut **dbtx)
    .await?;

    Ok(())
}

async fn insert_share_transaction_tx(
    dbtx: &mut PgTransaction<'_, Postgres>,
    st: &ShareTransaction,
) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO share_transactions (
            id, lot_id, transaction_id, user_id, company_id, share_class_id,
            kind, quantity, price_per_share, total_amount, transaction_date,
            status, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(st.id)
    .bind(st.lot_id)
    .bind(st.transaction_id)
    .bind(st.user_id)
    .bind(st.company_id)
    .bind(st.share_class_id)
    .bind(st.kind.as_str())
    .bind(st.quantity)
    .bind(&st.price_per_share)
    .bind(&st.total_amount)
    .bind(st.transaction_date)
    .bind(st.status.as_str())
    .bind(st.created_at)
    .execute(&mut **dbtx)
    .await?;

    Ok(())
}

async fn lot_for_update(
    dbtx: &mut PgTransaction<'_, Postgres>,
    lot_id: Uuid,
) -> LedgerResult<ShareLot> {
    let row = sqlx::query_as::<_, LotRow>(&format!(
        "SELECT {} FROM share_lots WHERE id = $1 FOR UPDATE",
        LOT_COLUMNS
    ))
    .bind(lot_id)
    .fetch_optional(&mut **dbtx)
    .await?;

    row.ok_or_else(|| LedgerError::not_found("share lot", lot_id))?
        .into_domain()
}

async fn update_lot_quantities(
    dbtx: &mut PgTransaction<'_, Postgres>,
    lot: &ShareLot,
) -> LedgerResult<()> {
    sqlx::query("UPDATE share_lots SET remaining_shares = $2, status = $3, updated_at = $4 WHERE id = $1")
        .bind(lot.id)
        .bind(lot.remaining_shares)
        .bind(lot.status.as_str())
        .bind(lot.updated_at)
        .execute(&mut **dbtx)
        .await?;

    Ok(())
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn company(&self, id: Uuid) -> LedgerResult<Option<Company>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, name, org_number, created_at FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CompanyRow::into_domain))
    }

    async fn share_class(
        &self,
        company_id: Uuid,
        class_id: Uuid,
    ) -> LedgerResult<Option<ShareClass>> {
        let row = sqlx::query_as::<_, ShareClassRow>(
            r#"
            SELECT id, company_id, name, voting_rights, dividend_rights,
                   total_shares, par_value, share_price
            FROM share_classes
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(class_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ShareClassRow::into_domain))
    }

    async fn user(&self, id: Uuid) -> LedgerResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, external_id, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_domain))
    }

    async fn holding_company(&self, id: Uuid) -> LedgerResult<Option<HoldingCompany>> {
        let row = sqlx::query_as::<_, HoldingCompanyRow>(
            "SELECT id, user_id, name, registration_number FROM holding_companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(HoldingCompanyRow::into_domain))
    }

    async fn valuations_for_company(
        &self,
        company_id: Uuid,
    ) -> LedgerResult<Vec<CompanyValuation>> {
        let rows = sqlx::query_as::<_, ValuationRow>(
            r#"
            SELECT id, company_id, valued_at, share_prices
            FROM company_valuations
            WHERE company_id = $1
            ORDER BY valued_at DESC, id
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ValuationRow::into_domain).collect()
    }

    async fn lot(&self, id: Uuid) -> LedgerResult<Option<ShareLot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM share_lots WHERE id = $1",
            LOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LotRow::into_domain).transpose()
    }

    async fn insert_lot(&self, lot: &ShareLot) -> LedgerResult<ShareLot> {
        let mut dbtx = self.pool.begin().await?;
        insert_lot_tx(&mut dbtx, lot).await?;
        dbtx.commit().await?;
        Ok(lot.clone())
    }

    async fn apply_sale(&self, lot_id: Uuid, quantity: i64) -> LedgerResult<ShareLot> {
        let mut dbtx = self.pool.begin().await?;

        let mut lot = lot_for_update(&mut dbtx, lot_id).await?;
        lot.apply_sale(quantity)?;
        update_lot_quantities(&mut dbtx, &lot).await?;

        dbtx.commit().await?;
        Ok(lot)
    }

    async fn lots_for_user(
        &self,
        user_id: Uuid,
        include_sold: bool,
    ) -> LedgerResult<Vec<ShareLot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM share_lots WHERE user_id = $1 AND ($2 OR status <> 'sold') \
             ORDER BY purchase_date, id",
            LOT_COLUMNS
        ))
        .bind(user_id)
        .bind(include_sold)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LotRow::into_domain).collect()
    }

    async fn lots_for_company(
        &self,
        company_id: Uuid,
        include_sold: bool,
    ) -> LedgerResult<Vec<ShareLot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM share_lots WHERE company_id = $1 AND ($2 OR status <> 'sold') \
             ORDER BY purchase_date, id",
            LOT_COLUMNS
        ))
        .bind(company_id)
        .bind(include_sold)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LotRow::into_domain).collect()
    }

    async fn transaction(&self, id: Uuid) -> LedgerResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn record_transaction(&self, tx: &Transaction) -> LedgerResult<Transaction> {
        let mut dbtx = self.pool.begin().await?;
        insert_transaction_tx(&mut dbtx, tx).await?;
        dbtx.commit().await?;
        Ok(tx.clone())
    }

    async fn record_share_transaction(
        &self,
        st: &ShareTransaction,
    ) -> LedgerResult<ShareTransaction> {
        validation::validate_quantity("quantity", st.quantity)?;

        let mut dbtx = self.pool.begin().await?;
        insert_share_transaction_tx(&mut dbtx, st).await?;
        dbtx.commit().await?;
        Ok(st.clone())
    }

    async fn set_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> LedgerResult<Transaction> {
        let mut dbtx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE id = $1 FOR UPDATE",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *dbtx)
        .await?;

        let mut tx = row
            .ok_or_else(|| LedgerError::not_found("transaction", id))?
            .into_domain()?;
        if !tx.can_transition_to(status) {
            return Err(LedgerError::Consistency(format!(
                "invalid transaction status transition {} -> {}",
                tx.status.as_str(),
                status.as_str()
            )));
        }

        tx.status = status;
        tx.updated_at = Utc::now();
        sqlx::query("UPDATE transactions SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(tx.id)
            .bind(tx.status.as_str())
            .bind(tx.updated_at)
            .execute(&mut *dbtx)
            .await?;

        dbtx.commit().await?;
        Ok(tx)
    }

    async fn set_share_transaction_status(
        &self,
        id: Uuid,
        status: ShareTransactionStatus,
    ) -> LedgerResult<ShareTransaction> {
        let mut dbtx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ShareTransactionRow>(&format!(
            "SELECT {} FROM share_transactions WHERE id = $1 FOR UPDATE",
            SHARE_TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *dbtx)
        .await?;

        let mut st = row
            .ok_or_else(|| LedgerError::not_found("share transaction", id))?
            .into_domain()?;
        if !st.can_transition_to(status) {
            return Err(LedgerError::Consistency(format!(
                "invalid share transaction status transition {} -> {}",
                st.status.as_str(),
                status.as_str()
            )));
        }

        st.status = status;
        sqlx::query("UPDATE share_transactions SET status = $2 WHERE id = $1")
            .bind(st.id)
            .bind(st.status.as_str())
            .execute(&mut *dbtx)
            .await?;

        dbtx.commit().await?;
        Ok(st)
    }

    async fn share_transactions_for_user(
        &self,
        user_id: Uuid,
    ) -> LedgerResult<Vec<ShareTransaction>> {
        let rows = sqlx::query_as::<_, ShareTransactionRow>(&format!(
            "SELECT {} FROM share_transactions WHERE user_id = $1 \
             ORDER BY transaction_date, created_at",
            SHARE_TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(ShareTransactionRow::into_domain)
            .collect()
    }

    async fn share_transactions_for_lot(
        &self,
        lot_id: Uuid,
    ) -> LedgerResult<Vec<ShareTransaction>> {
        let rows = sqlx::query_as::<_, ShareTransactionRow>(&format!(
            "SELECT {} FROM share_transactions WHERE lot_id = $1 \
             ORDER BY transaction_date, created_at",
            SHARE_TRANSACTION_COLUMNS
        ))
        .bind(lot_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(ShareTransactionRow::into_domain)
            .collect()
    }

    async fn commit_purchase(
        &self,
        tx: &Transaction,
        lot: &ShareLot,
        st: &ShareTransaction,
    ) -> LedgerResult<()> {
        validation::validate_quantity("quantity", st.quantity)?;

        let mut dbtx = self.pool.begin().await?;

        // Lock the class row for the duration of the check-and-insert.
        let total_shares: Option<i64> = sqlx::query_scalar(
            "SELECT total_shares FROM share_classes WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(lot.share_class_id)
        .bind(lot.company_id)
        .fetch_optional(&mut *dbtx)
        .await?;
        let total_shares = total_shares
            .ok_or_else(|| LedgerError::not_found("share class", lot.share_class_id))?;

        let issued: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(remaining_shares), 0)::BIGINT FROM share_lots \
             WHERE share_class_id = $1 AND status IN ('active', 'locked', 'partially_sold')",
        )
        .bind(lot.share_class_id)
        .fetch_one(&mut *dbtx)
        .await?;

        let available = total_shares - issued;
        if lot.initial_shares > available {
            dbtx.rollback().await?;
            return Err(LedgerError::Oversold {
                requested: lot.initial_shares,
                available,
            });
        }

        insert_transaction_tx(&mut dbtx, tx).await?;
        insert_lot_tx(&mut dbtx, lot).await?;
        insert_share_transaction_tx(&mut dbtx, st).await?;

        dbtx.commit().await?;
        Ok(())
    }

    async fn commit_sale(
        &self,
        lot_id: Uuid,
        tx: &Transaction,
        st: &ShareTransaction,
    ) -> LedgerResult<ShareLot> {
        let mut dbtx = self.pool.begin().await?;

        let mut lot = lot_for_update(&mut dbtx, lot_id).await?;
        lot.apply_sale(st.quantity)?;

        update_lot_quantities(&mut dbtx, &lot).await?;
        insert_transaction_tx(&mut dbtx, tx).await?;
        insert_share_transaction_tx(&mut dbtx, st).await?;

        dbtx.commit().await?;
        Ok(lot)
    }

    async fn affiliate_by_code(&self, code: &str) -> LedgerResult<Option<Affiliate>> {
        let row = sqlx::query_as::<_, AffiliateRow>(
            "SELECT id, user_id, code, referrals, created_at FROM affiliates WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AffiliateRow::into_domain).transpose()
    }

    async fn affiliate_for_user(&self, user_id: Uuid) -> LedgerResult<Option<Affiliate>> {
        let row = sqlx::query_as::<_, AffiliateRow>(
            "SELECT id, user_id, code, referrals, created_at FROM affiliates WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AffiliateRow::into_domain).transpose()
    }

    async fn upsert_affiliate(&self, affiliate: &Affiliate) -> LedgerResult<Affiliate> {
        let referrals = serde_json::to_value(&affiliate.referrals)
            .map_err(|e| LedgerError::Internal(format!("serialize referrals: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO affiliates (id, user_id, code, referrals, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET code = EXCLUDED.code, referrals = EXCLUDED.referrals
            "#,
        )
        .bind(affiliate.id)
        .bind(affiliate.user_id)
        .bind(&affiliate.code)
        .bind(referrals)
        .bind(affiliate.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::Validation(ValidationError::new("code", "already in use"))
            } else {
                LedgerError::from(e)
            }
        })?;

        Ok(affiliate.clone())
    }
}

// Internal row types for SQLx. Not exposed outside the adapter.

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    org_number: String,
    created_at: DateTime<Utc>,
}

impl CompanyRow {
    fn into_domain(self) -> Company {
        Company {
            id: self.id,
            name: self.name,
            org_number: self.org_number,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShareClassRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
    voting_rights: bool,
    dividend_rights: bool,
    total_shares: i64,
    par_value: BigDecimal,
    share_price: BigDecimal,
}

impl ShareClassRow {
    fn into_domain(self) -> ShareClass {
        ShareClass {
            id: self.id,
            company_id: self.company_id,
            name: self.name,
            voting_rights: self.voting_rights,
            dividend_rights: self.dividend_rights,
            total_shares: self.total_shares,
            par_value: self.par_value,
            share_price: self.share_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    external_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            external_id: self.external_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HoldingCompanyRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    registration_number: String,
}

impl HoldingCompanyRow {
    fn into_domain(self) -> HoldingCompany {
        HoldingCompany {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            registration_number: self.registration_number,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ValuationRow {
    id: Uuid,
    company_id: Uuid,
    valued_at: NaiveDate,
    share_prices: serde_json::Value,
}

impl ValuationRow {
    // share_prices is a JSONB object of class id -> decimal string.
    fn into_domain(self) -> LedgerResult<CompanyValuation> {
        let raw: HashMap<Uuid, String> = serde_json::from_value(self.share_prices)
            .map_err(|e| LedgerError::Consistency(format!("malformed share price table: {}", e)))?;

        let mut share_prices = HashMap::with_capacity(raw.len());
        for (class_id, price) in raw {
            let price = BigDecimal::from_str(&price).map_err(|e| {
                LedgerError::Consistency(format!(
                    "malformed share price for class {}: {}",
                    class_id, e
                ))
            })?;
            share_prices.insert(class_id, price);
        }

        Ok(CompanyValuation {
            id: self.id,
            company_id: self.company_id,
            valued_at: self.valued_at,
            share_prices,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: Uuid,
    user_id: Uuid,
    company_id: Uuid,
    share_class_id: Uuid,
    holding_company_id: Option<Uuid>,
    identifier_kind: String,
    identifier_value: String,
    initial_shares: i64,
    remaining_shares: i64,
    purchase_date: DateTime<Utc>,
    purchase_price: BigDecimal,
    status: String,
    is_locked: bool,
    unlock_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LotRow {
    fn into_domain(self) -> LedgerResult<ShareLot> {
        Ok(ShareLot {
            id: self.id,
            user_id: self.user_id,
            company_id: self.company_id,
            share_class_id: self.share_class_id,
            holding_company_id: self.holding_company_id,
            identifier: Identifier {
                kind: self
                    .identifier_kind
                    .parse()
                    .map_err(LedgerError::Consistency)?,
                value: self.identifier_value,
            },
            initial_shares: self.initial_shares,
            remaining_shares: self.remaining_shares,
            purchase_date: self.purchase_date,
            purchase_price: self.purchase_price,
            status: self.status.parse().map_err(LedgerError::Consistency)?,
            is_locked: self.is_locked,
            unlock_date: self.unlock_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    payment_method: String,
    kind: String,
    amount: BigDecimal,
    currency: String,
    status: String,
    tax_amount: Option<BigDecimal>,
    discount: Option<BigDecimal>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> LedgerResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            user_id: self.user_id,
            payment_method: self.payment_method,
            kind: self.kind.parse().map_err(LedgerError::Consistency)?,
            amount: self.amount,
            currency: self.currency,
            status: self.status.parse().map_err(LedgerError::Consistency)?,
            tax_amount: self.tax_amount,
            discount: self.discount,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShareTransactionRow {
    id: Uuid,
    lot_id: Uuid,
    transaction_id: Uuid,
    user_id: Uuid,
    company_id: Uuid,
    share_class_id: Uuid,
    kind: String,
    quantity: i64,
    price_per_share: BigDecimal,
    total_amount: BigDecimal,
    transaction_date: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
}

impl ShareTransactionRow {
    fn into_domain(self) -> LedgerResult<ShareTransaction> {
        Ok(ShareTransaction {
            id: self.id,
            lot_id: self.lot_id,
            transaction_id: self.transaction_id,
            user_id: self.user_id,
            company_id: self.company_id,
            share_class_id: self.share_class_id,
            kind: self.kind.parse().map_err(LedgerError::Consistency)?,
            quantity: self.quantity,
            price_per_share: self.price_per_share,
            total_amount: self.total_amount,
            transaction_date: self.transaction_date,
            status: self.status.parse().map_err(LedgerError::Consistency)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AffiliateRow {
    id: Uuid,
    user_id: Uuid,
    code: String,
    referrals: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl AffiliateRow {
    fn into_domain(self) -> LedgerResult<Affiliate> {
        let referrals: Vec<Referral> = serde_json::from_value(self.referrals)
            .map_err(|e| LedgerError::Consistency(format!("malformed referral list: {}", e)))?;

        Ok(Affiliate {
            id: self.id,
            user_id: self.user_id,
            code: self.code,
            referrals,
            created_at: self.created_at,
        })
    }
}
