//! Purchase workflow: availability check, atomic ledger writes, then
//! fire-and-forget confirmation side effects.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Identifier, ShareLot, ShareStatus, ShareTransaction, ShareTransactionKind,
    ShareTransactionStatus, Transaction, TransactionKind,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::{LedgerStore, Mailer, Notifier};
use crate::validation;

#[derive(Debug, Clone)]
pub struct PurchaseInput {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub share_class_id: Uuid,
    pub identifier: Identifier,
    pub quantity: i64,
    pub holding_company_id: Option<Uuid>,
    pub payment_method: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutput {
    pub transaction_id: Uuid,
    pub lot_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct SaleInput {
    pub lot_id: Uuid,
    pub quantity: i64,
    pub price_per_share: BigDecimal,
    pub payment_method: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleOutput {
    pub transaction_id: Uuid,
    pub lot_id: Uuid,
    pub remaining_shares: i64,
    pub status: ShareStatus,
}

pub struct PurchaseService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
}

impl PurchaseService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn Notifier>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            notifier,
            mailer,
        }
    }

    /// Buy shares in one class of one company.
    ///
    /// Validation happens before any write. The payment transaction, the lot
    /// and the buy movement commit as one unit together with the
    /// availability check, so a failure partway leaves nothing behind and
    /// concurrent purchases cannot jointly exceed the class cap. The
    /// purchase is committed once that unit succeeds; notification and email
    /// failures are logged and never roll it back.
    pub async fn purchase_shares(&self, input: PurchaseInput) -> LedgerResult<PurchaseOutput> {
        validation::validate_identifier(&input.identifier)?;
        validation::validate_quantity("quantity", input.quantity)?;

        let user = self
            .store
            .user(input.user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", input.user_id))?;
        let company = self
            .store
            .company(input.company_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("company", input.company_id))?;
        let share_class = self
            .store
            .share_class(company.id, input.share_class_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("share class", input.share_class_id))?;
        if let Some(holding_company_id) = input.holding_company_id {
            self.store
                .holding_company(holding_company_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("holding company", holding_company_id))?;
        }

        let amount = BigDecimal::from(input.quantity) * &share_class.share_price;
        let tx = Transaction::new(
            user.id,
            input.payment_method.clone(),
            TransactionKind::SharesPurchase,
            amount,
            input.currency.clone(),
            None,
        );
        let lot = ShareLot::new(
            user.id,
            company.id,
            share_class.id,
            input.holding_company_id,
            input.identifier.clone(),
            input.quantity,
            share_class.share_price.clone(),
        );
        let st = ShareTransaction::new(
            lot.id,
            tx.id,
            user.id,
            company.id,
            share_class.id,
            ShareTransactionKind::Buy,
            input.quantity,
            share_class.share_price.clone(),
            lot.purchase_date,
        )?;

        self.store.commit_purchase(&tx, &lot, &st).await?;
        info!(
            user_id = %user.id,
            company_id = %company.id,
            lot_id = %lot.id,
            quantity = input.quantity,
            "share purchase committed"
        );

        let body = format!(
            "Your purchase of {} {} shares in {} has been registered.",
            input.quantity, share_class.name, company.name
        );
        let subject = format!("Purchase confirmation - {}", company.name);
        let html = format!("<p>{}</p>", body);
        let (notified, mailed) = futures::join!(
            self.notifier
                .notify(user.id, "Share purchase confirmed", &body),
            self.mailer.send_email(&user.email, &subject, &body, &html),
        );
        if let Err(err) = notified {
            warn!(user_id = %user.id, error = %err, "purchase notification failed");
        }
        match mailed {
            Ok(receipt) if !receipt.success => {
                warn!(user_id = %user.id, error = ?receipt.error, "confirmation email rejected by gateway");
            }
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "confirmation email failed");
            }
            Ok(_) => {}
        }

        Ok(PurchaseOutput {
            transaction_id: tx.id,
            lot_id: lot.id,
        })
    }

    /// Record a sale against a lot. The completed sell movement and the
    /// lot's remaining-share decrement commit as one unit, keeping the
    /// cached quantity consistent with the movement log.
    pub async fn record_sale(&self, input: SaleInput) -> LedgerResult<SaleOutput> {
        validation::validate_quantity("quantity", input.quantity)?;
        validation::validate_positive_amount("price_per_share", &input.price_per_share)?;

        let lot = self
            .store
            .lot(input.lot_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("share lot", input.lot_id))?;

        let amount = BigDecimal::from(input.quantity) * &input.price_per_share;
        let tx = Transaction::new(
            lot.user_id,
            input.payment_method.clone(),
            TransactionKind::SharesSale,
            amount,
            input.currency.clone(),
            None,
        );
        let mut st = ShareTransaction::new(
            lot.id,
            tx.id,
            lot.user_id,
            lot.company_id,
            lot.share_class_id,
            ShareTransactionKind::Sell,
            input.quantity,
            input.price_per_share.clone(),
            Utc::now(),
        )?;
        st.status = ShareTransactionStatus::Completed;

        let updated = self.store.commit_sale(lot.id, &tx, &st).await?;
        info!(
            user_id = %lot.user_id,
            lot_id = %lot.id,
            quantity = input.quantity,
            remaining = updated.remaining_shares,
            "share sale committed"
        );

        Ok(SaleOutput {
            transaction_id: tx.id,
            lot_id: lot.id,
            remaining_shares: updated.remaining_shares,
            status: updated.status,
        })
    }
}
