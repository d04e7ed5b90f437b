//! Payment-level transactions and the share-movement ledger.
//!
//! `Transaction` records money moving; `ShareTransaction` records shares
//! moving against a lot. Share transactions are the authoritative log: a
//! lot's `remaining_shares` must always equal `initial_shares` minus the sum
//! of completed sell quantities.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{validate_quantity, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    SharesPurchase,
    SharesSale,
    ReferralBonus,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::SharesPurchase => "shares_purchase",
            TransactionKind::SharesSale => "shares_sale",
            TransactionKind::ReferralBonus => "referral_bonus",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shares_purchase" => Ok(TransactionKind::SharesPurchase),
            "shares_sale" => Ok(TransactionKind::SharesSale),
            "referral_bonus" => Ok(TransactionKind::ReferralBonus),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "failed" => Ok(TransactionStatus::Failed),
            "refunded" => Ok(TransactionStatus::Refunded),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Payment-level record. Immutable after creation except for status
/// transitions and tax/discount corrections made while still pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_method: String,
    pub kind: TransactionKind,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub tax_amount: Option<BigDecimal>,
    pub discount: Option<BigDecimal>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        payment_method: impl Into<String>,
        kind: TransactionKind,
        amount: BigDecimal,
        currency: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            payment_method: payment_method.into(),
            kind,
            amount,
            currency: currency.into(),
            status: TransactionStatus::Pending,
            tax_amount: None,
            discount: None,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Only `Pending -> Paid | Failed | Refunded` is allowed.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        self.status == TransactionStatus::Pending && next != TransactionStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareTransactionKind {
    Buy,
    Sell,
}

impl ShareTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareTransactionKind::Buy => "buy",
            ShareTransactionKind::Sell => "sell",
        }
    }
}

impl FromStr for ShareTransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(ShareTransactionKind::Buy),
            "sell" => Ok(ShareTransactionKind::Sell),
            other => Err(format!("unknown share transaction kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareTransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl ShareTransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareTransactionStatus::Pending => "pending",
            ShareTransactionStatus::Completed => "completed",
            ShareTransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ShareTransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShareTransactionStatus::Pending),
            "completed" => Ok(ShareTransactionStatus::Completed),
            "cancelled" => Ok(ShareTransactionStatus::Cancelled),
            other => Err(format!("unknown share transaction status: {}", other)),
        }
    }
}

/// Share-movement record tying a lot to the payment that caused it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareTransaction {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub share_class_id: Uuid,
    pub kind: ShareTransactionKind,
    pub quantity: i64,
    pub price_per_share: BigDecimal,
    pub total_amount: BigDecimal,
    pub transaction_date: DateTime<Utc>,
    pub status: ShareTransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl ShareTransaction {
    /// Quantity must be a positive integer; `total_amount` is derived as
    /// `quantity * price_per_share`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lot_id: Uuid,
        transaction_id: Uuid,
        user_id: Uuid,
        company_id: Uuid,
        share_class_id: Uuid,
        kind: ShareTransactionKind,
        quantity: i64,
        price_per_share: BigDecimal,
        transaction_date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validate_quantity("quantity", quantity)?;

        let total_amount = BigDecimal::from(quantity) * &price_per_share;
        Ok(Self {
            id: Uuid::new_v4(),
            lot_id,
            transaction_id,
            user_id,
            company_id,
            share_class_id,
            kind,
            quantity,
            price_per_share,
            total_amount,
            transaction_date,
            status: ShareTransactionStatus::Pending,
            created_at: Utc::now(),
        })
    }

    /// Only `Pending -> Completed | Cancelled` is allowed.
    pub fn can_transition_to(&self, next: ShareTransactionStatus) -> bool {
        self.status == ShareTransactionStatus::Pending && next != ShareTransactionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_transaction_derives_total() {
        let st = ShareTransaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            ShareTransactionKind::Buy,
            40,
            BigDecimal::from(25),
            Utc::now(),
        )
        .expect("valid quantity");

        assert_eq!(st.total_amount, BigDecimal::from(1000));
        assert_eq!(st.status, ShareTransactionStatus::Pending);
    }

    #[test]
    fn share_transaction_rejects_non_positive_quantity() {
        for quantity in [0, -10] {
            let result = ShareTransaction::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                ShareTransactionKind::Sell,
                quantity,
                BigDecimal::from(25),
                Utc::now(),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn transaction_status_transitions() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            "card",
            TransactionKind::SharesPurchase,
            BigDecimal::from(500),
            "NOK",
            None,
        );

        assert!(tx.can_transition_to(TransactionStatus::Paid));
        assert!(tx.can_transition_to(TransactionStatus::Failed));
        assert!(tx.can_transition_to(TransactionStatus::Refunded));
        assert!(!tx.can_transition_to(TransactionStatus::Pending));

        let mut paid = tx.clone();
        paid.status = TransactionStatus::Paid;
        assert!(!paid.can_transition_to(TransactionStatus::Refunded));
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            TransactionKind::SharesPurchase,
            TransactionKind::SharesSale,
            TransactionKind::ReferralBonus,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>(), Ok(kind));
        }
    }
}
