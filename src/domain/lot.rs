//! Share lot: one purchase batch with its own remaining-quantity counter.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Legal-person identifier used for regulatory grouping of ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Ssn,
    RegistrationNumber,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Ssn => "ssn",
            IdentifierKind::RegistrationNumber => "registration_number",
        }
    }
}

impl FromStr for IdentifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ssn" => Ok(IdentifierKind::Ssn),
            "registration_number" => Ok(IdentifierKind::RegistrationNumber),
            other => Err(format!("unknown identifier kind: {}", other)),
        }
    }
}

/// Tagged identifier value: personal number or organization number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl Identifier {
    pub fn ssn(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Ssn,
            value: value.into(),
        }
    }

    pub fn registration_number(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::RegistrationNumber,
            value: value.into(),
        }
    }
}

/// Lifecycle status of a lot. Quantity only ever decreases:
/// `Active` -> `PartiallySold` -> `Sold`. `Locked` is derived from vesting
/// restrictions and reported until an external process unlocks the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Active,
    Locked,
    PartiallySold,
    Sold,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::Active => "active",
            ShareStatus::Locked => "locked",
            ShareStatus::PartiallySold => "partially_sold",
            ShareStatus::Sold => "sold",
        }
    }

    /// Statuses that still count toward the cap table and availability sums.
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, ShareStatus::Sold)
    }
}

impl FromStr for ShareStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ShareStatus::Active),
            "locked" => Ok(ShareStatus::Locked),
            "partially_sold" => Ok(ShareStatus::PartiallySold),
            "sold" => Ok(ShareStatus::Sold),
            other => Err(format!("unknown share status: {}", other)),
        }
    }
}

/// One purchase batch of shares.
///
/// `initial_shares` is immutable once set. `remaining_shares` is a
/// materialized projection of completed sells against this lot and is only
/// mutated together with the sell record, never independently. Lots are never
/// deleted; a fully consumed lot stays as `Sold` for the historical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub share_class_id: Uuid,
    pub holding_company_id: Option<Uuid>,
    pub identifier: Identifier,
    pub initial_shares: i64,
    pub remaining_shares: i64,
    pub purchase_date: DateTime<Utc>,
    pub purchase_price: BigDecimal,
    pub status: ShareStatus,
    pub is_locked: bool,
    pub unlock_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareLot {
    pub fn new(
        user_id: Uuid,
        company_id: Uuid,
        share_class_id: Uuid,
        holding_company_id: Option<Uuid>,
        identifier: Identifier,
        quantity: i64,
        price_per_share: BigDecimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            share_class_id,
            holding_company_id,
            identifier,
            initial_shares: quantity,
            remaining_shares: quantity,
            purchase_date: now,
            purchase_price: price_per_share,
            status: ShareStatus::Active,
            is_locked: false,
            unlock_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Consume `quantity` shares from this lot. Status moves to `Sold` when
    /// the lot is exhausted, `PartiallySold` otherwise.
    pub fn apply_sale(&mut self, quantity: i64) -> Result<(), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::Validation(
                crate::validation::ValidationError::new("quantity", "must be a positive integer"),
            ));
        }
        if self.status == ShareStatus::Sold {
            return Err(LedgerError::InsufficientShares {
                requested: quantity,
                remaining: 0,
            });
        }
        if quantity > self.remaining_shares {
            return Err(LedgerError::InsufficientShares {
                requested: quantity,
                remaining: self.remaining_shares,
            });
        }

        self.remaining_shares -= quantity;
        self.status = if self.remaining_shares == 0 {
            ShareStatus::Sold
        } else {
            ShareStatus::PartiallySold
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cost basis of what is still held: `remaining_shares * purchase_price`.
    pub fn remaining_cost_basis(&self) -> BigDecimal {
        BigDecimal::from(self.remaining_shares) * &self.purchase_price
    }
}
