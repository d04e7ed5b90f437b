//! Company and share-class registry entities.
//! Consulted, never modified, by the ledger itself.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub org_number: String,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>, org_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            org_number: org_number.into(),
            created_at: Utc::now(),
        }
    }
}

/// One class of shares a company is authorized to issue.
///
/// `total_shares` is the authorized cap: the sum of `initial_shares` over all
/// non-cancelled lots in the class must never exceed it. `share_price` is the
/// current offering price applied to new purchases; `par_value` is nominal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareClass {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub voting_rights: bool,
    pub dividend_rights: bool,
    pub total_shares: i64,
    pub par_value: BigDecimal,
    pub share_price: BigDecimal,
}

impl ShareClass {
    pub fn new(
        company_id: Uuid,
        name: impl Into<String>,
        total_shares: i64,
        share_price: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            name: name.into(),
            voting_rights: true,
            dividend_rights: true,
            total_shares,
            par_value: BigDecimal::from(1),
            share_price,
        }
    }
}

/// Corporate entity through which a user may legally hold shares.
/// Holder-of-record for cap-table purposes only; the user keeps beneficial
/// ownership in their portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingCompany {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub registration_number: String,
}

impl HoldingCompany {
    pub fn new(
        user_id: Uuid,
        name: impl Into<String>,
        registration_number: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            registration_number: registration_number.into(),
        }
    }
}

/// Point-in-time company valuation: per-share prices keyed by share class.
/// The most recent entry whose table contains a lot's class is that lot's
/// mark-to-market price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyValuation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub valued_at: NaiveDate,
    pub share_prices: HashMap<Uuid, BigDecimal>,
}

impl CompanyValuation {
    pub fn new(
        company_id: Uuid,
        valued_at: NaiveDate,
        share_prices: HashMap<Uuid, BigDecimal>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            valued_at,
            share_prices,
        }
    }

    pub fn price_for(&self, share_class_id: Uuid) -> Option<&BigDecimal> {
        self.share_prices.get(&share_class_id)
    }
}
