//! Per-user portfolio views: current holdings at cost basis, and the
//! historical value series behind the portfolio chart.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    CompanyValuation, Identifier, ShareTransaction, ShareTransactionKind, ShareTransactionStatus,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::LedgerStore;
use crate::services::chart::{self, PortfolioChart, ValueEvent};

/// Holdings for one (company, identifier, share class) group, at cost basis.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioPosition {
    pub company_id: Uuid,
    pub share_class_id: Uuid,
    pub share_class_name: String,
    pub identifier: Identifier,
    pub shares: i64,
    pub invested: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyHolding {
    pub company_id: Uuid,
    pub company_name: String,
    pub positions: Vec<PortfolioPosition>,
    pub total_shares: i64,
    pub total_invested: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub user_id: Uuid,
    pub companies: Vec<CompanyHolding>,
    pub total_shares: i64,
    pub total_invested: BigDecimal,
}

pub struct PortfolioService {
    store: Arc<dyn LedgerStore>,
}

impl PortfolioService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current holdings grouped by company, identifier and share class,
    /// with cost-basis investment sums (not market value).
    pub async fn user_portfolio(&self, user_id: Uuid) -> LedgerResult<Portfolio> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", user_id))?;

        let lots = self.store.lots_for_user(user.id, false).await?;

        struct Accum {
            shares: i64,
            invested: BigDecimal,
        }

        let mut groups: HashMap<(Uuid, Identifier, Uuid), Accum> = HashMap::new();
        for lot in lots.iter().filter(|l| l.remaining_shares > 0) {
            let accum = groups
                .entry((lot.company_id, lot.identifier.clone(), lot.share_class_id))
                .or_insert_with(|| Accum {
                    shares: 0,
                    invested: BigDecimal::from(0),
                });
            accum.shares += lot.remaining_shares;
            accum.invested = &accum.invested + lot.remaining_cost_basis();
        }

        let mut company_names: HashMap<Uuid, String> = HashMap::new();
        let mut class_names: HashMap<Uuid, String> = HashMap::new();
        let mut by_company: HashMap<Uuid, Vec<PortfolioPosition>> = HashMap::new();

        for ((company_id, identifier, share_class_id), accum) in groups {
            if !company_names.contains_key(&company_id) {
                let name = self
                    .store
                    .company(company_id)
                    .await?
                    .map(|c| c.name)
                    .unwrap_or_else(|| "unknown company".to_string());
                company_names.insert(company_id, name);
            }
            if !class_names.contains_key(&share_class_id) {
                let name = self
                    .store
                    .share_class(company_id, share_class_id)
                    .await?
                    .map(|c| c.name)
                    .unwrap_or_else(|| "unknown class".to_string());
                class_names.insert(share_class_id, name);
            }

            by_company
                .entry(company_id)
                .or_default()
                .push(PortfolioPosition {
                    company_id,
                    share_class_id,
                    share_class_name: class_names[&share_class_id].clone(),
                    identifier,
                    shares: accum.shares,
                    invested: accum.invested,
                });
        }

        let mut companies = Vec::with_capacity(by_company.len());
        let mut total_shares = 0i64;
        let mut total_invested = BigDecimal::from(0);
        for (company_id, mut positions) in by_company {
            positions.sort_by(|a, b| {
                a.share_class_name
                    .cmp(&b.share_class_name)
                    .then(a.identifier.value.cmp(&b.identifier.value))
            });

            let company_shares: i64 = positions.iter().map(|p| p.shares).sum();
            let company_invested = positions
                .iter()
                .fold(BigDecimal::from(0), |acc, p| acc + &p.invested);

            total_shares += company_shares;
            total_invested = total_invested + &company_invested;
            companies.push(CompanyHolding {
                company_id,
                company_name: company_names[&company_id].clone(),
                positions,
                total_shares: company_shares,
                total_invested: company_invested,
            });
        }
        companies.sort_by(|a, b| {
            a.company_name
                .cmp(&b.company_name)
                .then(a.company_id.cmp(&b.company_id))
        });

        Ok(Portfolio {
            user_id: user.id,
            companies,
            total_shares,
            total_invested,
        })
    }

    /// Daily value series with forward-fill, plus the one-year and
    /// three-year windows. `NoShares` when the user has never held a lot.
    pub async fn portfolio_chart(&self, user_id: Uuid) -> LedgerResult<PortfolioChart> {
        self.portfolio_chart_at(user_id, Utc::now()).await
    }

    /// Same as [`portfolio_chart`](Self::portfolio_chart) with an explicit
    /// "now", which is also the date mark-to-market value lands on.
    pub async fn portfolio_chart_at(
        &self,
        user_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> LedgerResult<PortfolioChart> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", user_id))?;

        let lots = self.store.lots_for_user(user.id, true).await?;
        if lots.is_empty() {
            return Err(LedgerError::NoShares);
        }

        let movements = self.store.share_transactions_for_user(user.id).await?;
        let mut by_lot: HashMap<Uuid, Vec<&ShareTransaction>> = HashMap::new();
        for st in &movements {
            by_lot.entry(st.lot_id).or_default().push(st);
        }

        let mut valuations: HashMap<Uuid, Vec<CompanyValuation>> = HashMap::new();
        let mut events = Vec::new();
        for lot in &lots {
            let lot_movements = by_lot.get(&lot.id);

            // Acquisition value comes from the originating buy record.
            let buy = lot_movements.and_then(|sts| {
                sts.iter().find(|st| {
                    st.kind == ShareTransactionKind::Buy
                        && st.status != ShareTransactionStatus::Cancelled
                })
            });
            match buy {
                Some(st) => events.push(ValueEvent {
                    date: st.transaction_date.date_naive(),
                    company_id: lot.company_id,
                    delta: st.total_amount.clone(),
                }),
                None => {
                    debug!(lot_id = %lot.id, "lot has no buy record, using lot fields");
                    events.push(ValueEvent {
                        date: lot.purchase_date.date_naive(),
                        company_id: lot.company_id,
                        delta: BigDecimal::from(lot.initial_shares) * &lot.purchase_price,
                    });
                }
            }

            if let Some(sts) = lot_movements {
                for st in sts.iter().filter(|st| {
                    st.kind == ShareTransactionKind::Sell
                        && st.status == ShareTransactionStatus::Completed
                }) {
                    events.push(ValueEvent {
                        date: st.transaction_date.date_naive(),
                        company_id: lot.company_id,
                        delta: -st.total_amount.clone(),
                    });
                }
            }

            // Shares still held are marked to the latest valuation that
            // prices this lot's class, dated "now".
            if lot.remaining_shares > 0 {
                if !valuations.contains_key(&lot.company_id) {
                    let fetched = self.store.valuations_for_company(lot.company_id).await?;
                    valuations.insert(lot.company_id, fetched);
                }
                let price = valuations[&lot.company_id]
                    .iter()
                    .find_map(|v| v.price_for(lot.share_class_id));
                if let Some(price) = price {
                    events.push(ValueEvent {
                        date: as_of.date_naive(),
                        company_id: lot.company_id,
                        delta: BigDecimal::from(lot.remaining_shares) * price,
                    });
                }
            }
        }

        Ok(chart::build_chart(events, as_of.date_naive()))
    }
}
