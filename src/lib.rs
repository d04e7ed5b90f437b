//! Share-ownership ledger for an equity crowdfunding platform.
//!
//! Records share lots and their partial consumption, keeps an append-only
//! transaction log alongside them, and derives cap tables, per-user
//! portfolios and historical value series from that ledger. Transport,
//! authentication and rendering live in thin layers on top; this crate
//! exposes plain async operations over a pluggable [`ports::LedgerStore`].

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod telemetry;
pub mod validation;

use std::sync::Arc;

use uuid::Uuid;

pub use config::Config;
pub use error::{LedgerError, LedgerResult};
use ports::{LedgerStore, Mailer, Notifier};
use services::{
    AffiliateService, CapTableEntry, CapTableService, CapTableSummary, Portfolio, PortfolioChart,
    PortfolioService, PurchaseInput, PurchaseOutput, PurchaseService, ReferralRewardInput,
    SaleInput, SaleOutput,
};

/// Composition root wiring the ledger services over one store and one
/// outbound gateway. This is the surface the HTTP controllers call.
pub struct Ledger {
    purchases: PurchaseService,
    cap_tables: CapTableService,
    portfolios: PortfolioService,
    affiliates: AffiliateService,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn Notifier>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            purchases: PurchaseService::new(store.clone(), notifier, mailer),
            cap_tables: CapTableService::new(store.clone()),
            portfolios: PortfolioService::new(store.clone()),
            affiliates: AffiliateService::new(store),
        }
    }

    pub async fn purchase_shares(&self, input: PurchaseInput) -> LedgerResult<PurchaseOutput> {
        self.purchases.purchase_shares(input).await
    }

    pub async fn record_sale(&self, input: SaleInput) -> LedgerResult<SaleOutput> {
        self.purchases.record_sale(input).await
    }

    pub async fn cap_table(&self, company_id: Uuid) -> LedgerResult<Vec<CapTableEntry>> {
        self.cap_tables.cap_table(company_id).await
    }

    pub async fn cap_table_summary(&self, company_id: Uuid) -> LedgerResult<CapTableSummary> {
        self.cap_tables.cap_table_summary(company_id).await
    }

    pub async fn user_portfolio(&self, user_id: Uuid) -> LedgerResult<Portfolio> {
        self.portfolios.user_portfolio(user_id).await
    }

    pub async fn portfolio_chart(&self, user_id: Uuid) -> LedgerResult<PortfolioChart> {
        self.portfolios.portfolio_chart(user_id).await
    }

    pub async fn portfolio_chart_at(
        &self,
        user_id: Uuid,
        as_of: chrono::DateTime<chrono::Utc>,
    ) -> LedgerResult<PortfolioChart> {
        self.portfolios.portfolio_chart_at(user_id, as_of).await
    }

    pub async fn register_affiliate_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> LedgerResult<domain::Affiliate> {
        self.affiliates.register_code(user_id, code).await
    }

    pub async fn record_referral(
        &self,
        code: &str,
        referred_user_id: Uuid,
    ) -> LedgerResult<domain::Affiliate> {
        self.affiliates.record_referral(code, referred_user_id).await
    }

    pub async fn complete_referral(
        &self,
        input: ReferralRewardInput,
    ) -> LedgerResult<PurchaseOutput> {
        self.affiliates.complete_referral(input).await
    }
}
