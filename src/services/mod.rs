pub mod affiliate;
pub mod cap_table;
pub mod chart;
pub mod portfolio;
pub mod purchase;

pub use affiliate::{AffiliateService, ReferralRewardInput};
pub use cap_table::{CapTableEntry, CapTableService, CapTableSummary};
pub use chart::{ChartPoint, ChartWindow, PortfolioChart};
pub use portfolio::{CompanyHolding, Portfolio, PortfolioPosition, PortfolioService};
pub use purchase::{PurchaseInput, PurchaseOutput, PurchaseService, SaleInput, SaleOutput};
