//! Framework-agnostic domain entities for the share ledger.

pub mod affiliate;
pub mod company;
pub mod lot;
pub mod transaction;
pub mod user;

pub use affiliate::{Affiliate, Referral, ReferralStatus};
pub use company::{Company, CompanyValuation, HoldingCompany, ShareClass};
pub use lot::{Identifier, IdentifierKind, ShareLot, ShareStatus};
pub use transaction::{
    ShareTransaction, ShareTransactionKind, ShareTransactionStatus, Transaction, TransactionKind,
    TransactionStatus,
};
pub use user::User;
