//! Referral program: codes, referred users, and zero-cost reward lots.
//!
//! Reward lots go through the same atomic purchase commit as paid lots, so
//! they are availability-checked against the class cap like any other issue.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Affiliate, Identifier, ReferralStatus, ShareLot, ShareTransaction, ShareTransactionKind,
    Transaction, TransactionKind,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::LedgerStore;
use crate::services::purchase::PurchaseOutput;
use crate::validation::{self, ValidationError, AFFILIATE_CODE_MAX_LEN};

#[derive(Debug, Clone)]
pub struct ReferralRewardInput {
    pub code: String,
    pub referred_user_id: Uuid,
    pub company_id: Uuid,
    pub share_class_id: Uuid,
    pub identifier: Identifier,
    pub reward_shares: i64,
    pub currency: String,
}

pub struct AffiliateService {
    store: Arc<dyn LedgerStore>,
}

impl AffiliateService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn register_code(&self, user_id: Uuid, code: &str) -> LedgerResult<Affiliate> {
        let code = validation::sanitize_string(code);
        validation::validate_required("code", &code)?;
        validation::validate_max_len("code", &code, AFFILIATE_CODE_MAX_LEN)?;

        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", user_id))?;
        if self.store.affiliate_for_user(user.id).await?.is_some() {
            return Err(LedgerError::Validation(ValidationError::new(
                "code",
                "user already has an affiliate code",
            )));
        }
        if self.store.affiliate_by_code(&code).await?.is_some() {
            return Err(LedgerError::Validation(ValidationError::new(
                "code",
                "already in use",
            )));
        }

        self.store.upsert_affiliate(&Affiliate::new(user.id, code)).await
    }

    pub async fn record_referral(
        &self,
        code: &str,
        referred_user_id: Uuid,
    ) -> LedgerResult<Affiliate> {
        let mut affiliate = self
            .store
            .affiliate_by_code(code)
            .await?
            .ok_or_else(|| LedgerError::not_found("affiliate code", code))?;

        if affiliate.referral(referred_user_id).is_some() {
            return Err(LedgerError::Validation(ValidationError::new(
                "referral",
                "already recorded",
            )));
        }

        affiliate.add_referral(referred_user_id);
        self.store.upsert_affiliate(&affiliate).await
    }

    /// Complete a pending referral and mint its reward: a zero-cost lot for
    /// the code owner, recorded as a `ReferralBonus` transaction with a
    /// zero-amount buy movement.
    pub async fn complete_referral(
        &self,
        input: ReferralRewardInput,
    ) -> LedgerResult<PurchaseOutput> {
        validation::validate_identifier(&input.identifier)?;
        validation::validate_quantity("reward_shares", input.reward_shares)?;

        let mut affiliate = self
            .store
            .affiliate_by_code(&input.code)
            .await?
            .ok_or_else(|| LedgerError::not_found("affiliate code", &input.code))?;
        let referral = affiliate
            .referral(input.referred_user_id)
            .ok_or_else(|| LedgerError::not_found("referral", input.referred_user_id))?;
        if referral.status != ReferralStatus::Pending {
            return Err(LedgerError::Validation(ValidationError::new(
                "referral",
                format!("is {}, expected pending", referral.status.as_str()),
            )));
        }

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

        let tx = Transaction::new(
            affiliate.user_id,
            "referral",
            TransactionKind::ReferralBonus,
            BigDecimal::from(0),
            input.currency.clone(),
            Some(json!({
                "code": affiliate.code,
                "referred_user_id": input.referred_user_id,
            })),
        );
        let lot = ShareLot::new(
            affiliate.user_id,
            company.id,
            share_class.id,
            None,
            input.identifier.clone(),
            input.reward_shares,
            BigDecimal::from(0),
        );
        let st = ShareTransaction::new(
            lot.id,
            tx.id,
            affiliate.user_id,
            company.id,
            share_class.id,
            ShareTransactionKind::Buy,
            input.reward_shares,
            BigDecimal::from(0),
            lot.purchase_date,
        )?;

        self.store.commit_purchase(&tx, &lot, &st).await?;

        affiliate.set_referral_status(input.referred_user_id, ReferralStatus::Completed);
        self.store.upsert_affiliate(&affiliate).await?;
        info!(
            affiliate_user_id = %affiliate.user_id,
            referred_user_id = %input.referred_user_id,
            reward_shares = input.reward_shares,
            "referral reward granted"
        );

        Ok(PurchaseOutput {
            transaction_id: tx.id,
            lot_id: lot.id,
        })
    }
}
