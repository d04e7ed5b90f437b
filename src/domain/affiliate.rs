//! Referral program entities. Completed referrals feed the ledger as
//! zero-cost reward lots; everything else about the program lives outside
//! the core.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Completed,
    Cancelled,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Completed => "completed",
            ReferralStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReferralStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReferralStatus::Pending),
            "completed" => Ok(ReferralStatus::Completed),
            "cancelled" => Ok(ReferralStatus::Cancelled),
            other => Err(format!("unknown referral status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub user_id: Uuid,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub referrals: Vec<Referral>,
    pub created_at: DateTime<Utc>,
}

impl Affiliate {
    pub fn new(user_id: Uuid, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code: code.into(),
            referrals: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn referral(&self, user_id: Uuid) -> Option<&Referral> {
        self.referrals.iter().find(|r| r.user_id == user_id)
    }

    pub fn add_referral(&mut self, user_id: Uuid) {
        self.referrals.push(Referral {
            user_id,
            status: ReferralStatus::Pending,
            created_at: Utc::now(),
        });
    }

    pub fn set_referral_status(&mut self, user_id: Uuid, status: ReferralStatus) -> bool {
        match self.referrals.iter_mut().find(|r| r.user_id == user_id) {
            Some(referral) => {
                referral.status = status;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_lifecycle() {
        let mut affiliate = Affiliate::new(Uuid::new_v4(), "FRIEND-50");
        let referred = Uuid::new_v4();

        affiliate.add_referral(referred);
        assert_eq!(
            affiliate.referral(referred).map(|r| r.status),
            Some(ReferralStatus::Pending)
        );

        assert!(affiliate.set_referral_status(referred, ReferralStatus::Completed));
        assert_eq!(
            affiliate.referral(referred).map(|r| r.status),
            Some(ReferralStatus::Completed)
        );

        assert!(!affiliate.set_referral_status(Uuid::new_v4(), ReferralStatus::Cancelled));
    }
}
