//! Cap table aggregation: who holds how much of a company, grouped by
//! holder, share class and holding route.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::ports::LedgerStore;

/// One cap-table row. A holder owning through both a direct lot and a
/// holding company gets two rows; `total_shares` and `percentage_ownership`
/// describe the holder across all of their rows.
#[derive(Debug, Clone, Serialize)]
pub struct CapTableEntry {
    pub user_id: Uuid,
    pub holder_name: String,
    pub share_class_id: Uuid,
    pub share_class_name: String,
    pub holding_company_id: Option<Uuid>,
    pub holding_company_name: Option<String>,
    pub is_holding_company: bool,
    pub shares: i64,
    pub total_shares: i64,
    pub percentage_ownership: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapTableSummary {
    pub company_id: Uuid,
    pub total_outstanding_shares: i64,
    pub shareholder_count: usize,
    pub entries: Vec<CapTableEntry>,
}

pub struct CapTableService {
    store: Arc<dyn LedgerStore>,
}

impl CapTableService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Aggregate outstanding lots into cap-table rows. Output order is
    /// deterministic: descending holder total, then holder id, then class
    /// name, with direct rows before holding-company rows.
    pub async fn cap_table(&self, company_id: Uuid) -> LedgerResult<Vec<CapTableEntry>> {
        let company = self
            .store
            .company(company_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("company", company_id))?;

        let lots = self.store.lots_for_company(company.id, false).await?;

        let mut groups: HashMap<(Uuid, Uuid, Option<Uuid>), i64> = HashMap::new();
        for lot in &lots {
            *groups
                .entry((lot.user_id, lot.share_class_id, lot.holding_company_id))
                .or_default() += lot.remaining_shares;
        }

        let mut holder_totals: HashMap<Uuid, i64> = HashMap::new();
        for ((user_id, _, _), shares) in &groups {
            *holder_totals.entry(*user_id).or_default() += shares;
        }

        let denominator: i64 = holder_totals.values().sum();
        if denominator == 0 {
            return Ok(Vec::new());
        }

        let mut user_names: HashMap<Uuid, String> = HashMap::new();
        let mut class_names: HashMap<Uuid, String> = HashMap::new();
        let mut holding_names: HashMap<Uuid, Option<String>> = HashMap::new();

        let mut entries = Vec::with_capacity(groups.len());
        for ((user_id, share_class_id, holding_company_id), shares) in groups {
            let holder_name = match user_names.get(&user_id) {
                Some(name) => name.clone(),
                None => {
                    let name = match self.store.user(user_id).await? {
                        Some(user) => user.name,
                        None => {
                            warn!(user_id = %user_id, "cap table references unknown user");
                            "unknown holder".to_string()
                        }
                    };
                    user_names.insert(user_id, name.clone());
                    name
                }
            };

            let share_class_name = match class_names.get(&share_class_id) {
                Some(name) => name.clone(),
                None => {
                    let name = match self.store.share_class(company.id, share_class_id).await? {
                        Some(class) => class.name,
                        None => {
                            warn!(share_class_id = %share_class_id, "cap table references unknown share class");
                            "unknown class".to_string()
                        }
                    };
                    class_names.insert(share_class_id, name.clone());
                    name
                }
            };

            let holding_company_name = match holding_company_id {
                Some(id) => match holding_names.get(&id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = self.store.holding_company(id).await?.map(|h| h.name);
                        if name.is_none() {
                            warn!(holding_company_id = %id, "cap table references unknown holding company");
                        }
                        holding_names.insert(id, name.clone());
                        name
                    }
                },
                None => None,
            };

            let total_shares = holder_totals.get(&user_id).copied().unwrap_or(0);
            entries.push(CapTableEntry {
                user_id,
                holder_name,
                share_class_id,
                share_class_name,
                holding_company_id,
                holding_company_name,
                is_holding_company: holding_company_id.is_some(),
                shares,
                total_shares,
                percentage_ownership: round2(total_shares as f64 * 100.0 / denominator as f64),
            });
        }

        entries.sort_by(|a, b| {
            b.total_shares
                .cmp(&a.total_shares)
                .then(a.user_id.cmp(&b.user_id))
                .then(a.share_class_name.cmp(&b.share_class_name))
                .then(a.is_holding_company.cmp(&b.is_holding_company))
                .then(a.holding_company_id.cmp(&b.holding_company_id))
        });

        Ok(entries)
    }

    /// Rows plus the headline figures the cap-table view serves: total
    /// outstanding shares and the distinct holder count. A holder present
    /// both directly and through a holding company counts once.
    pub async fn cap_table_summary(&self, company_id: Uuid) -> LedgerResult<CapTableSummary> {
        let entries = self.cap_table(company_id).await?;

        let total_outstanding_shares = entries.iter().map(|e| e.shares).sum();
        let shareholder_count = entries
            .iter()
            .map(|e| e.user_id)
            .collect::<HashSet<_>>()
            .len();

        Ok(CapTableSummary {
            company_id,
            total_outstanding_shares,
            shareholder_count,
            entries,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(25.0), 25.0);
    }
}
