//! Per-account GMF overlay configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tesoro_shared::types::{AccountId, ConceptId};

/// One version of an account's GMF base-set configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmfConfig {
    /// Account the configuration applies to.
    pub account_id: AccountId,
    /// First date this version is in force.
    pub effective_from: NaiveDate,
    /// Concepts whose signed sum forms the withholding base.
    pub base_concepts: Vec<ConceptId>,
}

/// Picks the configuration version applicable on `date`.
///
/// The latest version with `effective_from` on or before the date wins.
/// `None` means the account has no applicable configuration: the
/// withholding base is empty and the tax computes to zero, which is not an
/// error.
#[must_use]
pub fn applicable_config(
    configs: &[GmfConfig],
    account_id: AccountId,
    date: NaiveDate,
) -> Option<&GmfConfig> {
    configs
        .iter()
        .filter(|c| c.account_id == account_id && c.effective_from <= date)
        .max_by_key(|c| c.effective_from)
}
