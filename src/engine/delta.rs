//! Period-over-period increments.
//!
//! A latest flag's increment becomes `latest.value - older.value` when the
//! older evaluation of the same disk carries a matching flag. Unmatched
//! flags keep `increment == value`.

use crate::models::evaluated::{EvaluatedDisk, Flag};
use serde::{Deserialize, Serialize};

/// How a latest flag finds its older counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Same display name. Two conditions rendering the same name are
    /// treated as one.
    #[default]
    Name,
    /// Same source metric (SMART ID, kernel code or verdict field).
    Code,
}

impl MatchStrategy {
    pub fn matches(&self, latest: &Flag, older: &Flag) -> bool {
        match self {
            MatchStrategy::Name => latest.name == older.name,
            MatchStrategy::Code => latest.source == older.source,
        }
    }
}

/// Only the first matching older flag is subtracted, so a row repeated in
/// both snapshots pairs with the first older copy instead of being
/// subtracted once per duplicate.
pub fn apply_delta<'a>(
    older:    &EvaluatedDisk,
    latest:   &'a mut EvaluatedDisk,
    strategy: MatchStrategy,
) -> &'a mut EvaluatedDisk {
    for flag in latest.flags.iter_mut() {
        if let Some(prev) = older.flags.iter().find(|o| strategy.matches(flag, o)) {
            flag.increment -= prev.value;
        }
    }
    latest
}
