//! Engine skip reasons.
//!
//! Per-concept problems never abort a recomputation: the concept is
//! skipped and reported while its siblings proceed. Only store failures in
//! the database layer abort a call.

use thiserror::Error;

use crate::calendar::CalendarError;
use crate::catalog::CatalogError;

/// Why one derived concept was left untouched by a recomputation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SkipReason {
    /// The concept's configuration is unusable (cycle, bad formula,
    /// unknown reference, unresolved role).
    #[error(transparent)]
    Configuration(#[from] CatalogError),

    /// The business-day scan needed for carry-forward failed.
    #[error("calendar: {0}")]
    Calendar(#[from] CalendarError),
}
