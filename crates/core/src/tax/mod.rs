//! GMF 4x1000 withholding overlay.
//!
//! GMF (gravamen a los movimientos financieros) is charged per bank
//! account as 4 per 1,000 over a configured set of base concepts. The base
//! set is versioned by effective date, so historical recomputations keep
//! using the configuration that was in force.

pub mod config;
pub mod withholding;

pub use config::{applicable_config, GmfConfig};
pub use withholding::withholding;
