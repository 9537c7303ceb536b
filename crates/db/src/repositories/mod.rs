//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. The recompute service composes them to run the pure
//! engine inside one database transaction.

pub mod account;
pub mod catalog;
pub mod company;
pub mod gmf_config;
pub mod holiday;
pub mod ledger;
pub mod recompute;

pub use account::{AccountRepository, CreateAccountInput};
pub use catalog::{CatalogCache, ConceptRepository, UpsertConceptInput};
pub use company::CompanyRepository;
pub use gmf_config::{CreateGmfConfigInput, GmfConfigRepository};
pub use holiday::HolidayRepository;
pub use ledger::{LedgerError, LedgerRepository, RecordEntryInput};
pub use recompute::{RecomputeError, RecomputeService};
