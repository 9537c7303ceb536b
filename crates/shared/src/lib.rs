//! Shared types for Tesoro.
//!
//! This crate provides the typed entity IDs used across all other crates,
//! so a `CompanyId` can never be passed where an `AccountId` is expected.

pub mod types;
