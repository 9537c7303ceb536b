//! Core business logic for Tesoro.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, dependency rules, and calculations live here.
//!
//! # Modules
//!
//! - `catalog` - Ledger concepts, typed dependency descriptors, dependency graph
//! - `calendar` - Business-day calendar (weekends and holidays)
//! - `tax` - GMF 4x1000 withholding overlay
//! - `engine` - Dependency-propagation engine (recomputes derived concepts)

pub mod calendar;
pub mod catalog;
pub mod engine;
pub mod tax;
