//! Property-based tests for the evaluation engine.
//!
//! - Property 1: Stored Sign Discipline
//! - Property 2: Recomputation Idempotence
//! - Property 3: Carry-Forward Continuity
//! - Property 4: GMF Withholding Correctness
//! - Property 5: Scoped Recomputation Completeness

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tesoro_shared::types::{AccountId, ConceptId};

use super::evaluator::Evaluator;
use super::plan::EvaluationPlan;
use super::types::{AccountEvaluation, ChangedEntry, StoredValue};
use crate::calendar::BusinessDayCalendar;
use crate::catalog::{Area, ConceptCatalog, ConceptDefinition, ConceptRole, SignClass};
use crate::tax::{withholding, GmfConfig};

type Store = BTreeMap<(ConceptId, NaiveDate), StoredValue>;

/// Strategy to generate signed amounts with two decimal places.
fn amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn id(raw: i32) -> ConceptId {
    ConceptId::new(raw)
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()
}

fn def(raw_id: i32, name: &str, sign_class: SignClass) -> ConceptDefinition {
    ConceptDefinition {
        id: id(raw_id),
        name: name.to_string(),
        sign_class,
        area: Area::Treasury,
        role: ConceptRole::None,
        depends_on: None,
        dependency_kind: None,
        formula: None,
        display_order: raw_id,
    }
}

/// A daily sheet with an opening balance, two movement categories, a
/// subtotal, the tax row, and a closing balance.
fn standard_catalog() -> ConceptCatalog {
    ConceptCatalog::load(vec![
        ConceptDefinition {
            role: ConceptRole::OpeningBalance,
            ..def(1, "Opening balance", SignClass::Neutral)
        },
        def(5, "Collections", SignClass::Inflow),
        def(6, "Supplier payments", SignClass::Outflow),
        ConceptDefinition {
            formula: Some("SUM(5,6)".to_string()),
            ..def(20, "Net movements", SignClass::Neutral)
        },
        ConceptDefinition {
            role: ConceptRole::GmfTax,
            ..def(49, "GMF 4x1000", SignClass::Outflow)
        },
        ConceptDefinition {
            role: ConceptRole::ClosingBalance,
            formula: Some("SUM(1,20,49)".to_string()),
            ..def(99, "Closing balance", SignClass::Neutral)
        },
    ])
}

fn put(store: &mut Store, concept: i32, on: NaiveDate, amount: Decimal) {
    store.insert(
        (id(concept), on),
        StoredValue {
            amount,
            description: "Manual entry".to_string(),
            area: Area::Treasury,
        },
    );
}

fn apply(store: &mut Store, changes: &[ChangedEntry]) {
    for change in changes {
        store.insert(
            (change.concept_id, change.date),
            StoredValue {
                amount: change.new_amount,
                description: change.description.clone(),
                area: change.area,
            },
        );
    }
}

fn run(
    catalog: &ConceptCatalog,
    store: &Store,
    on: NaiveDate,
    trigger: Option<ConceptId>,
    gmf: Option<&GmfConfig>,
    account: AccountId,
) -> AccountEvaluation {
    let bases: BTreeSet<ConceptId> = gmf
        .map(|c| c.base_concepts.iter().copied().collect())
        .unwrap_or_default();
    let calendar = BusinessDayCalendar::default();
    let plan = EvaluationPlan::build(catalog, trigger, &bases);
    Evaluator::new(catalog, &calendar, on).evaluate_account(&plan, account, gmf, |concept, date| {
        store.get(&(concept, date)).cloned()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Stored Sign Discipline
    // =========================================================================

    /// *For any* stored base amounts, every emitted entry's amount SHALL
    /// match its concept's sign class: inflows non-negative, outflows
    /// non-positive.
    #[test]
    fn prop_emitted_entries_respect_sign_class(
        a in amount(),
        b in amount(),
        prior in amount(),
    ) {
        let catalog = standard_catalog();
        let mut store = Store::new();
        put(&mut store, 5, monday(), a);
        put(&mut store, 6, monday(), b);
        put(&mut store, 99, friday(), prior);

        let result = run(&catalog, &store, monday(), None, None, AccountId::new());

        for change in &result.changes {
            let concept = catalog.get(change.concept_id).unwrap();
            match concept.sign_class {
                SignClass::Inflow => prop_assert!(
                    change.new_amount >= Decimal::ZERO,
                    "inflow concept {} stored {}", change.concept_id, change.new_amount
                ),
                SignClass::Outflow => prop_assert!(
                    change.new_amount <= Decimal::ZERO,
                    "outflow concept {} stored {}", change.concept_id, change.new_amount
                ),
                SignClass::Neutral => {}
            }
        }
    }

    // =========================================================================
    // Property 2: Recomputation Idempotence
    // =========================================================================

    /// *For any* stored base amounts, applying a run's changes and
    /// re-running SHALL emit nothing.
    #[test]
    fn prop_rerun_after_apply_is_noop(
        a in amount(),
        b in amount(),
        prior in amount(),
    ) {
        let catalog = standard_catalog();
        let account = AccountId::new();
        let mut store = Store::new();
        put(&mut store, 5, monday(), a);
        put(&mut store, 6, monday(), b);
        put(&mut store, 99, friday(), prior);

        let first = run(&catalog, &store, monday(), None, None, account);
        apply(&mut store, &first.changes);

        let second = run(&catalog, &store, monday(), None, None, account);
        prop_assert!(
            second.changes.is_empty(),
            "rerun emitted {} changes", second.changes.len()
        );
    }

    // =========================================================================
    // Property 3: Carry-Forward Continuity
    // =========================================================================

    /// *For any* day state, the next business day's opening balance SHALL
    /// equal the closing balance that produced it.
    #[test]
    fn prop_carry_forward_continuity(
        a in amount(),
        b in amount(),
        prior in amount(),
    ) {
        let catalog = standard_catalog();
        let account = AccountId::new();
        let thursday = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let mut store = Store::new();
        put(&mut store, 5, friday(), a);
        put(&mut store, 6, friday(), b);
        put(&mut store, 99, thursday, prior);

        let result = run(&catalog, &store, friday(), None, None, account);
        apply(&mut store, &result.changes);

        let closing = store
            .get(&(id(99), friday()))
            .map(|s| s.amount)
            .unwrap_or_default();
        let opening = store
            .get(&(id(1), monday()))
            .map(|s| s.amount)
            .unwrap_or_default();
        prop_assert_eq!(opening, closing);
    }

    /// *For any* day state, the closing balance SHALL equal opening plus
    /// net movements plus the tax row.
    #[test]
    fn prop_closing_balance_equation(
        a in amount(),
        b in amount(),
        prior in amount(),
    ) {
        let catalog = standard_catalog();
        let account = AccountId::new();
        let mut store = Store::new();
        put(&mut store, 5, monday(), a);
        put(&mut store, 6, monday(), b);
        put(&mut store, 99, friday(), prior);

        let config = GmfConfig {
            account_id: account,
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            base_concepts: vec![id(5), id(6)],
        };
        let result = run(&catalog, &store, monday(), None, Some(&config), account);
        apply(&mut store, &result.changes);

        let get = |concept: i32| {
            store
                .get(&(id(concept), monday()))
                .map(|s| s.amount)
                .unwrap_or_default()
        };
        prop_assert_eq!(get(99), get(1) + get(20) + get(49));
    }

    // =========================================================================
    // Property 4: GMF Withholding Correctness
    // =========================================================================

    /// *For any* base amounts, the stored tax SHALL be the 4x1000
    /// withholding over the base sum, forced non-positive by the tax
    /// concept's outflow class.
    #[test]
    fn prop_gmf_matches_base_sum(
        a in amount(),
        b in amount(),
    ) {
        let catalog = standard_catalog();
        let account = AccountId::new();
        let mut store = Store::new();
        put(&mut store, 5, monday(), a);
        put(&mut store, 6, monday(), b);

        let config = GmfConfig {
            account_id: account,
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            base_concepts: vec![id(5), id(6)],
        };
        let result = run(&catalog, &store, monday(), None, Some(&config), account);

        let gmf = result
            .changes
            .iter()
            .find(|c| c.concept_id == id(49))
            .unwrap();
        let expected = -withholding(a + b).abs();
        prop_assert_eq!(gmf.new_amount, expected);
        prop_assert_eq!(gmf.source.as_ref().unwrap().raw_amount, a + b);
    }

    // =========================================================================
    // Property 5: Scoped Recomputation Completeness
    // =========================================================================

    /// *For any* edit to a base concept, a run scoped to that concept's
    /// dependents SHALL leave no residual work for a full run.
    #[test]
    fn prop_scoped_run_leaves_no_residual_work(
        a in amount(),
        b in amount(),
        edit in amount(),
        prior in amount(),
    ) {
        let catalog = standard_catalog();
        let account = AccountId::new();
        let mut store = Store::new();
        put(&mut store, 5, monday(), a);
        put(&mut store, 6, monday(), b);
        put(&mut store, 99, friday(), prior);

        // Bring the day to a consistent state first
        let full = run(&catalog, &store, monday(), None, None, account);
        apply(&mut store, &full.changes);

        // Edit one base concept, then recompute only its dependents
        put(&mut store, 5, monday(), edit);
        let scoped = run(&catalog, &store, monday(), Some(id(5)), None, account);
        apply(&mut store, &scoped.changes);

        let residual = run(&catalog, &store, monday(), None, None, account);
        prop_assert!(
            residual.changes.is_empty(),
            "full run after scoped run emitted {} changes", residual.changes.len()
        );
    }
}
