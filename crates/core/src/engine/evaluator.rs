//! Per-account plan evaluation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tesoro_shared::types::{AccountId, ConceptId};

use crate::calendar::{BusinessDayCalendar, CalendarError};
use crate::catalog::error::join_ids;
use crate::catalog::{ConceptCatalog, Dependency};
use crate::engine::plan::EvaluationPlan;
use crate::engine::types::{
    AccountEvaluation, AuditSource, ChangedEntry, SkippedConcept, StoredValue,
};
use crate::tax::{withholding, GmfConfig};

/// Evaluates a plan for one date, account by account.
///
/// Construction resolves the neighbouring business days once; they are the
/// same for every account in the call.
pub struct Evaluator<'a> {
    catalog: &'a ConceptCatalog,
    date: NaiveDate,
    previous_day: Result<NaiveDate, CalendarError>,
    next_day: Result<NaiveDate, CalendarError>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator for `date`.
    #[must_use]
    pub fn new(
        catalog: &'a ConceptCatalog,
        calendar: &BusinessDayCalendar,
        date: NaiveDate,
    ) -> Self {
        Self {
            catalog,
            date,
            previous_day: calendar.previous_business_day(date, false),
            next_day: calendar.next_business_day(date, false),
        }
    }

    /// Runs the plan for one account.
    ///
    /// `stored` returns the persisted entry state for a (concept, date)
    /// pair. Within the run the evaluator tracks values it has already
    /// computed, so same-day reads see fresh values; missing dependency
    /// data reads as zero, which is tolerated rather than an error. An
    /// entry is emitted only when its amount, description, or area
    /// actually changes, which is what makes reruns no-ops.
    ///
    /// The returned changes are in evaluation order, with the next
    /// business day's opening balance (cross-period propagation) last.
    pub fn evaluate_account<V>(
        &self,
        plan: &EvaluationPlan,
        account_id: AccountId,
        gmf_config: Option<&GmfConfig>,
        stored: V,
    ) -> AccountEvaluation
    where
        V: Fn(ConceptId, NaiveDate) -> Option<StoredValue>,
    {
        let mut evaluation = AccountEvaluation::default();
        let mut current: BTreeMap<ConceptId, Decimal> = BTreeMap::new();

        for &concept_id in plan.steps() {
            let Some(concept) = self.catalog.get(concept_id) else {
                continue;
            };
            let Some(dependency) = &concept.dependency else {
                continue;
            };

            let computed = match dependency {
                Dependency::Copy(parent) => {
                    let raw = Self::read(&current, &stored, self.date, *parent);
                    Ok((
                        raw,
                        format!("Auto-calculated: copy of concept {parent}"),
                        AuditSource {
                            concept_ids: vec![*parent],
                            raw_amount: raw,
                        },
                    ))
                }
                Dependency::Sum(ids) => {
                    let raw: Decimal = ids
                        .iter()
                        .map(|&dep| Self::read(&current, &stored, self.date, dep))
                        .sum();
                    Ok((
                        raw,
                        format!("Auto-calculated: sum of concepts {}", join_ids(ids)),
                        AuditSource {
                            concept_ids: ids.clone(),
                            raw_amount: raw,
                        },
                    ))
                }
                Dependency::Subtract(parent) => {
                    let raw = -Self::read(&current, &stored, self.date, *parent);
                    Ok((
                        raw,
                        format!("Auto-calculated: negated value of concept {parent}"),
                        AuditSource {
                            concept_ids: vec![*parent],
                            raw_amount: raw,
                        },
                    ))
                }
                Dependency::CarryForward { closing } => match &self.previous_day {
                    Ok(previous) => {
                        let carried = stored(*closing, *previous).map(|s| s.amount);
                        let raw = carried.unwrap_or(Decimal::ZERO);
                        Ok((
                            raw,
                            carry_forward_description(*previous, carried),
                            AuditSource {
                                concept_ids: vec![*closing],
                                raw_amount: raw,
                            },
                        ))
                    }
                    Err(err) => Err(err.clone().into()),
                },
                Dependency::GmfWithholding => {
                    let bases: &[ConceptId] =
                        gmf_config.map_or(&[], |c| c.base_concepts.as_slice());
                    if bases.is_empty() {
                        Ok((
                            Decimal::ZERO,
                            "GMF 4x1000: no applicable configuration".to_string(),
                            AuditSource {
                                concept_ids: Vec::new(),
                                raw_amount: Decimal::ZERO,
                            },
                        ))
                    } else {
                        let base_sum: Decimal = bases
                            .iter()
                            .map(|&base| Self::read(&current, &stored, self.date, base))
                            .sum();
                        Ok((
                            withholding(base_sum),
                            format!(
                                "GMF 4x1000 over concepts {}: base sum {}",
                                join_ids(bases),
                                base_sum.normalize()
                            ),
                            AuditSource {
                                concept_ids: bases.to_vec(),
                                raw_amount: base_sum,
                            },
                        ))
                    }
                }
            };

            match computed {
                Ok((raw, description, source)) => {
                    // Stored sign comes from the class, never the arithmetic
                    let amount = concept.sign_class.normalize(raw);
                    current.insert(concept_id, amount);

                    let existing = stored(concept_id, self.date);
                    let unchanged = existing.as_ref().is_some_and(|e| {
                        e.amount == amount && e.description == description && e.area == concept.area
                    });
                    if !unchanged {
                        evaluation.changes.push(ChangedEntry {
                            date: self.date,
                            concept_id,
                            account_id,
                            area: concept.area,
                            previous_amount: existing.map(|e| e.amount),
                            new_amount: amount,
                            description,
                            source: Some(source),
                        });
                    }
                }
                Err(reason) => evaluation.skipped.push(SkippedConcept { concept_id, reason }),
            }
        }

        self.propagate_openings(&current, account_id, &stored, &mut evaluation);

        evaluation
    }

    /// Writes each closing balance into the paired opening-balance concept
    /// on the next business day.
    ///
    /// Zero closings are written too, flagged in the description, so the
    /// next day always states where its opening came from.
    fn propagate_openings<V>(
        &self,
        current: &BTreeMap<ConceptId, Decimal>,
        account_id: AccountId,
        stored: &V,
        evaluation: &mut AccountEvaluation,
    ) where
        V: Fn(ConceptId, NaiveDate) -> Option<StoredValue>,
    {
        let next = match &self.next_day {
            Ok(next) => *next,
            Err(err) => {
                for (opening, _) in self.catalog.carry_forward_pairs() {
                    evaluation.skipped.push(SkippedConcept {
                        concept_id: opening.id,
                        reason: err.clone().into(),
                    });
                }
                return;
            }
        };

        for (opening, closing_id) in self.catalog.carry_forward_pairs() {
            let carried = current
                .get(&closing_id)
                .copied()
                .or_else(|| stored(closing_id, self.date).map(|s| s.amount));
            let raw = carried.unwrap_or(Decimal::ZERO);
            let amount = opening.sign_class.normalize(raw);
            let description = carry_forward_description(self.date, carried);

            let existing = stored(opening.id, next);
            let unchanged = existing.as_ref().is_some_and(|e| {
                e.amount == amount && e.description == description && e.area == opening.area
            });
            if !unchanged {
                evaluation.changes.push(ChangedEntry {
                    date: next,
                    concept_id: opening.id,
                    account_id,
                    area: opening.area,
                    previous_amount: existing.map(|e| e.amount),
                    new_amount: amount,
                    description,
                    source: Some(AuditSource {
                        concept_ids: vec![closing_id],
                        raw_amount: raw,
                    }),
                });
            }
        }
    }

    fn read<V>(
        current: &BTreeMap<ConceptId, Decimal>,
        stored: &V,
        date: NaiveDate,
        id: ConceptId,
    ) -> Decimal
    where
        V: Fn(ConceptId, NaiveDate) -> Option<StoredValue>,
    {
        current
            .get(&id)
            .copied()
            .or_else(|| stored(id, date).map(|s| s.amount))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Description for a carried-forward opening balance.
///
/// Both directions of carry-forward (pulling into today, pushing into the
/// next day) produce identical text for the same entry, so reruns through
/// either path stay no-ops.
fn carry_forward_description(from: NaiveDate, carried: Option<Decimal>) -> String {
    match carried {
        None => format!("Carry-forward from {from}: no prior data"),
        Some(value) if value.is_zero() => {
            format!("Carry-forward of closing balance from {from} (zero)")
        }
        Some(_) => format!("Carry-forward of closing balance from {from}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Area, ConceptDefinition, ConceptRole, DependencyKind, SignClass};
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    type Store = BTreeMap<(ConceptId, NaiveDate), StoredValue>;

    fn id(raw: i32) -> ConceptId {
        ConceptId::new(raw)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
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

    fn lookup(store: &Store) -> impl Fn(ConceptId, NaiveDate) -> Option<StoredValue> + '_ {
        |concept, on| store.get(&(concept, on)).cloned()
    }

    fn change_for(changes: &[ChangedEntry], concept: i32) -> &ChangedEntry {
        changes
            .iter()
            .find(|c| c.concept_id == id(concept))
            .unwrap()
    }

    // Monday 2026-03-09; previous business day Friday 2026-03-06
    const fn monday() -> (i32, u32, u32) {
        (2026, 3, 9)
    }

    fn evaluate(
        catalog: &ConceptCatalog,
        calendar: &BusinessDayCalendar,
        on: NaiveDate,
        store: &Store,
        gmf: Option<&GmfConfig>,
    ) -> AccountEvaluation {
        let bases: BTreeSet<ConceptId> = gmf
            .map(|c| c.base_concepts.iter().copied().collect())
            .unwrap_or_default();
        let plan = EvaluationPlan::build(catalog, None, &bases);
        let evaluator = Evaluator::new(catalog, calendar, on);
        evaluator.evaluate_account(&plan, AccountId::new(), gmf, lookup(store))
    }

    #[test]
    fn test_neutral_sum_preserves_computed_sign() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let mut store = Store::new();
        put(&mut store, 5, date(y, m, d), dec!(300));
        put(&mut store, 6, date(y, m, d), dec!(-200));

        let result = evaluate(&catalog, &calendar, date(y, m, d), &store, None);

        let net = change_for(&result.changes, 20);
        assert_eq!(net.new_amount, dec!(100));
        assert_eq!(net.description, "Auto-calculated: sum of concepts 5, 6");
        assert_eq!(net.previous_amount, None);
        assert_eq!(
            net.source.as_ref().unwrap().concept_ids,
            vec![id(5), id(6)]
        );
    }

    #[test]
    fn test_sum_recomputes_after_edit() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let mut store = Store::new();
        put(&mut store, 5, on, dec!(1000));
        put(&mut store, 6, on, dec!(-1500));

        let first = evaluate(&catalog, &calendar, on, &store, None);
        assert_eq!(change_for(&first.changes, 20).new_amount, dec!(-500));
        apply(&mut store, &first.changes);

        // The outflow entry grows by another 1000
        put(&mut store, 6, on, dec!(-2500));
        let second = evaluate(&catalog, &calendar, on, &store, None);

        let net = change_for(&second.changes, 20);
        assert_eq!(net.previous_amount, Some(dec!(-500)));
        assert_eq!(net.new_amount, dec!(-1500));
    }

    #[test]
    fn test_outflow_class_overrides_computed_sign() {
        let catalog = ConceptCatalog::load(vec![
            def(5, "Refunds", SignClass::Inflow),
            ConceptDefinition {
                depends_on: Some(id(5)),
                dependency_kind: Some(DependencyKind::Copy),
                ..def(21, "Refund outflow mirror", SignClass::Outflow)
            },
        ]);
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let mut store = Store::new();
        put(&mut store, 5, date(y, m, d), dec!(300));

        let result = evaluate(&catalog, &calendar, date(y, m, d), &store, None);

        let mirror = change_for(&result.changes, 21);
        assert_eq!(mirror.new_amount, dec!(-300));
        assert_eq!(mirror.description, "Auto-calculated: copy of concept 5");
    }

    #[test]
    fn test_subtract_negates_parent() {
        let catalog = ConceptCatalog::load(vec![
            def(5, "Collections", SignClass::Inflow),
            ConceptDefinition {
                depends_on: Some(id(5)),
                dependency_kind: Some(DependencyKind::Subtract),
                ..def(22, "Collections reversal", SignClass::Neutral)
            },
        ]);
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let mut store = Store::new();
        put(&mut store, 5, date(y, m, d), dec!(750));

        let result = evaluate(&catalog, &calendar, date(y, m, d), &store, None);

        let reversal = change_for(&result.changes, 22);
        assert_eq!(reversal.new_amount, dec!(-750));
        assert_eq!(
            reversal.description,
            "Auto-calculated: negated value of concept 5"
        );
    }

    #[test]
    fn test_missing_dependency_reads_zero() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let mut store = Store::new();
        // Only collections present; supplier payments never entered
        put(&mut store, 5, on, dec!(1000));

        let result = evaluate(&catalog, &calendar, on, &store, None);

        assert_eq!(change_for(&result.changes, 20).new_amount, dec!(1000));
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_carry_forward_pulls_previous_business_day_closing() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let friday = date(2026, 3, 6);
        let mut store = Store::new();
        put(&mut store, 99, friday, dec!(300));

        let result = evaluate(&catalog, &calendar, on, &store, None);

        let opening = change_for(&result.changes, 1);
        assert_eq!(opening.new_amount, dec!(300));
        assert_eq!(
            opening.description,
            "Carry-forward of closing balance from 2026-03-06"
        );
    }

    #[test]
    fn test_carry_forward_without_prior_data_is_zero_and_flagged() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();

        let result = evaluate(&catalog, &calendar, date(y, m, d), &Store::new(), None);

        let opening = change_for(&result.changes, 1);
        assert_eq!(opening.new_amount, dec!(0));
        assert_eq!(
            opening.description,
            "Carry-forward from 2026-03-06: no prior data"
        );
    }

    #[test]
    fn test_closing_propagates_to_next_business_day_opening() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let friday = date(2026, 3, 6);
        let mut store = Store::new();
        put(&mut store, 5, friday, dec!(300));

        let result = evaluate(&catalog, &calendar, friday, &store, None);

        // Closing on Friday is 300; Monday's opening gets it
        let last = result.changes.last().unwrap();
        assert_eq!(last.concept_id, id(1));
        assert_eq!(last.date, date(2026, 3, 9));
        assert_eq!(last.new_amount, dec!(300));
        assert_eq!(
            last.description,
            "Carry-forward of closing balance from 2026-03-06"
        );
    }

    #[test]
    fn test_zero_closing_still_writes_next_opening_flagged() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let friday = date(2026, 3, 6);
        let mut store = Store::new();
        put(&mut store, 5, friday, dec!(700));
        put(&mut store, 6, friday, dec!(-700));

        let result = evaluate(&catalog, &calendar, friday, &store, None);

        let last = result.changes.last().unwrap();
        assert_eq!(last.concept_id, id(1));
        assert_eq!(last.new_amount, dec!(0));
        assert_eq!(
            last.description,
            "Carry-forward of closing balance from 2026-03-06 (zero)"
        );
    }

    #[test]
    fn test_gmf_uses_configured_bases() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let account = AccountId::new();
        let mut store = Store::new();
        put(&mut store, 5, on, dec!(1000000));
        put(&mut store, 6, on, dec!(-200000));

        let config = GmfConfig {
            account_id: account,
            effective_from: date(2026, 1, 1),
            base_concepts: vec![id(5), id(6)],
        };
        let bases: BTreeSet<ConceptId> = config.base_concepts.iter().copied().collect();
        let plan = EvaluationPlan::build(&catalog, None, &bases);
        let evaluator = Evaluator::new(&catalog, &calendar, on);
        let result = evaluator.evaluate_account(&plan, account, Some(&config), lookup(&store));

        let gmf = change_for(&result.changes, 49);
        // 800,000 * 4/1000 = 3,200, stored negative (outflow)
        assert_eq!(gmf.new_amount, dec!(-3200.00));
        assert_eq!(
            gmf.description,
            "GMF 4x1000 over concepts 5, 6: base sum 800000"
        );
        assert_eq!(gmf.source.as_ref().unwrap().raw_amount, dec!(800000));
    }

    #[test]
    fn test_gmf_without_config_computes_zero() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let mut store = Store::new();
        put(&mut store, 5, date(y, m, d), dec!(1000000));

        let result = evaluate(&catalog, &calendar, date(y, m, d), &store, None);

        let gmf = change_for(&result.changes, 49);
        assert_eq!(gmf.new_amount, dec!(0));
        assert_eq!(gmf.description, "GMF 4x1000: no applicable configuration");
    }

    #[test]
    fn test_rerun_without_changes_is_a_noop() {
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let mut store = Store::new();
        put(&mut store, 5, on, dec!(1000));
        put(&mut store, 6, on, dec!(-400));
        put(&mut store, 99, date(2026, 3, 6), dec!(250));

        let first = evaluate(&catalog, &calendar, on, &store, None);
        assert!(!first.changes.is_empty());
        apply(&mut store, &first.changes);

        let second = evaluate(&catalog, &calendar, on, &store, None);
        assert!(second.changes.is_empty());
        assert!(second.skipped.is_empty());
    }

    #[test]
    fn test_concept_area_change_rewrites_stored_entry() {
        // The subtotal moved to the payroll sheet; its stored row still
        // carries the old area and must be rewritten even though amount
        // and description match
        let catalog = ConceptCatalog::load(vec![
            def(5, "Collections", SignClass::Inflow),
            ConceptDefinition {
                area: Area::Payroll,
                formula: Some("SUM(5)".to_string()),
                ..def(20, "Net movements", SignClass::Neutral)
            },
        ]);
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let mut store = Store::new();
        put(&mut store, 5, on, dec!(1000));
        store.insert(
            (id(20), on),
            StoredValue {
                amount: dec!(1000),
                description: "Auto-calculated: sum of concepts 5".to_string(),
                area: Area::Treasury,
            },
        );

        let result = evaluate(&catalog, &calendar, on, &store, None);

        let net = change_for(&result.changes, 20);
        assert_eq!(net.area, Area::Payroll);
        assert_eq!(net.previous_amount, Some(dec!(1000)));
        assert_eq!(net.new_amount, dec!(1000));

        apply(&mut store, &result.changes);
        let second = evaluate(&catalog, &calendar, on, &store, None);
        assert!(second.changes.is_empty());
        assert!(second.skipped.is_empty());
    }

    #[test]
    fn test_derived_chain_reads_fresh_values() {
        // Closing must see the net-movements value computed in this run,
        // not whatever the store had before
        let catalog = standard_catalog();
        let calendar = BusinessDayCalendar::default();
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let mut store = Store::new();
        put(&mut store, 5, on, dec!(1000));
        put(&mut store, 6, on, dec!(-400));
        // Stale subtotal from an earlier state
        store.insert(
            (id(20), on),
            StoredValue {
                amount: dec!(9999),
                description: "Auto-calculated: sum of concepts 5, 6".to_string(),
                area: Area::Treasury,
            },
        );

        let result = evaluate(&catalog, &calendar, on, &store, None);

        assert_eq!(change_for(&result.changes, 20).new_amount, dec!(600));
        // 99 = opening 0 + net 600 + gmf 0
        assert_eq!(change_for(&result.changes, 99).new_amount, dec!(600));
    }

    #[test]
    fn test_pathological_calendar_skips_carry_forward_only() {
        let catalog = standard_catalog();
        // Every day in a wide window is a holiday
        let holidays = (1..=31)
            .map(|d| date(2026, 3, d))
            .chain((1..=28).map(|d| date(2026, 2, d)));
        let calendar = BusinessDayCalendar::new(holidays);
        let (y, m, d) = monday();
        let on = date(y, m, d);
        let mut store = Store::new();
        put(&mut store, 5, on, dec!(1000));

        let result = evaluate(&catalog, &calendar, on, &store, None);

        // The opening balance is skipped in both directions; sums still run
        assert!(result
            .skipped
            .iter()
            .all(|s| s.concept_id == id(1)
                && matches!(s.reason, crate::engine::SkipReason::Calendar(_))));
        assert!(!result.skipped.is_empty());
        assert!(result.changes.iter().any(|c| c.concept_id == id(20)));
    }
}
