//! Database seeder for Tesoro development and testing.
//!
//! Seeds a demo company with two bank accounts, the daily-sheet concept
//! catalog, the 2026 Colombian holiday calendar, GMF configurations, and
//! one worked business day of entries.
//!
//! Usage: cargo run --bin seeder

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tesoro_core::catalog::{Area, ConceptRole, DependencyKind, SignClass};
use tesoro_db::entities::{accounts, companies};
use tesoro_db::repositories::{
    ConceptRepository, CreateGmfConfigInput, GmfConfigRepository, HolidayRepository,
    RecomputeService, RecordEntryInput, UpsertConceptInput,
};
use tesoro_shared::types::{AccountId, ConceptId, UserId};
use uuid::Uuid;

/// Demo company ID (consistent for all seeds)
const DEMO_COMPANY_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo treasurer user ID stamped on seeded entries
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Operating account ID
const OPERATING_ACCOUNT_ID: &str = "00000000-0000-0000-0000-000000000011";
/// Payroll account ID
const PAYROLL_ACCOUNT_ID: &str = "00000000-0000-0000-0000-000000000012";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = tesoro_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo company...");
    seed_demo_company(&db).await;

    println!("Seeding bank accounts...");
    seed_accounts(&db).await;

    println!("Seeding concept catalog...");
    seed_concepts(&db).await;

    println!("Seeding 2026 Colombian holidays...");
    seed_holidays(&db).await;

    println!("Seeding GMF configurations...");
    seed_gmf_configs(&db).await;

    println!("Seeding a worked business day...");
    seed_demo_day(&db).await;

    println!("Seeding complete!");
}

fn demo_company_id() -> Uuid {
    Uuid::parse_str(DEMO_COMPANY_ID).unwrap()
}

fn demo_user_id() -> UserId {
    UserId::from_uuid(Uuid::parse_str(DEMO_USER_ID).unwrap())
}

fn operating_account_id() -> Uuid {
    Uuid::parse_str(OPERATING_ACCOUNT_ID).unwrap()
}

fn payroll_account_id() -> Uuid {
    Uuid::parse_str(PAYROLL_ACCOUNT_ID).unwrap()
}

/// Seeds the demo company.
async fn seed_demo_company(db: &DatabaseConnection) {
    // Check if the company already exists
    if companies::Entity::find_by_id(demo_company_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Demo company already exists, skipping...");
        return;
    }

    let company = companies::ActiveModel {
        id: Set(demo_company_id()),
        name: Set("Inversiones Demo S.A.S.".to_string()),
        tax_id: Set(Some("900123456-7".to_string())),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = company.insert(db).await {
        eprintln!("Failed to insert demo company: {e}");
    } else {
        println!("  Created demo company: Inversiones Demo S.A.S.");
    }
}

/// Seeds the two demo bank accounts.
async fn seed_accounts(db: &DatabaseConnection) {
    let accounts_data = [
        (
            operating_account_id(),
            "Operating",
            "Bancolombia",
            "012-345678-90",
        ),
        (
            payroll_account_id(),
            "Payroll",
            "Davivienda",
            "455-700112-34",
        ),
    ];

    for (id, name, bank, number) in accounts_data {
        if accounts::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  Account {name} already exists, skipping...");
            continue;
        }

        let account = accounts::ActiveModel {
            id: Set(id),
            company_id: Set(demo_company_id()),
            name: Set(name.to_string()),
            bank_name: Set(Some(bank.to_string())),
            account_number: Set(Some(number.to_string())),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = account.insert(db).await {
            eprintln!("Failed to insert account {name}: {e}");
        } else {
            println!("  Created account: {name} ({bank})");
        }
    }
}

fn concept(id: i32, name: &str, sign_class: SignClass) -> UpsertConceptInput {
    UpsertConceptInput {
        id: ConceptId::new(id),
        name: name.to_string(),
        sign_class,
        area: Area::Treasury,
        role: ConceptRole::None,
        depends_on: None,
        dependency_kind: None,
        formula: None,
        display_order: id,
    }
}

/// Seeds the daily-sheet concept catalog.
///
/// Upserts are idempotent, so re-running the seeder refreshes the
/// definitions in place.
async fn seed_concepts(db: &DatabaseConnection) {
    let catalog = vec![
        UpsertConceptInput {
            role: ConceptRole::OpeningBalance,
            ..concept(1, "Opening balance", SignClass::Neutral)
        },
        concept(5, "Customer collections", SignClass::Inflow),
        concept(6, "Loan disbursements received", SignClass::Inflow),
        concept(7, "Interest income", SignClass::Inflow),
        concept(10, "Supplier payments", SignClass::Outflow),
        UpsertConceptInput {
            area: Area::Both,
            ..concept(11, "Payroll transfers", SignClass::Outflow)
        },
        concept(12, "Tax payments", SignClass::Outflow),
        concept(13, "Bank fees", SignClass::Outflow),
        UpsertConceptInput {
            formula: Some("SUM(5,6,7)".to_string()),
            ..concept(20, "Total inflows", SignClass::Inflow)
        },
        UpsertConceptInput {
            formula: Some("SUM(10,11,12,13)".to_string()),
            ..concept(21, "Total outflows", SignClass::Outflow)
        },
        UpsertConceptInput {
            formula: Some("SUM(20,21)".to_string()),
            ..concept(30, "Net movement", SignClass::Neutral)
        },
        UpsertConceptInput {
            role: ConceptRole::GmfTax,
            ..concept(49, "GMF 4x1000", SignClass::Outflow)
        },
        UpsertConceptInput {
            depends_on: Some(ConceptId::new(99)),
            dependency_kind: Some(DependencyKind::Copy),
            ..concept(95, "Available balance", SignClass::Neutral)
        },
        UpsertConceptInput {
            role: ConceptRole::ClosingBalance,
            formula: Some("SUM(1,30,49)".to_string()),
            ..concept(99, "Closing balance", SignClass::Neutral)
        },
    ];

    match ConceptRepository::new(db.clone()).upsert_concepts(catalog).await {
        Ok(count) => println!("  Upserted {count} concepts"),
        Err(e) => eprintln!("Failed to seed concepts: {e}"),
    }
}

/// Seeds the 2026 Colombian holiday calendar.
///
/// Emiliani-law holidays are already shifted to their observed Mondays.
async fn seed_holidays(db: &DatabaseConnection) {
    let holidays = [
        ((2026, 1, 1), "Año Nuevo"),
        ((2026, 1, 12), "Día de los Reyes Magos"),
        ((2026, 3, 23), "Día de San José"),
        ((2026, 4, 2), "Jueves Santo"),
        ((2026, 4, 3), "Viernes Santo"),
        ((2026, 5, 1), "Día del Trabajo"),
        ((2026, 5, 18), "Ascensión del Señor"),
        ((2026, 6, 8), "Corpus Christi"),
        ((2026, 6, 15), "Sagrado Corazón"),
        ((2026, 6, 29), "San Pedro y San Pablo"),
        ((2026, 7, 20), "Día de la Independencia"),
        ((2026, 8, 7), "Batalla de Boyacá"),
        ((2026, 8, 17), "Asunción de la Virgen"),
        ((2026, 10, 12), "Día de la Raza"),
        ((2026, 11, 2), "Todos los Santos"),
        ((2026, 11, 16), "Independencia de Cartagena"),
        ((2026, 12, 8), "Inmaculada Concepción"),
        ((2026, 12, 25), "Navidad"),
    ];

    let repo = HolidayRepository::new(db.clone());
    let mut added = 0;
    for ((year, month, day), name) in holidays {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        match repo.add(date, name).await {
            Ok(_) => added += 1,
            Err(e) => eprintln!("Failed to insert holiday {name}: {e}"),
        }
    }

    println!("  Seeded {added} holidays");
}

/// Seeds one GMF configuration per account.
///
/// The operating account withholds over every outflow; the payroll
/// account only over payroll transfers.
async fn seed_gmf_configs(db: &DatabaseConnection) {
    let configs = [
        (operating_account_id(), vec![10, 11, 12, 13]),
        (payroll_account_id(), vec![11]),
    ];

    let repo = GmfConfigRepository::new(db.clone());
    for (account_id, bases) in configs {
        let input = CreateGmfConfigInput {
            account_id: AccountId::from_uuid(account_id),
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            base_concepts: bases.into_iter().map(ConceptId::new).collect(),
            created_by: Some(demo_user_id()),
        };

        if let Err(e) = repo.create(input).await {
            // Ignore duplicate key errors (config already exists)
            if !e.to_string().contains("duplicate key") {
                eprintln!("Failed to insert GMF config: {e}");
            }
        }
    }

    println!("  Seeded GMF configurations");
}

/// Records a worked business day of manual entries through the recompute
/// service, so the derived rows (subtotals, GMF, balances, the carried
/// opening on the next business day) are materialized too.
async fn seed_demo_day(db: &DatabaseConnection) {
    // Friday 2026-03-06; the closing carries to Monday 2026-03-09
    let date = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
    let user = demo_user_id();
    let service = RecomputeService::new(db.clone());

    let entries: [(Uuid, i32, i64, &str); 6] = [
        (
            operating_account_id(),
            5,
            185_000_000,
            "Daily collections batch",
        ),
        (operating_account_id(), 7, 1_250_000, "Overnight interest"),
        (
            operating_account_id(),
            10,
            96_500_000,
            "Supplier invoice run",
        ),
        (operating_account_id(), 12, 14_300_000, "DIAN tax payment"),
        (operating_account_id(), 13, 420_000, "Monthly account fees"),
        (payroll_account_id(), 11, 78_000_000, "Biweekly payroll"),
    ];

    let mut derived = 0;
    for (account_id, concept_id, amount, description) in entries {
        let input = RecordEntryInput {
            date,
            concept_id: ConceptId::new(concept_id),
            account_id: AccountId::from_uuid(account_id),
            amount: Decimal::from(amount),
            description: description.to_string(),
            recorded_by: user,
        };

        match service.record_and_recompute(input).await {
            Ok(outcome) => derived += outcome.changes.len(),
            Err(e) => eprintln!("Failed to record entry for concept {concept_id}: {e}"),
        }
    }

    println!("  Recorded {} entries ({derived} derived values computed)", entries.len());
}
