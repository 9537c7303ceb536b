//! Initial database migration.
//!
//! Creates the enums, tables, and indexes for companies, accounts, the
//! concept catalog, ledger entries, GMF configurations, and holidays.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES & ACCOUNTS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: CONCEPT CATALOG
        // ============================================================
        db.execute_unprepared(CONCEPTS_SQL).await?;

        // ============================================================
        // PART 4: LEDGER ENTRIES
        // ============================================================
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        // ============================================================
        // PART 5: GMF CONFIGURATION
        // ============================================================
        db.execute_unprepared(GMF_CONFIGS_SQL).await?;
        db.execute_unprepared(GMF_CONFIG_CONCEPTS_SQL).await?;

        // ============================================================
        // PART 6: HOLIDAYS
        // ============================================================
        db.execute_unprepared(HOLIDAYS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Sign class: governs how stored amounts are normalized
CREATE TYPE sign_class AS ENUM ('inflow', 'outflow', 'neutral');

-- Display area of a concept and its entries
CREATE TYPE display_area AS ENUM ('treasury', 'payroll', 'both');

-- Semantic role of a concept within the daily sheet
CREATE TYPE concept_role AS ENUM (
    'none',
    'opening_balance',
    'closing_balance',
    'gmf_tax'
);

-- Kind of a single-parent dependency
CREATE TYPE dependency_kind AS ENUM ('copy', 'sum', 'subtract');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    tax_id VARCHAR(50),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_companies_active ON companies(id) WHERE is_active = true;
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    bank_name VARCHAR(255),
    account_number VARCHAR(50),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (company_id, name)
);

CREATE INDEX idx_accounts_company ON accounts(company_id) WHERE is_active = true;
";

const CONCEPTS_SQL: &str = r"
CREATE TABLE concepts (
    id INT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    sign_class sign_class NOT NULL DEFAULT 'neutral',
    area display_area NOT NULL DEFAULT 'both',
    role concept_role NOT NULL DEFAULT 'none',
    depends_on_concept_id INT REFERENCES concepts(id),
    dependency_kind dependency_kind,
    dependency_formula VARCHAR(500),
    display_order INT NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_dependency_pair CHECK (
        (depends_on_concept_id IS NULL) = (dependency_kind IS NULL)
    )
);

CREATE INDEX idx_concepts_order ON concepts(area, display_order) WHERE is_active = true;
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_date DATE NOT NULL,
    concept_id INT NOT NULL REFERENCES concepts(id),
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    area display_area NOT NULL,
    amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    audit JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (entry_date, concept_id, account_id, area)
);

CREATE INDEX idx_ledger_entries_account_date ON ledger_entries(account_id, entry_date);
CREATE INDEX idx_ledger_entries_company_date ON ledger_entries(company_id, entry_date);
CREATE INDEX idx_ledger_entries_concept ON ledger_entries(concept_id, entry_date);
";

const GMF_CONFIGS_SQL: &str = r"
CREATE TABLE gmf_configs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    effective_from DATE NOT NULL,
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (account_id, effective_from)
);

CREATE INDEX idx_gmf_configs_lookup ON gmf_configs(account_id, effective_from DESC);
";

const GMF_CONFIG_CONCEPTS_SQL: &str = r"
CREATE TABLE gmf_config_concepts (
    gmf_config_id UUID NOT NULL REFERENCES gmf_configs(id) ON DELETE CASCADE,
    concept_id INT NOT NULL REFERENCES concepts(id),
    PRIMARY KEY (gmf_config_id, concept_id)
);

CREATE INDEX idx_gmf_config_concepts_config ON gmf_config_concepts(gmf_config_id);
";

const HOLIDAYS_SQL: &str = r"
CREATE TABLE holidays (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    holiday_date DATE NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_holidays_date ON holidays(holiday_date) WHERE is_active = true;
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS holidays CASCADE;
DROP TABLE IF EXISTS gmf_config_concepts CASCADE;
DROP TABLE IF EXISTS gmf_configs CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS concepts CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP TYPE IF EXISTS dependency_kind CASCADE;
DROP TYPE IF EXISTS concept_role CASCADE;
DROP TYPE IF EXISTS display_area CASCADE;
DROP TYPE IF EXISTS sign_class CASCADE;
";
