//! Concept catalog repository with a read-through cache.
//!
//! The catalog changes only through administration, so every recompute
//! would otherwise re-read and re-parse the same concept rows. Reads go
//! through a small Moka cache; concept writes invalidate it.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tesoro_core::catalog::{
    Area, ConceptCatalog, ConceptDefinition, ConceptRole, DependencyKind, SignClass,
};
use tesoro_shared::types::ConceptId;

use crate::entities::concepts;

/// Cache key for the single catalog entry.
const CATALOG_KEY: &str = "concept_catalog";

/// Default cache capacity (the catalog is a single entry).
const DEFAULT_CACHE_CAPACITY: u64 = 1;

/// Default time-to-live for the cached catalog (60 seconds).
const DEFAULT_TTL_SECS: u64 = 60;

/// Cache for the parsed concept catalog.
///
/// Thread-safe and cheap to clone; clones share the underlying cache, so
/// an invalidation from one handle is seen by all of them.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<String, Arc<ConceptCatalog>>,
}

impl CatalogCache {
    /// Creates a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the cached catalog, if still fresh.
    #[must_use]
    pub fn get(&self) -> Option<Arc<ConceptCatalog>> {
        self.cache.get(CATALOG_KEY)
    }

    /// Stores a freshly parsed catalog.
    pub fn store(&self, catalog: Arc<ConceptCatalog>) {
        self.cache.insert(CATALOG_KEY.to_string(), catalog);
    }

    /// Drops the cached catalog so the next read reloads it.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Input for creating or updating a concept definition.
#[derive(Debug, Clone)]
pub struct UpsertConceptInput {
    /// Stable integer identifier, administered rather than generated.
    pub id: ConceptId,
    /// Human-readable name shown on the sheet.
    pub name: String,
    /// Sign normalization class.
    pub sign_class: SignClass,
    /// Display area.
    pub area: Area,
    /// Semantic role.
    pub role: ConceptRole,
    /// Single parent concept, when the dependency fits one column.
    pub depends_on: Option<ConceptId>,
    /// Kind for the single-parent dependency.
    pub dependency_kind: Option<DependencyKind>,
    /// Multi-concept formula, e.g. `SUM(5,6,7)`.
    pub formula: Option<String>,
    /// Ordering of the row on the sheet.
    pub display_order: i32,
}

/// Repository for concept definitions and the parsed catalog.
#[derive(Clone)]
pub struct ConceptRepository {
    db: DatabaseConnection,
    cache: CatalogCache,
}

impl ConceptRepository {
    /// Creates a new concept repository with a default cache.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: CatalogCache::new(),
        }
    }

    /// Creates a repository sharing an existing cache.
    #[must_use]
    pub fn with_cache(db: DatabaseConnection, cache: CatalogCache) -> Self {
        Self { db, cache }
    }

    /// Returns the parsed catalog, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn catalog(&self) -> Result<Arc<ConceptCatalog>, DbErr> {
        if let Some(catalog) = self.cache.get() {
            return Ok(catalog);
        }

        let catalog = Arc::new(Self::load_catalog(&self.db).await?);
        self.cache.store(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Loads and parses the active concepts, bypassing the cache.
    async fn load_catalog<C: ConnectionTrait>(conn: &C) -> Result<ConceptCatalog, DbErr> {
        let rows = concepts::Entity::find()
            .filter(concepts::Column::IsActive.eq(true))
            .order_by_asc(concepts::Column::DisplayOrder)
            .all(conn)
            .await?;

        Ok(ConceptCatalog::load(
            rows.into_iter().map(definition).collect(),
        ))
    }

    /// Creates or updates concept definitions in one transaction, then
    /// invalidates the cached catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if any database operation fails; no definitions
    /// are applied in that case.
    pub async fn upsert_concepts(&self, inputs: Vec<UpsertConceptInput>) -> Result<usize, DbErr> {
        let count = inputs.len();

        let txn = self.db.begin().await?;
        for input in inputs {
            Self::upsert_one(&txn, input).await?;
        }
        txn.commit().await?;

        self.cache.invalidate();
        Ok(count)
    }

    /// Soft-deletes a concept. Its historical ledger entries remain.
    ///
    /// # Errors
    ///
    /// Returns [`DbErr::RecordNotFound`] if the concept does not exist, or
    /// any other error if the update fails.
    pub async fn deactivate(&self, id: ConceptId) -> Result<(), DbErr> {
        let concept = concepts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("concept {id}")))?;

        let mut concept: concepts::ActiveModel = concept.into();
        concept.is_active = Set(false);
        concept.updated_at = Set(chrono::Utc::now().into());
        concept.update(&self.db).await?;

        self.cache.invalidate();
        Ok(())
    }

    async fn upsert_one(txn: &DatabaseTransaction, input: UpsertConceptInput) -> Result<(), DbErr> {
        let now = chrono::Utc::now();

        if let Some(existing) = concepts::Entity::find_by_id(input.id.into_inner())
            .one(txn)
            .await?
        {
            let mut concept: concepts::ActiveModel = existing.into();
            concept.name = Set(input.name);
            concept.sign_class = Set(input.sign_class.into());
            concept.area = Set(input.area.into());
            concept.role = Set(input.role.into());
            concept.depends_on_concept_id = Set(input.depends_on.map(ConceptId::into_inner));
            concept.dependency_kind = Set(input.dependency_kind.map(Into::into));
            concept.dependency_formula = Set(input.formula);
            concept.display_order = Set(input.display_order);
            concept.is_active = Set(true);
            concept.updated_at = Set(now.into());
            concept.update(txn).await?;
        } else {
            let concept = concepts::ActiveModel {
                id: Set(input.id.into_inner()),
                name: Set(input.name),
                sign_class: Set(input.sign_class.into()),
                area: Set(input.area.into()),
                role: Set(input.role.into()),
                depends_on_concept_id: Set(input.depends_on.map(ConceptId::into_inner)),
                dependency_kind: Set(input.dependency_kind.map(Into::into)),
                dependency_formula: Set(input.formula),
                display_order: Set(input.display_order),
                is_active: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            concept.insert(txn).await?;
        }

        Ok(())
    }
}

/// Maps a stored concept row to its storage-form definition.
fn definition(model: concepts::Model) -> ConceptDefinition {
    ConceptDefinition {
        id: ConceptId::new(model.id),
        name: model.name,
        sign_class: model.sign_class.into(),
        area: model.area.into(),
        role: model.role.into(),
        depends_on: model.depends_on_concept_id.map(ConceptId::new),
        dependency_kind: model.dependency_kind.map(Into::into),
        formula: model.dependency_formula,
        display_order: model.display_order,
    }
}
