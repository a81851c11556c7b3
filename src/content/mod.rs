//! Ordered, soft-visible site content (pastors, events, ministries, communities,
//! family programs).
//!
//! Every entity shares the same shape of operations: a public list of active rows
//! sorted by `order`, an admin list of all rows, and admin CRUD. `ContentEntity`
//! describes one table; `ContentRepository<T>` is the storage contract, implemented
//! once generically by each backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sqlx::{FromRow, Postgres, QueryBuilder, postgres::PgRow};
use std::sync::Arc;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::AppError;

pub mod entities;

pub use entities::{
    Community, CommunityInput, CommunityPatch, Event, EventInput, EventPatch, FamilyProgram,
    FamilyProgramInput, FamilyProgramPatch, MinistryTeam, MinistryTeamInput, MinistryTeamPatch,
    Pastor, PastorInput, PastorPatch,
};

/// ContentEntity
///
/// Table metadata plus the pieces of per-entity logic the generic repositories need:
/// validation, SQL binding for inserts/partial updates, and the in-memory equivalents.
pub trait ContentEntity:
    Serialize + for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    /// Creation payload (`POST /api/admin/{slug}`).
    type Create: DeserializeOwned + Send + Sync + 'static;
    /// Partial update payload (`PUT /api/admin/{slug}/{id}`); `None` keeps the stored value.
    type Update: DeserializeOwned + Send + Sync + 'static;

    const TABLE: &'static str;
    /// Select/returning column list. `sort_order` is mapped onto the `order` field.
    const COLUMNS: &'static str;
    /// URL segment under `/api` and `/api/admin`.
    const SLUG: &'static str;
    /// Human-readable name used in error messages.
    const LABEL: &'static str;

    fn id(&self) -> i64;
    fn order(&self) -> i32;
    fn is_active(&self) -> bool;

    /// Value that must be unique across the table, if any.
    fn unique_key(&self) -> Option<&str> {
        None
    }

    /// Rejects a creation payload before anything is stored.
    fn validate(req: &Self::Create) -> Result<(), AppError>;

    /// Record-level rules that must still hold after a partial update is merged in.
    fn check(&self) -> Result<(), AppError>;

    /// Builds a fresh record for backends that do not generate rows themselves.
    fn build(id: i64, req: Self::Create, now: DateTime<Utc>) -> Self;

    fn apply(&mut self, req: Self::Update, now: DateTime<Utc>);

    fn set_order(&mut self, order: i32, now: DateTime<Utc>);

    /// Pushes `(columns) VALUES (binds)` for an `INSERT INTO <table> `.
    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, req: Self::Create);

    /// Pushes `column = COALESCE($n, column), ` assignments for every updatable column.
    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, req: Self::Update);

    /// Picks this entity's repository out of the shared stores.
    fn store(stores: &ContentStores) -> &ContentState<Self>;
}

/// OrderEntry
///
/// One element of a bulk reorder request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OrderEntry {
    pub id: i64,
    pub order: i32,
}

/// ContentRepository
///
/// Storage contract for one ordered content entity.
#[async_trait]
pub trait ContentRepository<T: ContentEntity>: Send + Sync {
    /// Rows sorted by `order` ascending, ties broken by id.
    async fn list(&self, active_only: bool) -> Result<Vec<T>, AppError>;
    async fn get(&self, id: i64, active_only: bool) -> Result<Option<T>, AppError>;
    async fn create(&self, req: T::Create) -> Result<T, AppError>;
    async fn update(&self, id: i64, req: T::Update) -> Result<Option<T>, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
    /// Applies all entries or none; an unknown id fails the whole batch with NotFound.
    async fn reorder(&self, entries: Vec<OrderEntry>) -> Result<Vec<T>, AppError>;
}

pub type ContentState<T> = Arc<dyn ContentRepository<T>>;

/// ContentStores
///
/// One repository handle per content entity, shared through `AppState`.
#[derive(Clone)]
pub struct ContentStores {
    pub pastors: ContentState<Pastor>,
    pub events: ContentState<Event>,
    pub ministries: ContentState<MinistryTeam>,
    pub communities: ContentState<Community>,
    pub family_programs: ContentState<FamilyProgram>,
}

impl ContentStores {
    /// Shares one backend that stores every entity (Postgres or in-memory).
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ContentRepository<Pastor>
            + ContentRepository<Event>
            + ContentRepository<MinistryTeam>
            + ContentRepository<Community>
            + ContentRepository<FamilyProgram>
            + 'static,
    {
        Self {
            pastors: Arc::clone(&backend) as ContentState<Pastor>,
            events: Arc::clone(&backend) as ContentState<Event>,
            ministries: Arc::clone(&backend) as ContentState<MinistryTeam>,
            communities: Arc::clone(&backend) as ContentState<Community>,
            family_programs: backend as ContentState<FamilyProgram>,
        }
    }
}

/// Sorts rows the way every listing presents them.
pub fn sort_for_display<T: ContentEntity>(rows: &mut [T]) {
    rows.sort_by_key(|row| (row.order(), row.id()));
}

/// Pushes `column = COALESCE($n, column), `.
pub(crate) fn push_coalesce<'a, V>(
    builder: &mut QueryBuilder<'a, Postgres>,
    column: &str,
    value: Option<V>,
) where
    V: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
{
    builder.push(column);
    builder.push(" = COALESCE(");
    builder.push_bind(value);
    builder.push(format!(", {column}), "));
}

/// Rejects blank required text fields.
pub(crate) fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid(format!("{field}을(를) 입력해주세요.")));
    }
    Ok(())
}

pub(crate) fn default_active() -> bool {
    true
}
