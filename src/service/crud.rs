//! Generic CRUD execution against PostgreSQL for any `Record` type.

use crate::error::AppError;
use crate::sql::{self, BindValue, Filter, Patch, QueryBuf, Table};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A row type stored in one table.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: Table;
}

pub struct Repository;

impl Repository {
    /// All rows matching the filter, in the given order.
    pub async fn find<T: Record>(
        pool: &PgPool,
        filter: &Filter,
        order_by: Option<&str>,
    ) -> Result<Vec<T>, AppError> {
        let q = sql::select(&T::TABLE, filter, order_by, None);
        Self::fetch_all(pool, &q).await
    }

    /// First row matching the filter.
    pub async fn find_one<T: Record>(pool: &PgPool, filter: &Filter) -> Result<Option<T>, AppError> {
        let q = sql::select(&T::TABLE, filter, None, Some(1));
        Self::fetch_optional(pool, &q).await
    }

    /// Rows whose primary key is in `ids`. Used to populate references in one round trip.
    pub async fn find_by_ids<T: Record>(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<T>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::new().any_of(T::TABLE.primary_key, ids.to_vec());
        Self::find(pool, &filter, None).await
    }

    /// Insert one row; returns the created row with database defaults filled in.
    pub async fn create<T: Record>(
        pool: &PgPool,
        values: &[(&'static str, BindValue)],
    ) -> Result<T, AppError> {
        let q = sql::insert(&T::TABLE, values);
        Self::fetch_optional(pool, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Apply the patch to the first row matching the filter. Returns the updated row,
    /// or None when nothing matched.
    pub async fn find_one_and_update<T: Record>(
        pool: &PgPool,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Option<T>, AppError> {
        let q = sql::update_one(&T::TABLE, filter, patch);
        Self::fetch_optional(pool, &q).await
    }

    async fn fetch_all<T: Record>(pool: &PgPool, q: &QueryBuf) -> Result<Vec<T>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_all(pool).await?)
    }

    async fn fetch_optional<T: Record>(pool: &PgPool, q: &QueryBuf) -> Result<Option<T>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_optional(pool).await?)
    }
}
