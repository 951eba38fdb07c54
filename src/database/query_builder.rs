use sqlx::{postgres::PgArguments, FromRow, PgPool, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::filter::types::{SqlParam, SqlResult, TableSpec};
use crate::filter::{Filter, FilterData};

/// Runs a compiled [`Filter`] against one table
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table: &'static TableSpec) -> Self {
        Self {
            filter: Filter::new(table),
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn max_limit(mut self, max_limit: u32) -> Self {
        self.filter = self.filter.with_max_limit(max_limit);
        self
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql = self.filter.to_sql()?;
        let rows = bind_all_as(sqlx::query_as::<_, T>(&sql.query), &sql).fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn select_optional(&self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql = self.filter.to_sql()?;
        let row = bind_all_as(sqlx::query_as::<_, T>(&sql.query), &sql)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&sql.query);
        for p in &sql.params {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

fn bind_all_as<'q, T>(
    mut q: sqlx::query::QueryAs<'q, Postgres, T, PgArguments>,
    sql: &SqlResult,
) -> sqlx::query::QueryAs<'q, Postgres, T, PgArguments> {
    for p in &sql.params {
        q = match p.clone() {
            SqlParam::Uuid(v) => q.bind(v),
            SqlParam::Text(v) => q.bind(v),
            SqlParam::Bool(v) => q.bind(v),
            SqlParam::Int(v) => q.bind(v),
            SqlParam::Numeric(v) => q.bind(v),
            SqlParam::Timestamp(v) => q.bind(v),
        };
    }
    q
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match p.clone() {
        SqlParam::Uuid(v) => q.bind(v),
        SqlParam::Text(v) => q.bind(v),
        SqlParam::Bool(v) => q.bind(v),
        SqlParam::Int(v) => q.bind(v),
        SqlParam::Numeric(v) => q.bind(v),
        SqlParam::Timestamp(v) => q.bind(v),
    }
}
