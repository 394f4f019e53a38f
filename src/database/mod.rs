pub mod manager;
pub mod models;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, Postgres};

use crate::filter::SqlParam;

/// Bind a rendered filter parameter onto a query, preserving its SQL type.
pub fn bind_param_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match p {
        SqlParam::Text(s) => q.bind(s.clone()),
        SqlParam::Uuid(u) => q.bind(*u),
    }
}
