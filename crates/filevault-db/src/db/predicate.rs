//! Incremental search predicate over the `files` table.
//!
//! The base condition is always the owner; every other clause is appended
//! only when its filter is present, with values bound as parameters.

use chrono::NaiveDate;
use filevault_core::SearchParams;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

pub(crate) const FILE_COLUMNS: &str =
    "id, owner_id, file_name, file_size, storage_url, storage_key, chunk_count, upload_date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    pub owner_id: Uuid,
    /// Case-insensitive substring match on the file name
    pub name_contains: Option<String>,
    /// Calendar day (UTC) of the upload
    pub upload_date: Option<NaiveDate>,
    /// `None` returns every matching row
    pub limit: Option<i64>,
    /// Only applied together with `limit`
    pub offset: i64,
}

impl SearchPredicate {
    /// All files of one owner, unpaginated.
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            name_contains: None,
            upload_date: None,
            limit: None,
            offset: 0,
        }
    }

    pub fn from_params(owner_id: Uuid, params: &SearchParams) -> Self {
        Self {
            owner_id,
            name_contains: params.name.clone().filter(|n| !n.is_empty()),
            upload_date: params.date,
            limit: (params.limit > 0).then_some(params.limit),
            offset: params.offset.max(0),
        }
    }

    pub fn build_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM files WHERE owner_id = ",
            FILE_COLUMNS
        ));
        qb.push_bind(self.owner_id);

        if let Some(name) = &self.name_contains {
            qb.push(" AND file_name ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(name)));
        }

        if let Some(date) = self.upload_date {
            qb.push(" AND (upload_date AT TIME ZONE 'UTC')::date = ");
            qb.push_bind(date);
        }

        qb.push(" ORDER BY upload_date DESC, id DESC");

        if let Some(limit) = self.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
            qb.push(" OFFSET ");
            qb.push_bind(self.offset);
        }

        qb
    }
}

/// Escape LIKE wildcards so the filter matches the name literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
