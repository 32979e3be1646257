use crate::auth::OwnerContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use filevault_core::constants::DEFAULT_SEARCH_LIMIT;
use filevault_core::{AppError, SearchParams};
use serde::Deserialize;
use std::sync::Arc;

/// Raw query string values; parsed by hand so malformed input gets our error body.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub date: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn parse_count(field: &str, raw: Option<&str>, default: i64) -> Result<i64, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s.parse::<i64>().map_err(|_| {
            AppError::InvalidInput(format!("{} must be a non-negative integer", field))
        }),
    }
}

impl SearchQuery {
    pub fn into_params(self) -> Result<SearchParams, AppError> {
        let date = SearchParams::parse_date(self.date.as_deref())?;
        let limit = parse_count("limit", self.limit.as_deref(), DEFAULT_SEARCH_LIMIT)?;
        let offset = parse_count("offset", self.offset.as_deref(), 0)?;
        SearchParams::new(self.name, date, limit, offset)
    }
}

/// Search the caller's files by name substring and upload day.
///
/// The body is the cached JSON payload as stored, so repeated identical
/// searches return byte-identical responses.
pub async fn search_files(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = query.into_params()?;
    let payload = state.catalog.search(owner.owner_id, &params).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload))
}
