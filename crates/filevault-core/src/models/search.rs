use chrono::NaiveDate;
use serde::Serialize;

use crate::constants::DEFAULT_SEARCH_LIMIT;
use crate::error::AppError;

/// Normalized search filters.
///
/// An empty name is treated as no name filter; `limit == 0` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            name: None,
            date: None,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        }
    }
}

impl SearchParams {
    pub fn new(
        name: Option<String>,
        date: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Self, AppError> {
        if limit < 0 {
            return Err(AppError::InvalidInput(
                "limit must be a non-negative integer".to_string(),
            ));
        }
        if offset < 0 {
            return Err(AppError::InvalidInput(
                "offset must be a non-negative integer".to_string(),
            ));
        }
        Ok(Self {
            name: name.filter(|n| !n.is_empty()),
            date,
            limit,
            offset,
        })
    }

    /// Parses an optional `YYYY-MM-DD` date filter; blank input means no filter.
    pub fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| AppError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", s))),
        }
    }
}
