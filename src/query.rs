//! # List Queries
//!
//! Shared pagination, sorting, and filtering types used by every list
//! operation. Pagination is either page-based (1-indexed) or offset-based;
//! both reduce to an `(offset, limit)` window. Filters are entity-specific
//! structs carried as the `filter` field of [`ListQuery`].

use serde::{Deserialize, Serialize};

/////////////////////////////////////////////// Pagination /////////////////////////////////////////////

/// A pagination window.
///
/// Page numbers are 1-indexed; page 0 is treated as page 1. A limit of 0
/// yields an empty window (callers still receive the total count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pagination {
    /// 1-indexed page of `limit` rows.
    Page {
        /// The page number, starting at 1.
        page: u64,
        /// Rows per page.
        limit: u64,
    },
    /// Raw row offset and limit.
    Offset {
        /// Rows to skip.
        offset: u64,
        /// Rows to return.
        limit: u64,
    },
}

impl Pagination {
    /// Returns the number of rows to skip.
    pub fn offset(&self) -> u64 {
        match self {
            Pagination::Page { page, limit } => page.saturating_sub(1) * limit,
            Pagination::Offset { offset, .. } => *offset,
        }
    }

    /// Returns the number of rows to return.
    pub fn limit(&self) -> u64 {
        match self {
            Pagination::Page { limit, .. } => *limit,
            Pagination::Offset { limit, .. } => *limit,
        }
    }
}

/////////////////////////////////////////////// Sorting ////////////////////////////////////////////////

/// A sort directive: column name plus direction.
///
/// Column names are matched against an entity-specific whitelist at the
/// backend; unknown columns fall back to the entity's default ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// The column to sort by.
    pub column: String,
    /// Ascending when true, descending when false.
    pub ascending: bool,
}

impl SortSpec {
    /// Creates an ascending sort on `column`.
    pub fn ascending(column: &str) -> Self {
        SortSpec {
            column: column.to_string(),
            ascending: true,
        }
    }

    /// Creates a descending sort on `column`.
    pub fn descending(column: &str) -> Self {
        SortSpec {
            column: column.to_string(),
            ascending: false,
        }
    }
}

/////////////////////////////////////////////// ListQuery //////////////////////////////////////////////

/// A complete list request: optional pagination and sort plus an
/// entity-specific filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery<F> {
    /// The pagination window; absent means all rows.
    pub pagination: Option<Pagination>,
    /// The sort directive; absent means the entity's default ordering.
    pub sort: Option<SortSpec>,
    /// Entity-specific equality/range constraints.
    pub filter: F,
}

impl<F: Default> ListQuery<F> {
    /// Creates a query with no pagination, default ordering, and an empty
    /// filter.
    pub fn all() -> Self {
        ListQuery {
            pagination: None,
            sort: None,
            filter: F::default(),
        }
    }

    /// Creates a query with the given filter and no pagination.
    pub fn filtered(filter: F) -> Self {
        ListQuery {
            pagination: None,
            sort: None,
            filter,
        }
    }
}

/////////////////////////////////////////////// Listing ////////////////////////////////////////////////

/// A page of rows plus the total number of matching rows when the backend
/// knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    /// The rows in this window.
    pub rows: Vec<T>,
    /// Total matching rows, when known.
    pub total: Option<u64>,
}

impl<T> Listing<T> {
    /// Creates a listing with a known total.
    pub fn with_total(rows: Vec<T>, total: u64) -> Self {
        Listing {
            rows,
            total: Some(total),
        }
    }

    /// Returns the best-available count: the total when known, else the
    /// number of returned rows.
    pub fn count(&self) -> u64 {
        self.total.unwrap_or(self.rows.len() as u64)
    }
}
