//! Filtered, paginated listing.
//!
//! Filters compare the wire name of a field for exact equality and are ANDed.
//! Pagination accepts the raw query-string values and never rejects them:
//! anything unparseable falls back to the defaults.

use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::ServiceRequest;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Optional equality filters. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl ListFilter {
    pub fn matches(&self, record: &ServiceRequest) -> bool {
        field_matches(self.category.as_deref(), record.category().as_ref())
            && field_matches(self.status.as_deref(), record.status().as_ref())
            && field_matches(self.priority.as_deref(), record.priority().as_ref())
    }
}

fn field_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted {
        Some(wanted) if !wanted.is_empty() => wanted == actual,
        _ => true,
    }
}

/// Effective page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: usize,
    offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Build a window, clamping `limit` to `1..=MAX_LIMIT`.
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }

    /// Interpret raw `limit` / `offset` query values.
    ///
    /// Values are read like a leading integer (`"25abc"` is 25). A missing,
    /// non-numeric or zero limit means [`DEFAULT_LIMIT`]; a negative one
    /// clamps to 1. A missing or non-numeric offset means 0; a negative one
    /// clamps to 0.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = match limit.and_then(parse_leading_int) {
            Some(0) | None => DEFAULT_LIMIT,
            Some(n) => usize::try_from(n.clamp(1, MAX_LIMIT as i64)).unwrap_or(DEFAULT_LIMIT),
        };
        let offset = offset
            .and_then(parse_leading_int)
            .map_or(0, |n| usize::try_from(n.max(0)).unwrap_or(usize::MAX));
        Self::new(limit, offset)
    }

    pub fn limit(self) -> usize {
        self.limit
    }

    pub fn offset(self) -> usize {
        self.offset
    }
}

/// Parse an optionally signed run of leading digits, ignoring what follows.
/// Saturates instead of overflowing.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }

    seen.then_some(if negative { -value } else { value })
}

/// Count metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Matching records before pagination.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    /// Whether records exist past this page.
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub metadata: PageMetadata,
}

/// Filter `records` (oldest first) and cut out one page, preserving order.
pub fn query(
    records: &[ServiceRequest],
    filter: &ListFilter,
    pagination: Pagination,
) -> Page<ServiceRequest> {
    let matching: Vec<&ServiceRequest> = records.iter().filter(|r| filter.matches(r)).collect();
    let total = matching.len();

    let data = matching
        .into_iter()
        .skip(pagination.offset)
        .take(pagination.limit)
        .cloned()
        .collect();

    Page {
        data,
        metadata: PageMetadata {
            total,
            limit: pagination.limit,
            offset: pagination.offset,
            has_more: pagination.offset.saturating_add(pagination.limit) < total,
        },
    }
}
