//! Limit/offset handling shared by the list endpoints.

use crate::params::{first, QueryMap};

pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_OFFSET: usize = 0;
pub const MAX_LIMIT: usize = 500;

/// Read `limit` and `offset` from the query. Missing or unparseable values fall
/// back to the defaults; `limit` is clamped to `[0, max_limit]`, `offset` to `>= 0`.
pub fn parse(query: &QueryMap, default_limit: usize, default_offset: usize, max_limit: usize) -> (usize, usize) {
    let limit = read_signed(query, "limit").map(clamp_non_negative).unwrap_or(default_limit).min(max_limit);
    let offset = read_signed(query, "offset").map(clamp_non_negative).unwrap_or(default_offset);
    (limit, offset)
}

/// [`parse`] with the service-wide bounds.
pub fn parse_default(query: &QueryMap) -> (usize, usize) {
    parse(query, DEFAULT_LIMIT, DEFAULT_OFFSET, MAX_LIMIT)
}

/// Window `[start, end)` of `limit` items starting at `offset` within a sequence
/// of `length` items. Always satisfies `start <= end <= length`.
pub fn index(limit: usize, offset: usize, length: usize) -> (usize, usize) {
    if offset > length {
        return (length, length);
    }
    (offset, offset.saturating_add(limit).min(length))
}

fn read_signed(query: &QueryMap, name: &str) -> Option<i64> {
    let raw = first(query, name)?.trim();
    if raw.is_empty() { return None; }
    raw.parse::<i64>().ok()
}

fn clamp_non_negative(v: i64) -> usize {
    if v < 0 { 0 } else { usize::try_from(v).unwrap_or(usize::MAX) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::query_from_pairs;

    #[test]
    fn defaults_when_absent() {
        assert_eq!(parse_default(&QueryMap::new()), (100, 0));
    }

    #[test]
    fn clamps_limit_and_offset() {
        let q = query_from_pairs(vec![("limit", "9000"), ("offset", "-3")]);
        assert_eq!(parse_default(&q), (500, 0));
        let q = query_from_pairs(vec![("limit", "-1"), ("offset", "7")]);
        assert_eq!(parse_default(&q), (0, 7));
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let q = query_from_pairs(vec![("limit", "ten"), ("offset", "")]);
        assert_eq!(parse_default(&q), (100, 0));
    }

    #[test]
    fn index_windows() {
        assert_eq!(index(10, 0, 3), (0, 3));
        assert_eq!(index(2, 1, 5), (1, 3));
        assert_eq!(index(10, 5, 10), (5, 10));
        assert_eq!(index(10, 12, 10), (10, 10));
        assert_eq!(index(0, 0, 4), (0, 0));
        assert_eq!(index(usize::MAX, 1, 4), (1, 4));
    }
}
