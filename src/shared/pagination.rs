//! Cursor Pagination
//!
//! Keyset pagination over `(timestamp, id)`. Repositories fetch `limit + 1`
//! rows past the cursor; [`Page::from_overfetch`] trims the extra row and
//! derives the next cursor from the last item kept.
//!
//! Cursors are opaque to clients: `<epoch-micros>_<id>`. A bare
//! `<epoch-micros>` is also accepted and behaves as a strict timestamp bound.

use chrono::{DateTime, Utc};

use super::error::AppError;
use super::response::ResponseMeta;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard upper bound on page size regardless of what the client asks for.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Ordering of a list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Newest first (feeds, comments on profiles, notifications).
    Descending,
    /// Oldest / soonest first (comment threads, upcoming events).
    Ascending,
}

/// A position in an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub at: DateTime<Utc>,
    pub id: Option<i64>,
}

impl Cursor {
    pub fn new(at: DateTime<Utc>, id: i64) -> Self {
        Self { at, id: Some(id) }
    }

    /// Serialize for `meta.cursor`.
    pub fn encode(&self) -> String {
        match self.id {
            Some(id) => format!("{}_{}", self.at.timestamp_micros(), id),
            None => self.at.timestamp_micros().to_string(),
        }
    }

    /// Parse a client-supplied cursor.
    pub fn decode(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::invalid_field("cursor", "Invalid cursor");

        let raw = raw.trim();
        let (micros, id) = match raw.split_once('_') {
            Some((micros, id)) => (micros, Some(id.parse::<i64>().map_err(|_| invalid())?)),
            None => (raw, None),
        };

        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let at = DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(invalid)?;

        Ok(Self { at, id })
    }

    /// Id half of the keyset comparison. Timestamp-only cursors exclude every
    /// row sharing the cursor timestamp.
    pub fn id_bound(&self, direction: SortDirection) -> i64 {
        self.id.unwrap_or(match direction {
            SortDirection::Descending => i64::MIN,
            SortDirection::Ascending => i64::MAX,
        })
    }
}

/// Items that can be positioned by a cursor.
pub trait Keyset {
    fn keyset(&self) -> Cursor;
}

/// Page size bounds for an endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: i64,
    pub max: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            max: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Clamp the requested size into `[1, max]`.
    pub fn clamp(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(self.default).clamp(1, self.max.max(1))
    }
}

/// Validated pagination input handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(cursor: Option<Cursor>, limit: i64) -> Self {
        Self { cursor, limit }
    }

    /// First page of the given size.
    pub fn first(limit: i64) -> Self {
        Self::new(None, limit)
    }

    /// Build from raw query values.
    pub fn parse(cursor: Option<&str>, limit: Option<i64>, limits: PageLimits) -> Result<Self, AppError> {
        let cursor = match cursor {
            Some(raw) if !raw.trim().is_empty() => Some(Cursor::decode(raw)?),
            _ => None,
        };
        Ok(Self::new(cursor, limits.clamp(limit)))
    }

    /// Rows to fetch so the presence of a further page can be detected.
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }

    pub fn cursor_at(&self) -> Option<DateTime<Utc>> {
        self.cursor.map(|c| c.at)
    }

    pub fn cursor_id(&self, direction: SortDirection) -> i64 {
        self.cursor
            .map(|c| c.id_bound(direction))
            .unwrap_or(match direction {
                SortDirection::Descending => i64::MAX,
                SortDirection::Ascending => i64::MIN,
            })
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Trim an over-fetched result (`limit + 1` rows) into a page.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64) -> Self
    where
        T: Keyset,
    {
        let limit = usize::try_from(limit).unwrap_or(0);
        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }

        let next_cursor = if has_more {
            rows.last().map(Keyset::keyset)
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }

    /// Envelope metadata: cursor only when another page exists.
    pub fn meta(&self) -> ResponseMeta {
        ResponseMeta {
            cursor: self.next_cursor.as_ref().map(Cursor::encode),
            has_more: Some(self.has_more),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        at: DateTime<Utc>,
    }

    impl Keyset for Row {
        fn keyset(&self) -> Cursor {
            Cursor::new(self.at, self.id)
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn cursor_encoding_is_reversible() {
        let cursor = Cursor::new(ts(5), 42);
        assert_eq!(Cursor::decode(&cursor.encode()).unwrap(), cursor);
    }

    #[test]
    fn timestamp_only_cursor_is_accepted() {
        let raw = ts(5).timestamp_micros().to_string();
        let cursor = Cursor::decode(&raw).unwrap();
        assert_eq!(cursor.at, ts(5));
        assert_eq!(cursor.id_bound(SortDirection::Descending), i64::MIN);
        assert_eq!(cursor.id_bound(SortDirection::Ascending), i64::MAX);
    }

    #[test_case("not-a-cursor")]
    #[test_case("123_abc")]
    #[test_case("_")]
    fn malformed_cursor_is_a_validation_error(raw: &str) {
        let err = Cursor::decode(raw).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d[0].field == "cursor"));
    }

    #[test_case(None, 20)]
    #[test_case(Some(10), 10)]
    #[test_case(Some(500), 50)]
    #[test_case(Some(0), 1)]
    #[test_case(Some(-3), 1)]
    fn limit_is_clamped(requested: Option<i64>, expected: i64) {
        assert_eq!(PageLimits::default().clamp(requested), expected);
    }

    #[test]
    fn overfetch_sets_cursor_from_last_kept_row() {
        let rows = vec![
            Row { id: 3, at: ts(3) },
            Row { id: 2, at: ts(2) },
            Row { id: 1, at: ts(1) },
        ];
        let page = Page::from_overfetch(rows, 2);

        assert!(page.has_more);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor, Some(Cursor::new(ts(2), 2)));
    }

    #[test]
    fn exact_fit_reports_no_more() {
        let rows = vec![Row { id: 2, at: ts(2) }, Row { id: 1, at: ts(1) }];
        let page = Page::from_overfetch(rows, 2);

        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
        let meta = page.meta();
        assert_eq!(meta.has_more, Some(false));
        assert_eq!(meta.cursor, None);
    }
}
