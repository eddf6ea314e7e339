//! Cursor pagination tests

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use test_case::test_case;

use social_server::shared::{AppError, Page, PageLimits, PageRequest, SortDirection};

use crate::common::Row;

#[test]
fn next_cursor_resumes_after_last_item() {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let rows: Vec<Row> = (0..4)
        .map(|i| Row {
            id: 100 - i,
            at: base - Duration::seconds(i),
        })
        .collect();

    let page = Page::from_overfetch(rows, 3);
    let cursor = page.meta().cursor.expect("a further page exists");

    let next = PageRequest::parse(Some(&cursor), Some(3), PageLimits::default()).unwrap();
    let resumed = next.cursor.expect("cursor should decode");
    assert_eq!(resumed.at, page.items[2].at);
    assert_eq!(resumed.id, Some(page.items[2].id));
}

/// Rows with several shared timestamps, in no particular order.
fn tied_rows() -> Vec<Row> {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    [(7, 0), (3, 0), (9, 1), (1, 1), (4, 1), (8, 2), (2, 3), (6, 3), (5, 3), (10, 4)]
        .into_iter()
        .map(|(id, secs)| Row {
            id,
            at: base + Duration::seconds(secs),
        })
        .collect()
}

/// The keyset query the repositories run: rows strictly past `(cursor_at,
/// cursor_id)` in the listing order, `limit + 1` of them.
fn fetch(rows: &[Row], request: &PageRequest, direction: SortDirection) -> Vec<Row> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|r| (r.at, r.id));
    if direction == SortDirection::Descending {
        sorted.reverse();
    }

    let bound = request
        .cursor_at()
        .map(|at| (at, request.cursor_id(direction)));
    sorted
        .into_iter()
        .filter(|r| match (bound, direction) {
            (None, _) => true,
            (Some(b), SortDirection::Descending) => (r.at, r.id) < b,
            (Some(b), SortDirection::Ascending) => (r.at, r.id) > b,
        })
        .take(request.fetch_limit() as usize)
        .collect()
}

#[test_case(SortDirection::Descending, 3)]
#[test_case(SortDirection::Descending, 4)]
#[test_case(SortDirection::Ascending, 3)]
#[test_case(SortDirection::Ascending, 1)]
fn following_cursors_visits_every_row_once_in_order(direction: SortDirection, page_size: i64) {
    let rows = tied_rows();
    let mut expected = rows.clone();
    expected.sort_by_key(|r| (r.at, r.id));
    if direction == SortDirection::Descending {
        expected.reverse();
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let request =
            PageRequest::parse(cursor.as_deref(), Some(page_size), PageLimits::default()).unwrap();
        let page = Page::from_overfetch(fetch(&rows, &request, direction), request.limit);
        let meta = page.meta();
        pages += 1;

        assert!(page.items.len() as i64 <= page_size);
        seen.extend(page.items);

        if meta.has_more != Some(true) {
            assert_eq!(meta.cursor, None);
            break;
        }
        cursor = Some(meta.cursor.expect("has_more pages carry a cursor"));
        assert!(pages <= rows.len(), "pagination did not terminate");
    }

    assert_eq!(seen, expected);
}

#[test]
fn timestamp_only_cursor_skips_rows_sharing_that_timestamp() {
    let rows = tied_rows();
    let tied_at = rows[2].at;
    let raw = tied_at.timestamp_micros().to_string();

    let request = PageRequest::parse(Some(&raw), Some(50), PageLimits::default()).unwrap();
    let page = Page::from_overfetch(fetch(&rows, &request, SortDirection::Descending), request.limit);

    let ids: Vec<i64> = page.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![7, 3]);
}

#[test]
fn last_page_has_no_cursor() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let page = Page::from_overfetch(vec![Row { id: 1, at }], 3);

    assert!(!page.has_more);
    assert_eq!(page.meta().cursor, None);
}

#[test]
fn timestamp_only_cursor_is_accepted() {
    let request = PageRequest::parse(Some("1714564800000000"), None, PageLimits::default()).unwrap();

    let cursor = request.cursor.unwrap();
    assert_eq!(cursor.id, None);
    assert_eq!(cursor.at.timestamp(), 1_714_564_800);
}

#[test_case("yesterday")]
#[test_case("123_abc")]
#[test_case("_5")]
fn malformed_cursor_is_a_validation_error(raw: &str) {
    let err = PageRequest::parse(Some(raw), None, PageLimits::default()).unwrap_err();

    match err {
        AppError::Validation(details) => assert_eq!(details[0].field, "cursor"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test_case(None, 20)]
#[test_case(Some(0), 1)]
#[test_case(Some(500), 50)]
fn limit_is_clamped(requested: Option<i64>, expected: i64) {
    let request = PageRequest::parse(None, requested, PageLimits::default()).unwrap();
    assert_eq!(request.limit, expected);
}
