// fixed-size pages over an ordered result set

pub const QUESTIONS_PER_PAGE: usize = 10;

/// Returns page `page` (1-based) of `items`.
///
/// Pages below 1 or past the end are empty rather than an error.
pub fn paginate<T>(page: i64, items: &[T]) -> &[T] {
    let Some(index) = page.checked_sub(1).and_then(|i| usize::try_from(i).ok()) else {
        return &[];
    };

    let start = index.saturating_mul(QUESTIONS_PER_PAGE);
    if start >= items.len() {
        return &[];
    }

    let end = (start + QUESTIONS_PER_PAGE).min(items.len());
    &items[start..end]
}

// the page query parameter falls back to 1 when missing or not a number
pub fn page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse().ok()).unwrap_or(1)
}
