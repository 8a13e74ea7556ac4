//! Cursor pagination helpers emulating CQL's `token(id) > token(last_id)`
//! paging over a time-ordered UUID primary key (spec §12).

use uuid::Uuid;

/// A page of results plus an opaque cursor for the next page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Uuid>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<Uuid>) -> Self {
        Self { items, next_cursor }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}

/// Clamps a requested page size into `(0, max]`, substituting `default`
/// when the caller asked for zero or a negative value (spec §8: `page_size
/// <= 0` and `> 250` both clamp to the ceiling).
pub fn clamp_page_size(requested: i64, default: u32, max: u32) -> u32 {
    if requested <= 0 {
        default
    } else if requested as u64 > max as u64 {
        max
    } else {
        requested as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_clamps_to_default() {
        assert_eq!(clamp_page_size(0, 250, 250), 250);
        assert_eq!(clamp_page_size(-5, 100, 100), 100);
    }

    #[test]
    fn over_ceiling_clamps_to_max() {
        assert_eq!(clamp_page_size(1000, 250, 250), 250);
        assert_eq!(clamp_page_size(500, 100, 100), 100);
    }

    #[test]
    fn in_range_passes_through() {
        assert_eq!(clamp_page_size(42, 250, 250), 42);
    }
}
