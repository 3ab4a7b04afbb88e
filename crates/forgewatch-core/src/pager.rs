// ── Pager window ──
//
// Condensed page list for the table footer: first page, last page, and
// `current ± WINDOW`. Every gap between shown pages collapses into an
// ellipsis.

use std::fmt;

/// Pages shown on each side of the current page.
pub const WINDOW: u32 = 2;

/// One pager slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "{n}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Pager slots for `current` of `total` pages (1-based).
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }

    let shown = (1..=total).filter(|&page| {
        page == 1 || page == total || (page + WINDOW >= current && page <= current + WINDOW)
    });

    let mut items = Vec::new();
    let mut last: Option<u32> = None;
    for page in shown {
        if let Some(prev) = last {
            if page - prev > 1 {
                items.push(PageItem::Ellipsis);
            }
        }
        items.push(PageItem::Page(page));
        last = Some(page);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::PageItem::{Ellipsis, Page};

    #[test]
    fn middle_of_ten() {
        assert_eq!(
            page_window(5, 10),
            vec![
                Page(1),
                Ellipsis,
                Page(3),
                Page(4),
                Page(5),
                Page(6),
                Page(7),
                Ellipsis,
                Page(10)
            ]
        );
    }

    #[test]
    fn three_pages_no_ellipsis() {
        assert_eq!(page_window(1, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_window(3, 3), vec![Page(1), Page(2), Page(3)]);
    }

    #[test]
    fn single_hidden_page_still_collapses() {
        assert_eq!(
            page_window(1, 5),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(5)]
        );
        assert_eq!(
            page_window(5, 9),
            vec![
                Page(1),
                Ellipsis,
                Page(3),
                Page(4),
                Page(5),
                Page(6),
                Page(7),
                Ellipsis,
                Page(9)
            ]
        );
    }

    #[test]
    fn wider_gap_collapses() {
        assert_eq!(
            page_window(4, 10),
            vec![
                Page(1),
                Page(2),
                Page(3),
                Page(4),
                Page(5),
                Page(6),
                Ellipsis,
                Page(10)
            ]
        );
    }

    #[test]
    fn start_and_end() {
        assert_eq!(
            page_window(1, 10),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_window(10, 10),
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn degenerate_totals() {
        assert!(page_window(1, 0).is_empty());
        assert_eq!(page_window(1, 1), vec![Page(1)]);
    }

    #[test]
    fn renders_as_text() {
        let text: Vec<String> = page_window(5, 10).iter().map(ToString::to_string).collect();
        assert_eq!(text.join(" "), "1 ... 3 4 5 6 7 ... 10");
    }
}
