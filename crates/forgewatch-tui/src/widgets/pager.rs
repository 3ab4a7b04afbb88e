//! Page-number strip under the machine table.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use forgewatch_core::PageItem;

use crate::theme;

/// `‹ 1 … 3 4 [5] 6 7 … 10 ›`, with the arrows dimmed when unavailable.
pub fn pager_line(items: &[PageItem], current: u32, has_prev: bool, has_next: bool) -> Line<'static> {
    let arrow = |on: bool| {
        if on {
            theme::key_hint_key()
        } else {
            theme::key_hint()
        }
    };

    let mut spans = vec![Span::styled("\u{2039} ", arrow(has_prev))];
    for item in items {
        let span = match item {
            PageItem::Page(n) if *n == current => Span::styled(
                format!("[{n}]"),
                Style::default()
                    .fg(theme::AMBER)
                    .add_modifier(Modifier::BOLD),
            ),
            PageItem::Page(n) => Span::styled(n.to_string(), theme::table_row()),
            PageItem::Ellipsis => Span::styled("\u{2026}", theme::key_hint()),
        };
        spans.push(span);
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("\u{203A}", arrow(has_next)));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use forgewatch_core::page_window;

    use super::*;

    #[test]
    fn marks_current_page_and_gaps() {
        let line = pager_line(&page_window(5, 10), 5, true, true);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "\u{2039} 1 \u{2026} 3 4 [5] 6 7 \u{2026} 10 \u{203A}");
    }
}
