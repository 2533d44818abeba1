//! Screen composition: layout, scroll state, and the mapping from a
//! `PoemView` to the rows drawn on screen.
//!
//! Layout (top to bottom):
//!   title / author / date (omitted when hidden) / blank
//!   poem text             : scrollable, fills the remaining rows
//!   similar pane          : separator + entries, at most half the screen
//!   row term_rows-1       : status bar

use crate::view::PoemView;

// ---------------------------------------------------------------------------
// Layout / ViewState
// ---------------------------------------------------------------------------

pub(super) struct Layout {
    pub cols: u16,
    pub status_row: u16, // = term_rows - 1
}

impl Layout {
    /// Rows available above the status bar.
    pub(super) fn content_rows(&self) -> usize {
        self.status_row as usize
    }
}

#[derive(Default)]
pub(super) struct ViewState {
    /// First visible line of the poem text.
    pub scroll: usize,
}

pub(super) fn compute_layout(term_cols: u16, term_rows: u16) -> Layout {
    Layout {
        cols: term_cols,
        status_row: term_rows.saturating_sub(1),
    }
}

// ---------------------------------------------------------------------------
// Screen lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LineStyle {
    Title,
    Author,
    Date,
    Body,
    Separator,
    EntryTitle,
    Preview,
    Placeholder,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ScreenLine {
    pub text: String,
    pub style: LineStyle,
}

const TAB_WIDTH: usize = 4;

/// Expand tabs to the next tab stop and drop every other control character,
/// so text from the server can never reach the terminal as an escape sequence.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut col = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB_WIDTH - col % TAB_WIDTH;
                out.extend(std::iter::repeat_n(' ', pad));
                col += pad;
            }
            c if c.is_control() => {}
            c => {
                out.push(c);
                col += 1;
            }
        }
    }
    out
}

impl ScreenLine {
    fn new(text: impl AsRef<str>, style: LineStyle) -> Self {
        Self {
            text: sanitize(text.as_ref()),
            style,
        }
    }

    fn blank() -> Self {
        Self::new("", LineStyle::Blank)
    }
}

fn header_lines(view: &PoemView) -> Vec<ScreenLine> {
    let mut lines = vec![ScreenLine::new(view.title.clone(), LineStyle::Title)];
    if !view.author.is_empty() {
        lines.push(ScreenLine::new(view.author.clone(), LineStyle::Author));
    }
    if let Some(date) = &view.date {
        lines.push(ScreenLine::new(date.clone(), LineStyle::Date));
    }
    lines.push(ScreenLine::blank());
    lines
}

fn similar_lines(view: &PoemView) -> Vec<ScreenLine> {
    let mut lines = Vec::new();
    if let Some(msg) = view.similar.placeholder() {
        lines.push(ScreenLine::new("── Similar ──", LineStyle::Separator));
        lines.push(ScreenLine::new(msg, LineStyle::Placeholder));
    }
    let entries = view.similar.entries();
    if !entries.is_empty() {
        lines.push(ScreenLine::new("── Similar ──", LineStyle::Separator));
    }
    for (i, entry) in entries.iter().enumerate() {
        let heading = if entry.author.is_empty() {
            format!("[{}] {}", i + 1, entry.title)
        } else {
            format!("[{}] {} — {}", i + 1, entry.title, entry.author)
        };
        lines.push(ScreenLine::new(heading, LineStyle::EntryTitle));
        for preview in &entry.preview {
            lines.push(ScreenLine::new(format!("    {preview}"), LineStyle::Preview));
        }
    }
    lines
}

fn similar_height(view: &PoemView, layout: &Layout) -> usize {
    similar_lines(view).len().min(layout.content_rows() / 2)
}

/// Rows left for the poem text.
pub(super) fn text_area_rows(view: &PoemView, layout: &Layout) -> usize {
    layout
        .content_rows()
        .saturating_sub(header_lines(view).len())
        .saturating_sub(similar_height(view, layout))
}

pub(super) fn max_scroll(view: &PoemView, layout: &Layout) -> usize {
    view.text_lines()
        .count()
        .saturating_sub(text_area_rows(view, layout))
}

/// Compose exactly `layout.content_rows()` lines for the current frame.
pub(super) fn compose(view: &PoemView, layout: &Layout, scroll: usize) -> Vec<ScreenLine> {
    let rows = layout.content_rows();
    let text_rows = text_area_rows(view, layout);

    let mut lines = header_lines(view);
    lines.extend(
        view.text_lines()
            .skip(scroll)
            .take(text_rows)
            .map(|l| ScreenLine::new(l, LineStyle::Body)),
    );
    let similar = similar_lines(view);
    let similar_rows = similar_height(view, layout);
    let pad_to = rows.saturating_sub(similar_rows);
    while lines.len() < pad_to {
        lines.push(ScreenLine::blank());
    }
    lines.extend(similar.into_iter().take(similar_rows));
    lines.truncate(rows);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poem::Poem;
    use crate::view::{NO_SIMILAR, SimilarPane};

    fn poem(id: &str, lines: usize) -> Poem {
        Poem {
            id: id.into(),
            name: Some(format!("T{id}")),
            author: "Author".into(),
            text: (1..=lines)
                .map(|i| format!("line {i}"))
                .collect::<Vec<_>>()
                .join("\n"),
            date_from: Some(1830.0),
            date_to: Some(1831.0),
        }
    }

    fn view_with(lines: usize, similar: &[Poem]) -> PoemView {
        let mut view = PoemView::default();
        view.show_poem(&poem("1", lines));
        view.similar = SimilarPane::from_results(similar, 3, 3);
        view
    }

    #[test]
    fn compose_fills_content_rows() {
        let layout = compute_layout(80, 24);
        let view = view_with(3, &[poem("2", 5)]);
        let lines = compose(&view, &layout, 0);
        assert_eq!(lines.len(), 23);
        assert_eq!(lines[0].style, LineStyle::Title);
        assert_eq!(lines[1].text, "Author");
        assert_eq!(lines[2].text, "1830-1831");
        assert_eq!(lines[4].text, "line 1");
        // similar pane sits at the bottom: separator, heading, 3 preview lines
        assert_eq!(lines[18].style, LineStyle::Separator);
        assert_eq!(lines[19].text, "[1] T2 — Author");
        assert_eq!(lines[22].text, "    line 3");
    }

    #[test]
    fn scroll_offsets_text() {
        let layout = compute_layout(80, 12);
        let view = view_with(40, &[]);
        let lines = compose(&view, &layout, 5);
        assert_eq!(lines[4].text, "line 6");
        // 11 rows - 4 header - 2 placeholder rows
        assert_eq!(text_area_rows(&view, &layout), 5);
        assert_eq!(max_scroll(&view, &layout), 35);
        assert_eq!(lines[10].text, NO_SIMILAR);
    }

    #[test]
    fn similar_pane_capped_at_half_screen() {
        let layout = compute_layout(80, 11);
        let similar: Vec<Poem> = (2..5).map(|i| poem(&i.to_string(), 5)).collect();
        let view = view_with(2, &similar);
        let lines = compose(&view, &layout, 0);
        assert_eq!(lines.len(), 10);
        let pane = lines
            .iter()
            .filter(|l| matches!(l.style, LineStyle::Separator | LineStyle::EntryTitle | LineStyle::Preview))
            .count();
        assert_eq!(pane, 5);
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let layout = compute_layout(10, 2);
        let view = view_with(10, &[poem("2", 3)]);
        assert_eq!(compose(&view, &layout, 100).len(), 1);
        assert_eq!(text_area_rows(&view, &layout), 0);
    }

    #[test]
    fn status_view_has_title_only() {
        let layout = compute_layout(80, 6);
        let mut view = PoemView::default();
        view.show_status("Ничего не найдено");
        let lines = compose(&view, &layout, 0);
        assert_eq!(lines[0].text, "Ничего не найдено");
        assert!(lines[1..].iter().all(|l| l.style == LineStyle::Blank));
    }

    #[test]
    fn control_sequences_are_stripped() {
        let layout = compute_layout(80, 10);
        let mut bad = poem("1", 0);
        bad.name = Some("\x1b]52;c;ZXZpbA==\x07T".into());
        bad.text = "x\tY\x1b[2J\nab\tc".into();
        let mut view = PoemView::default();
        view.show_poem(&bad);
        let lines = compose(&view, &layout, 0);
        assert_eq!(lines[0].text, "]52;c;ZXZpbA==T");
        assert_eq!(lines[4].text, "x   Y[2J");
        assert_eq!(lines[5].text, "ab  c");
        assert!(lines.iter().all(|l| !l.text.chars().any(char::is_control)));
    }
}
