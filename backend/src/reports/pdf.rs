//! PDF rendering of [`ReportDocument`]s.
//!
//! Documents are laid out on A4 pages with the base-14 Helvetica fonts, so no
//! font files are embedded. Output is deterministic: the same document always
//! renders to the same bytes (no timestamps or random IDs are written).

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use super::document::{Block, ReportDocument, TableBlock};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const FOOTER_HEIGHT: f32 = 24.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;
const KEY_COLUMN_WIDTH: f32 = 160.0;

/// Average Helvetica glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.55;

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

const PRODUCER: &str = "moon-reports";

#[derive(Debug, Clone, PartialEq)]
struct TextRun {
    x: f32,
    y: f32,
    size: f32,
    bold: bool,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rule {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

#[derive(Debug, Default)]
struct PageLayout {
    runs: Vec<TextRun>,
    rules: Vec<Rule>,
}

/// Cursor-based page layout; y runs from the top margin down.
struct Layouter {
    pages: Vec<PageLayout>,
    cursor: f32,
}

impl Layouter {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn bottom() -> f32 {
        MARGIN + FOOTER_HEIGHT
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` more points fit on the current one.
    fn ensure(&mut self, height: f32) -> bool {
        if self.cursor - height < Self::bottom() {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn page(&mut self) -> &mut PageLayout {
        // `pages` is never empty
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Place one line of text at `x` and move the cursor below it.
    fn line(&mut self, x: f32, size: f32, bold: bool, text: &str) {
        let height = size * 1.4;
        self.ensure(height);
        let y = self.cursor - size;
        self.page().runs.push(TextRun {
            x,
            y,
            size,
            bold,
            text: text.to_string(),
        });
        self.cursor -= height;
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn rule(&mut self, x1: f32, x2: f32) {
        let y = self.cursor + 2.0;
        self.page().rules.push(Rule { x1, y1: y, x2, y2: y });
    }
}

/// Render a document to PDF bytes.
pub fn render(document: &ReportDocument) -> Vec<u8> {
    let pages = layout(document);
    write_pdf(document, &pages)
}

fn layout(document: &ReportDocument) -> Vec<PageLayout> {
    let mut out = Layouter::new();

    for line in wrap(&document.title, CONTENT_WIDTH, TITLE_SIZE) {
        out.line(MARGIN, TITLE_SIZE, true, &line);
    }
    if let Some(subtitle) = &document.subtitle {
        for line in wrap(subtitle, CONTENT_WIDTH, SUBTITLE_SIZE) {
            out.line(MARGIN, SUBTITLE_SIZE, false, &line);
        }
    }
    out.gap(4.0);
    out.rule(MARGIN, PAGE_WIDTH - MARGIN);
    out.gap(10.0);

    for section in &document.sections {
        // Keep a heading together with at least two lines of its content
        out.ensure(HEADING_SIZE * 1.4 + BODY_SIZE * 2.8);
        out.line(MARGIN, HEADING_SIZE, true, &section.heading);
        out.gap(2.0);

        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => {
                    for line in wrap(text, CONTENT_WIDTH, BODY_SIZE) {
                        out.line(MARGIN, BODY_SIZE, false, &line);
                    }
                }
                Block::KeyValues(pairs) => layout_key_values(&mut out, pairs),
                Block::Table(table) => layout_table(&mut out, table),
            }
            out.gap(6.0);
        }
        out.gap(8.0);
    }

    out.pages
}

fn layout_key_values(out: &mut Layouter, pairs: &[(String, String)]) {
    let value_width = CONTENT_WIDTH - KEY_COLUMN_WIDTH;
    for (key, value) in pairs {
        let lines = wrap(value, value_width, BODY_SIZE);
        out.ensure(BODY_SIZE * 1.4 * lines.len().max(1) as f32);
        let top = out.cursor;
        out.line(MARGIN, BODY_SIZE, true, &fit(key, KEY_COLUMN_WIDTH - 8.0, BODY_SIZE));
        out.cursor = top;
        for line in &lines {
            out.line(MARGIN + KEY_COLUMN_WIDTH, BODY_SIZE, false, line);
        }
        if lines.is_empty() {
            out.cursor = top - BODY_SIZE * 1.4;
        }
    }
}

fn layout_table(out: &mut Layouter, table: &TableBlock) {
    if table.columns.is_empty() {
        return;
    }

    let size = if table.columns.len() <= 6 {
        BODY_SIZE - 1.0
    } else if table.columns.len() <= 10 {
        7.5
    } else {
        6.0
    };
    let row_height = size * 1.5;
    let column_width = CONTENT_WIDTH / table.columns.len() as f32;

    // Callers reserve `row_height` first, so the cells below never break the page
    let header = |out: &mut Layouter| {
        let top = out.cursor;
        for (i, name) in table.columns.iter().enumerate() {
            out.cursor = top;
            let x = MARGIN + i as f32 * column_width;
            out.line(x, size, true, &fit(name, column_width - 4.0, size));
        }
        out.cursor = top - row_height;
        out.rule(MARGIN, PAGE_WIDTH - MARGIN);
    };

    out.ensure(row_height * 2.0);
    header(&mut *out);

    for row in &table.rows {
        if out.ensure(row_height) {
            header(&mut *out);
        }
        let top = out.cursor;
        for (i, cell) in row.iter().enumerate().take(table.columns.len()) {
            out.cursor = top;
            let x = MARGIN + i as f32 * column_width;
            out.line(x, size, false, &fit(cell, column_width - 4.0, size));
        }
        out.cursor = top - row_height;
    }
}

fn write_pdf(document: &ReportDocument, pages: &[PageLayout]) -> Vec<u8> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let regular_id = alloc.bump();
    let bold_id = alloc.bump();
    let info_id = alloc.bump();
    let page_ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc.bump(), alloc.bump())).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().map(|(page_id, _)| *page_id))
        .count(page_ids.len() as i32);
    pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));
    pdf.document_info(info_id)
        .title(TextStr(&sanitize(&document.title)))
        .producer(TextStr(PRODUCER));

    let total = pages.len();
    for (number, (layout, (page_id, content_id))) in pages.iter().zip(&page_ids).enumerate() {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(page_tree_id);
        page.contents(*content_id);
        page.resources()
            .fonts()
            .pair(REGULAR_FONT, regular_id)
            .pair(BOLD_FONT, bold_id);
        page.finish();

        let footer = page_footer(document, number + 1, total);
        pdf.stream(*content_id, &page_content(layout, &footer));
    }

    pdf.finish()
}

fn page_footer(document: &ReportDocument, number: usize, total: usize) -> TextRun {
    let page_label = format!("Page {} of {}", number, total);
    let text = match &document.footer {
        Some(footer) => format!("{}    {}", footer, page_label),
        None => page_label,
    };
    TextRun {
        x: MARGIN,
        y: MARGIN,
        size: FOOTER_SIZE,
        bold: false,
        text: fit(&text, CONTENT_WIDTH, FOOTER_SIZE),
    }
}

fn page_content(layout: &PageLayout, footer: &TextRun) -> Vec<u8> {
    let mut content = Content::new();

    if !layout.rules.is_empty() {
        content.set_line_width(0.5);
        for rule in &layout.rules {
            content.move_to(rule.x1, rule.y1);
            content.line_to(rule.x2, rule.y2);
        }
        content.stroke();
    }

    for run in layout.runs.iter().chain(std::iter::once(footer)) {
        let font = if run.bold { BOLD_FONT } else { REGULAR_FONT };
        let text = sanitize(&run.text);
        content.begin_text();
        content.set_font(font, run.size);
        content.next_line(run.x, run.y);
        content.show(Str(text.as_bytes()));
        content.end_text();
    }

    content.finish()
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

/// Truncate `text` with an ellipsis so it fits in `width`.
fn fit(text: &str, width: f32, size: f32) -> String {
    if text_width(text, size) <= width {
        return text.to_string();
    }
    let max_chars = (width / (size * AVG_GLYPH_WIDTH)).floor() as usize;
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Greedy word wrap. Words longer than a line are truncated.
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = fit(word, width, size);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Reduce text to the printable ASCII the standard Helvetica encoding covers.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' | '\u{02bf}' | '\u{02be}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{b0}' => out.push_str(" deg"),
            '\t' | '\n' | '\r' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::document::Section;

    fn sample_document(rows: usize) -> ReportDocument {
        let mut doc = ReportDocument::new("Moon Parameters")
            .with_subtitle("Ramadan 1445 AH")
            .with_footer("dataset abc123");
        doc.push(Section::new("Request").key_values([("Date", "2024-03-10")]));
        doc.push(Section::new("Rows").table(
            vec!["location".into(), "arcv".into()],
            (0..rows)
                .map(|i| vec![format!("site {}", i), format!("{}.5", i)])
                .collect(),
        ));
        doc
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&sample_document(3));
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Helvetica"));
        assert!(text.contains("(Moon Parameters)"));
        assert!(text.contains("(Page 1 of 1)") || text.contains("Page 1 of 1"));
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(&sample_document(5)), render(&sample_document(5)));
    }

    #[test]
    fn test_long_tables_paginate() {
        let pages = layout(&sample_document(200));
        assert!(pages.len() > 1);
        for page in &pages {
            for run in &page.runs {
                assert!(run.y >= MARGIN, "run below margin: {:?}", run);
            }
        }
    }

    #[test]
    fn test_wrap_and_fit() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 60.0, 10.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, 10.0) <= 60.0));

        let fitted = fit("a very long column name indeed", 50.0, 10.0);
        assert!(fitted.ends_with("..."));
        assert!(text_width(&fitted, 10.0) <= 50.0);
        assert_eq!(fit("short", 100.0, 10.0), "short");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("12.5\u{b0} \u{2013} ok"), "12.5 deg - ok");
        assert_eq!(sanitize("\u{0631}\u{0645}\u{0636}\u{0627}\u{0646}"), "?????");
    }
}
