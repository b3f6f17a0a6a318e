//! Render surface for listing pages.
//!
//! Turns a page plus column descriptors into a table or card layout chosen
//! from the viewport width. Row actions are only described here; running
//! them is up to the screen.

use std::fmt::Write as _;

use crate::paging::Page;
use crate::wire::RecordId;

/// Widths at or above this use the table layout (Bootstrap `md`).
pub const TABLE_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Table,
    Cards,
}

/// Viewport signal supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width_px: u32,
}

impl Viewport {
    pub fn new(width_px: u32) -> Self {
        Self { width_px }
    }

    pub fn layout(&self) -> Layout {
        if self.width_px >= TABLE_BREAKPOINT_PX {
            Layout::Table
        } else {
            Layout::Cards
        }
    }
}

/// A labelled value extractor for one column.
pub struct Column<T> {
    pub label: String,
    value_of: Box<dyn Fn(&T) -> String + Send + Sync>,
}

impl<T> Column<T> {
    pub fn new(label: &str, value_of: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Self {
            label: label.to_string(),
            value_of: Box::new(value_of),
        }
    }

    pub fn value(&self, record: &T) -> String {
        (self.value_of)(record)
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column").field("label", &self.label).finish()
    }
}

/// Rows that can be targeted by row actions.
pub trait Identified {
    fn record_id(&self) -> RecordId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowActionKind {
    ViewDetail,
    Edit,
    /// Re-queue a failed job.
    Retry,
    Delete,
}

impl RowActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            RowActionKind::ViewDetail => "Detalhes",
            RowActionKind::Edit => "Editar",
            RowActionKind::Retry => "Reenviar",
            RowActionKind::Delete => "Excluir",
        }
    }
}

/// A row action selected by the user, addressed by record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAction {
    pub kind: RowActionKind,
    pub record_id: RecordId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub id: RecordId,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub layout: Layout,
    pub headers: Vec<String>,
    pub rows: Vec<RenderedRow>,
    pub actions: Vec<RowActionKind>,
    pub summary: String,
}

impl RenderedView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a user pick into an action, if that action is offered.
    pub fn action(&self, row: usize, kind: RowActionKind) -> Option<RowAction> {
        if !self.actions.contains(&kind) {
            return None;
        }
        self.rows.get(row).map(|r| RowAction {
            kind,
            record_id: r.id.clone(),
        })
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if self.rows.is_empty() {
            let _ = writeln!(out, "{}", self.summary);
            return out;
        }
        match self.layout {
            Layout::Table => self.write_table(&mut out),
            Layout::Cards => self.write_cards(&mut out),
        }
        let _ = writeln!(out, "{}", self.summary);
        out
    }

    fn write_table(&self, out: &mut String) {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.cells.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}", w = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let _ = writeln!(out, "{}", line(&self.headers));
        let _ = writeln!(
            out,
            "{}",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-")
        );
        for row in &self.rows {
            let _ = writeln!(out, "{}", line(&row.cells));
        }
    }

    fn write_cards(&self, out: &mut String) {
        for row in &self.rows {
            for (label, value) in self.headers.iter().zip(&row.cells) {
                let _ = writeln!(out, "{label}: {value}");
            }
            out.push('\n');
        }
    }
}

/// "Mostrando 11–20 de 25 registros · página 2 de 3", or the empty state.
pub fn page_summary<T>(page: &Page<T>) -> String {
    match page.row_span() {
        Some((first, last)) => format!(
            "Mostrando {first}–{last} de {} registros · página {} de {}",
            page.total_records, page.page, page.total_pages
        ),
        None if page.total_records > 0 => format!(
            "Nenhum registro nesta página · página {} de {} ({} registros)",
            page.page, page.total_pages, page.total_records
        ),
        None => "Nenhum registro encontrado".to_string(),
    }
}

pub fn render_page<T: Identified>(
    page: &Page<T>,
    columns: &[Column<T>],
    actions: &[RowActionKind],
    viewport: Viewport,
) -> RenderedView {
    RenderedView {
        layout: viewport.layout(),
        headers: columns.iter().map(|c| c.label.clone()).collect(),
        rows: page
            .items
            .iter()
            .map(|record| RenderedRow {
                id: record.record_id(),
                cells: columns.iter().map(|c| c.value(record)).collect(),
            })
            .collect(),
        actions: actions.to_vec(),
        summary: page_summary(page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::PageRequest;

    #[derive(Debug)]
    struct Branch {
        id: i64,
        name: &'static str,
    }

    impl Identified for Branch {
        fn record_id(&self) -> RecordId {
            RecordId::from(self.id)
        }
    }

    fn columns() -> Vec<Column<Branch>> {
        vec![
            Column::new("Código", |b: &Branch| b.id.to_string()),
            Column::new("Filial", |b: &Branch| b.name.to_string()),
        ]
    }

    fn page() -> Page<Branch> {
        Page::assemble(
            vec![
                Branch { id: 11, name: "Centro" },
                Branch { id: 12, name: "Shopping Norte" },
            ],
            PageRequest::new(2, 10),
            12,
            None,
        )
    }

    #[test]
    fn layout_follows_viewport_width() {
        assert_eq!(Viewport::new(1024).layout(), Layout::Table);
        assert_eq!(Viewport::new(768).layout(), Layout::Table);
        assert_eq!(Viewport::new(767).layout(), Layout::Cards);
    }

    #[test]
    fn table_rendering_aligns_columns() {
        let view = render_page(&page(), &columns(), &[], Viewport::new(1200));
        let text = view.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Código | Filial");
        assert_eq!(lines[2], "11     | Centro");
        assert_eq!(lines[3], "12     | Shopping Norte");
        assert_eq!(
            lines[4],
            "Mostrando 11–12 de 12 registros · página 2 de 2"
        );
    }

    #[test]
    fn card_rendering_lists_label_value_pairs() {
        let view = render_page(&page(), &columns(), &[], Viewport::new(360));
        assert_eq!(view.layout, Layout::Cards);
        let text = view.to_text();
        assert!(text.starts_with("Código: 11\nFilial: Centro\n\nCódigo: 12\n"));
    }

    #[test]
    fn empty_page_shows_empty_state() {
        let empty: Page<Branch> = Page::assemble(vec![], PageRequest::new(4, 10), 25, None);
        let view = render_page(&empty, &columns(), &[], Viewport::new(1200));
        assert!(view.is_empty());
        assert_eq!(
            view.to_text().trim_end(),
            "Nenhum registro nesta página · página 4 de 3 (25 registros)"
        );

        let none: Page<Branch> = Page::empty(PageRequest::default());
        assert_eq!(page_summary(&none), "Nenhum registro encontrado");
    }

    #[test]
    fn row_actions_resolve_only_when_offered() {
        let view = render_page(
            &page(),
            &columns(),
            &[RowActionKind::ViewDetail, RowActionKind::Delete],
            Viewport::new(1200),
        );
        assert_eq!(
            view.action(1, RowActionKind::Delete),
            Some(RowAction {
                kind: RowActionKind::Delete,
                record_id: RecordId::from(12),
            })
        );
        assert_eq!(view.action(1, RowActionKind::Edit), None);
        assert_eq!(view.action(9, RowActionKind::Delete), None);
    }
}
