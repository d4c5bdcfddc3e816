//! PDF payslip layout
//!
//! Pages are landscape A4. All layout math is done in points measured from
//! the top-left corner and converted to printpdf's bottom-left millimetres
//! only when drawing.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDateTime;
use printpdf::path::PaintMode;
use printpdf::{
    Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Rect, Rgb,
};

use crate::error::Result;
use crate::models::{PersonRecord, ReportLayout};
use crate::shaping::TextShaper;

use super::{FontSource, ReportStyle};

const PAGE_WIDTH: f32 = 841.89;
const PAGE_HEIGHT: f32 = 595.28;
const MARGIN: f32 = 30.0;
const PT_TO_MM: f32 = 25.4 / 72.0;

const TITLE_SIZE: f32 = 18.0;
const TITLE_LEADING: f32 = 24.0;
const TITLE_SPACE_AFTER: f32 = 30.0;
const TITLE_GAP: f32 = 36.0;
const STAMP_SIZE: f32 = 10.0;
const STAMP_LEADING: f32 = 14.0;
const STAMP_GAP: f32 = 21.6;

const HEADER_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const MIN_SIZE: f32 = 5.0;
const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_TOP: f32 = 3.0;
const HEADER_PAD_BOTTOM: f32 = 12.0;
const BODY_PAD_BOTTOM: f32 = 3.0;
const GRID_WIDTH: f32 = 1.0;

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn grey() -> Color {
    rgb(0.5, 0.5, 0.5)
}

fn whitesmoke() -> Color {
    rgb(0.96, 0.96, 0.96)
}

fn lightgrey() -> Color {
    rgb(0.827, 0.827, 0.827)
}

fn white() -> Color {
    rgb(1.0, 1.0, 1.0)
}

fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

fn mm(points: f32) -> Mm {
    Mm(points * PT_TO_MM)
}

/// Shaped table ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Grid {
    /// Rows of cell text, left to right as drawn
    pub rows: Vec<Vec<String>>,
    /// Width of each column in points
    pub widths: Vec<f32>,
    /// Font size of the header row
    pub header_size: f32,
    /// Font size of the other rows
    pub body_size: f32,
}

impl Grid {
    fn row_height(&self, row: usize) -> f32 {
        if row == 0 {
            self.header_size * 1.2 + CELL_PAD_TOP + HEADER_PAD_BOTTOM
        } else {
            self.body_size * 1.2 + CELL_PAD_TOP + BODY_PAD_BOTTOM
        }
    }

    fn total_width(&self) -> f32 {
        self.widths.iter().sum()
    }
}

/// Lay out the shaped table for a record.
///
/// Horizontal: a header row of column names over a single value row, with the
/// first column on the right. Vertical: one `[value, label]` row per column.
/// The first row is styled as the header in both cases.
pub(crate) fn build_grid(
    record: &PersonRecord,
    layout: ReportLayout,
    shaper: &TextShaper,
    font: &FontSource,
    missing: &str,
) -> Grid {
    let shaped: Vec<(String, String)> = record
        .fields
        .iter()
        .map(|(label, value)| (shaper.shape(label), shaper.shape(&value.display_or(missing))))
        .collect();

    let rows: Vec<Vec<String>> = match layout {
        ReportLayout::Horizontal => {
            let headers = shaped.iter().rev().map(|(label, _)| label.clone()).collect();
            let values = shaped.iter().rev().map(|(_, value)| value.clone()).collect();
            vec![headers, values]
        }
        ReportLayout::Vertical => shaped
            .into_iter()
            .map(|(label, value)| vec![value, label])
            .collect(),
    };

    let columns = rows.first().map(Vec::len).unwrap_or(0);
    let mut widths = vec![0.0f32; columns];
    for (idx, row) in rows.iter().enumerate() {
        let size = if idx == 0 { HEADER_SIZE } else { BODY_SIZE };
        for (col, text) in row.iter().enumerate() {
            let width = font.text_width(text, size) + 2.0 * CELL_PAD_X;
            widths[col] = widths[col].max(width);
        }
    }

    let mut grid = Grid {
        rows,
        widths,
        header_size: HEADER_SIZE,
        body_size: BODY_SIZE,
    };

    let available = PAGE_WIDTH - 2.0 * MARGIN;
    let total = grid.total_width();
    if total > available {
        let scale = available / total;
        grid.widths.iter_mut().for_each(|w| *w *= scale);
        grid.header_size = (HEADER_SIZE * scale).max(MIN_SIZE);
        grid.body_size = (BODY_SIZE * scale).max(MIN_SIZE);
    }

    grid
}

/// A page being filled from top to bottom
struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

/// Writes one payslip document
pub(crate) struct DocumentWriter<'a> {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_source: &'a FontSource,
    cursor: Cursor,
}

impl<'a> DocumentWriter<'a> {
    pub fn new(title: &str, font_source: &'a FontSource) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        let font = font_source.register(&doc)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            font,
            font_source,
            cursor: Cursor { layer, y: MARGIN },
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        self.cursor = Cursor {
            layer: self.doc.get_page(page).get_layer(layer),
            y: MARGIN,
        };
    }

    fn text(&self, text: &str, size: f32, x: f32, baseline: f32, color: Color) {
        self.cursor.layer.set_fill_color(color);
        self.cursor
            .layer
            .use_text(text, size, mm(x), mm(PAGE_HEIGHT - baseline), &self.font);
    }

    fn rect(&self, x: f32, top: f32, width: f32, height: f32, mode: PaintMode) {
        let rect = Rect::new(
            mm(x),
            mm(PAGE_HEIGHT - top - height),
            mm(x + width),
            mm(PAGE_HEIGHT - top),
        )
        .with_mode(mode);
        self.cursor.layer.add_rect(rect);
    }

    /// Centered title line, shrunk to fit the page width
    pub fn title(&mut self, text: &str) {
        let available = PAGE_WIDTH - 2.0 * MARGIN;
        let mut size = TITLE_SIZE;
        let width = self.font_source.text_width(text, size);
        if width > available {
            size = (size * available / width).max(MIN_SIZE);
        }
        let width = self.font_source.text_width(text, size);
        let x = MARGIN + (available - width).max(0.0) / 2.0;

        self.text(text, size, x, self.cursor.y + size, black());
        self.cursor.y += TITLE_LEADING + TITLE_SPACE_AFTER + TITLE_GAP;
    }

    /// Right-aligned paragraph line
    pub fn stamp(&mut self, text: &str) {
        let width = self.font_source.text_width(text, STAMP_SIZE);
        let x = (PAGE_WIDTH - MARGIN - width).max(MARGIN);
        self.text(text, STAMP_SIZE, x, self.cursor.y + STAMP_SIZE, black());
        self.cursor.y += STAMP_LEADING + STAMP_GAP;
    }

    /// Draw the table, starting new pages as needed and repeating the header row
    pub fn table(&mut self, grid: &Grid) {
        let left = MARGIN + ((PAGE_WIDTH - 2.0 * MARGIN) - grid.total_width()).max(0.0) / 2.0;
        let bottom = PAGE_HEIGHT - MARGIN;

        for idx in 0..grid.rows.len() {
            let height = grid.row_height(idx);
            if idx > 0 && self.cursor.y + height > bottom {
                self.new_page();
                self.row(grid, 0, left);
            }
            self.row(grid, idx, left);
        }
    }

    fn row(&mut self, grid: &Grid, idx: usize, left: f32) {
        let top = self.cursor.y;
        let height = grid.row_height(idx);
        let (size, background, foreground, pad_bottom) = if idx == 0 {
            (grid.header_size, grey(), whitesmoke(), HEADER_PAD_BOTTOM)
        } else if idx % 2 == 1 {
            (grid.body_size, white(), black(), BODY_PAD_BOTTOM)
        } else {
            (grid.body_size, lightgrey(), black(), BODY_PAD_BOTTOM)
        };

        let mut x = left;
        for (col, text) in grid.rows[idx].iter().enumerate() {
            let width = grid.widths[col];

            self.cursor.layer.set_fill_color(background.clone());
            self.rect(x, top, width, height, PaintMode::Fill);

            let text_width = self.font_source.text_width(text, size);
            let text_x = (x + width - CELL_PAD_X - text_width).max(x + CELL_PAD_X);
            let baseline = top + height - pad_bottom - size * 0.2;
            self.text(text, size, text_x, baseline, foreground.clone());

            self.cursor.layer.set_outline_color(black());
            self.cursor.layer.set_outline_thickness(GRID_WIDTH);
            self.rect(x, top, width, height, PaintMode::Stroke);

            x += width;
        }

        self.cursor.y += height;
    }

    /// Write the document to disk
    pub fn save(self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.doc.save(&mut BufWriter::new(file))?;
        Ok(())
    }
}

/// Render one record into a PDF at `path`
pub(crate) fn write_payslip(
    record: &PersonRecord,
    style: &ReportStyle,
    shaper: &TextShaper,
    font: &FontSource,
    generated_at: NaiveDateTime,
    path: &Path,
) -> Result<()> {
    let layout = ReportLayout::for_columns(record.fields.len(), style.vertical_threshold);
    let title = shaper.shape(&format!("{}: {}", style.title, record.name));
    let stamp = shaper.shape(&format!("{}: {}", style.date_label, style.timestamp(generated_at)));
    let grid = build_grid(record, layout, shaper, font, &style.missing_value);

    let mut writer = DocumentWriter::new(&record.name, font)?;
    writer.title(&title);
    writer.stamp(&stamp);
    writer.table(&grid);
    writer.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn record(columns: usize) -> PersonRecord {
        PersonRecord {
            name: "Ali".into(),
            fields: (0..columns)
                .map(|i| {
                    let value = if i == 1 { Cell::Empty } else { Cell::Int(i as i64) };
                    (format!("Col{}", i), value)
                })
                .collect(),
        }
    }

    #[test]
    fn test_horizontal_grid_reverses_columns() {
        let grid = build_grid(
            &record(3),
            ReportLayout::Horizontal,
            &TextShaper::default(),
            &FontSource::Builtin,
            "-",
        );
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0], vec!["Col2", "Col1", "Col0"]);
        assert_eq!(grid.rows[1], vec!["2", "-", "0"]);
        assert_eq!(grid.header_size, HEADER_SIZE);
    }

    #[test]
    fn test_vertical_grid_puts_label_right() {
        let grid = build_grid(
            &record(12),
            ReportLayout::Vertical,
            &TextShaper::default(),
            &FontSource::Builtin,
            "n/a",
        );
        assert_eq!(grid.rows.len(), 12);
        assert_eq!(grid.rows[1], vec!["n/a", "Col1"]);
        assert_eq!(grid.widths.len(), 2);
    }

    #[test]
    fn test_wide_grid_is_scaled_to_page() {
        let mut wide = record(10);
        for (_, value) in wide.fields.iter_mut() {
            *value = Cell::Text("x".repeat(60));
        }
        let grid = build_grid(
            &wide,
            ReportLayout::Horizontal,
            &TextShaper::default(),
            &FontSource::Builtin,
            "-",
        );
        assert!(grid.total_width() <= PAGE_WIDTH - 2.0 * MARGIN + 0.01);
        assert!(grid.body_size < BODY_SIZE);
    }

    #[test]
    fn test_long_vertical_table_spans_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.pdf");
        write_payslip(
            &record(80),
            &ReportStyle::default(),
            &TextShaper::default(),
            &FontSource::Builtin,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            &path,
        )
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
