//! PDF export.
//!
//! The table is laid out as a fixed-width text grid in Courier on A4
//! landscape pages. Every page repeats the title and header row. Cells wider
//! than [`MAX_CELL_WIDTH`] are cut short and lines wider than the page are
//! clipped.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, Mm, PdfDocument};
use tablewright_model::Snapshot;
use tracing::debug;

use super::ExportError;

const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 15.0;
const TITLE_SIZE_PT: f32 = 14.0;
const FONT_SIZE_PT: f32 = 9.0;
const LINE_HEIGHT_MM: f32 = 4.5;
const TITLE_GAP_MM: f32 = 10.0;

/// Courier is 0.6em wide: 9pt * 0.6 = 5.4pt ≈ 1.905mm per character.
const MAX_LINE_CHARS: usize = 140;
pub const MAX_CELL_WIDTH: usize = 32;

/// Rows of the text grid: header, separator, then one line per table row.
pub fn layout_lines(snapshot: &Snapshot) -> Vec<String> {
    let headers: Vec<String> = snapshot.headers().iter().map(|h| h.to_string()).collect();
    let rows = snapshot.text_rows();

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).clamp(1, MAX_CELL_WIDTH);
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(grid_line(&headers, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(grid_line(row, &widths));
    }
    lines
}

fn grid_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(&fit(cell, *width), *width))
        .collect::<Vec<_>>()
        .join(" | ");
    fit(line.trim_end(), MAX_LINE_CHARS)
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

fn fit(text: &str, width: usize) -> String {
    // Builtin fonts only cover Latin-1; other characters print as '?'
    let text: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .map(|c| if (c as u32) < 0x100 { c } else { '?' })
        .collect();
    if display_width(&text) <= width {
        return text;
    }
    let keep = width.saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(&".".repeat(width.min(3)));
    cut
}

fn pad(text: &str, width: usize) -> String {
    let len = display_width(text);
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Number of grid lines that fit below the title on one page.
fn lines_per_page() -> usize {
    let usable = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM - TITLE_GAP_MM;
    ((usable / LINE_HEIGHT_MM) as usize).max(3)
}

pub fn export_pdf(snapshot: &Snapshot, path: &Path) -> Result<(), ExportError> {
    let lines = layout_lines(snapshot);
    let (header, body) = lines.split_at(2);
    let per_page = lines_per_page() - header.len();
    let pages: Vec<&[String]> = if body.is_empty() {
        vec![body]
    } else {
        body.chunks(per_page).collect()
    };

    let title = if snapshot.name.is_empty() {
        "Untitled table".to_string()
    } else {
        snapshot.name.clone()
    };
    let (doc, first_page, first_layer) = PdfDocument::new(
        title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Table",
    );
    let title_font = doc
        .add_builtin_font(BuiltinFont::CourierBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let page_count = pages.len();
    for (index, chunk) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Table")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let heading = if page_count > 1 {
            format!("{} ({}/{})", fit(&title, 80), index + 1, page_count)
        } else {
            fit(&title, 80)
        };
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        layer.use_text(heading, TITLE_SIZE_PT, Mm(MARGIN_MM), Mm(y), &title_font);
        y -= TITLE_GAP_MM;

        for line in header.iter().chain(chunk.iter()) {
            layer.use_text(line.clone(), FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
            y -= LINE_HEIGHT_MM;
        }
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    debug!("Wrote {} PDF page(s) to {}", page_count, path.display());
    Ok(())
}
