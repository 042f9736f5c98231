//! PDF and Excel rendering of report tables.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Local, NaiveDate, TimeZone};
use clap::ValueEnum;
use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color as PdfColor, Style};
use genpdf::{Alignment, Document, Element, Margins, SimplePageDecorator};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

use crate::download::{DownloadBridge, DownloadOutcome, save_export};
use crate::error::{AppError, Result};
use crate::permissions::{Capability, CapabilityBridge, ensure};
use crate::reports::{self, Cell, ReportKind, ReportTable};

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Xlsx => "Excel",
        }
    }
}

/// A rendered document ready to be saved.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Render `table` in `format` under a fresh timestamped file name.
pub fn render(table: &ReportTable, format: ExportFormat, fonts_dir: &Path) -> Result<ExportedFile> {
    let bytes = match format {
        ExportFormat::Pdf => render_pdf(table, fonts_dir)?,
        ExportFormat::Xlsx => render_xlsx(table)?,
    };

    let file_name = generate_export_filename(&table.file_prefix, format.extension());
    debug!("Rendered {} ({} bytes)", file_name, bytes.len());

    Ok(ExportedFile {
        file_name,
        mime_type: format.mime_type(),
        bytes,
    })
}

/// Fetch, render and save one report. Each call writes a new file.
pub async fn export_report(
    db: &DatabaseConnection,
    kind: ReportKind,
    date: NaiveDate,
    format: ExportFormat,
    fonts_dir: &Path,
    capabilities: &dyn CapabilityBridge,
    bridge: &dyn DownloadBridge,
) -> Result<DownloadOutcome> {
    let table = reports::fetch(db, kind, date).await?;
    let file = render(&table, format, fonts_dir)?;

    ensure(capabilities, Capability::Filesystem)?;
    let outcome = save_export(bridge, &file)?;
    info!(
        "Exported '{}' as {} ({} rows) to {}",
        kind,
        format.label(),
        table.len(),
        outcome.path.display()
    );
    Ok(outcome)
}

/// Spreadsheet with a styled header row. Zero rows still yield a valid workbook.
pub fn render_xlsx(table: &ReportTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name(&table.sheet_name)?;

    // Header format
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (idx, cells) in table.rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Text(text) => worksheet.write_string(row, col as u16, text)?,
                Cell::Int(n) => worksheet.write_number(row, col as u16, *n as f64)?,
            };
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }

    // Autofilter
    if !table.is_empty() && !table.headers.is_empty() {
        let last_row = table.len() as u32;
        let last_col = (table.headers.len() - 1) as u16;
        worksheet.autofilter(0, 0, last_row, last_col)?;
    }

    // Freeze top row
    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}

fn column_widths(table: &ReportTable) -> Vec<f64> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let widest = table
                .rows
                .iter()
                .filter_map(|r| r.get(col))
                .map(|c| c.to_string().chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(10);
            (widest + 2).clamp(10, 50) as f64
        })
        .collect()
}

/// Font shipped with the crate, used when no `LiberationSans-*.ttf` is found.
const BUNDLED_FONT: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts/Ubuntu-Light.ttf"));

/// `LiberationSans-*.ttf` from `fonts_dir` when present, else the bundled font.
fn load_font_family(fonts_dir: &Path) -> Result<FontFamily<FontData>> {
    if fonts_dir.join("LiberationSans-Regular.ttf").is_file() {
        return genpdf::fonts::from_files(fonts_dir, "LiberationSans", None).map_err(|e| {
            AppError::export(format!(
                "Error cargando fuentes de {}: {e}",
                fonts_dir.display()
            ))
        });
    }

    debug!("No LiberationSans in {}, using bundled font", fonts_dir.display());
    let font = FontData::new(BUNDLED_FONT.to_vec(), None)?;
    Ok(FontFamily {
        regular: font.clone(),
        bold: font.clone(),
        italic: font.clone(),
        bold_italic: font,
    })
}

/// Document with title, bordered table and footer note.
pub fn render_pdf(table: &ReportTable, fonts_dir: &Path) -> Result<Vec<u8>> {
    let font_family = load_font_family(fonts_dir)?;

    let mut doc = Document::new(font_family);
    doc.set_title(table.title.as_str());

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(Margins::trbl(15, 15, 15, 15));
    doc.set_page_decorator(decorator);

    let s_title = Style::new().with_font_size(14).bold();
    let s_header = Style::new().with_font_size(9).bold();
    let s_cell = Style::new().with_font_size(9);
    let s_note = Style::new().with_font_size(8).with_color(PdfColor::Greyscale(96));

    doc.push(Paragraph::new(table.title.as_str()).aligned(Alignment::Center).styled(s_title));
    doc.push(Break::new(1.0));

    let weights = column_widths(table).into_iter().map(|w| w as usize).collect();
    let mut grid = TableLayout::new(weights);
    grid.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut header_row = grid.row();
    for header in &table.headers {
        header_row = header_row.element(Paragraph::new(header.as_str()).styled(s_header).padded(Margins::trbl(1, 1, 1, 1)));
    }
    header_row.push()?;

    for cells in &table.rows {
        let mut row = grid.row();
        for cell in cells {
            let align = match cell {
                Cell::Int(_) => Alignment::Right,
                Cell::Text(_) => Alignment::Left,
            };
            row = row.element(
                Paragraph::new(cell.to_string())
                    .aligned(align)
                    .styled(s_cell)
                    .padded(Margins::trbl(1, 1, 1, 1)),
            );
        }
        row.push()?;
    }
    doc.push(grid);

    if table.is_empty() {
        doc.push(Break::new(0.5));
        doc.push(Paragraph::new("No hay productos para este reporte.").styled(s_cell));
    }

    if let Some(footer) = &table.footer {
        doc.push(Break::new(1.0));
        for line in footer.lines() {
            doc.push(Paragraph::new(line).styled(s_note));
        }
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)?;
    Ok(buffer)
}

static LAST_STAMP_MS: AtomicI64 = AtomicI64::new(0);

/// `{prefix}_{YYYYMMDD_HHMMSS_mmm}.{ext}`, strictly increasing within the process.
///
/// Two calls in the same millisecond get consecutive stamps, so names never
/// collide.
pub fn generate_export_filename(prefix: &str, extension: &str) -> String {
    let now = Local::now().timestamp_millis();
    let previous = LAST_STAMP_MS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or(now);
    let stamp = now.max(previous + 1);

    let ts = Local
        .timestamp_millis_opt(stamp)
        .single()
        .unwrap_or_else(Local::now)
        .format("%Y%m%d_%H%M%S_%3f");
    format!("{prefix}_{ts}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{ReportKind, build};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn empty_table() -> ReportTable {
        build(ReportKind::MalEstado, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), &[])
    }

    #[test]
    fn test_filenames_unique_on_successive_calls() {
        let names: Vec<String> = (0..200)
            .map(|_| generate_export_filename("reporte_productos", "pdf"))
            .collect();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(names.iter().all(|n| n.starts_with("reporte_productos_") && n.ends_with(".pdf")));
    }

    #[test]
    fn test_empty_report_renders_valid_xlsx() {
        let bytes = render_xlsx(&empty_table()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_xlsx_with_rows() {
        let rows = vec![crate::models::producto::fixtures::producto(1, "Toner", "Usado", 4)];
        let table = build(ReportKind::Usados, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), &rows);
        let bytes = render_xlsx(&table).unwrap();
        assert!(bytes.len() > 100);
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_column_widths_clamped() {
        let widths = column_widths(&empty_table());
        assert_eq!(widths.len(), 5);
        assert!(widths.iter().all(|w| (10.0..=50.0).contains(w)));
    }

    #[test]
    fn test_empty_report_renders_pdf_with_bundled_font() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = render_pdf(&empty_table(), dir.path()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_default_fonts_dir_renders_pdf() {
        let fonts_dir = crate::config::ExportConfig::default().fonts_dir;
        let bytes = render_pdf(&empty_table(), &fonts_dir).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_broken_liberation_fonts_are_export_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LiberationSans-Regular.ttf"), b"not a font").unwrap();
        let err = render_pdf(&empty_table(), dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Export(_)));
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
    }
}
