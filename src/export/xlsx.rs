use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, XlsxError};

use crate::export::{COLUMNS, ReportRow};

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Render the report as an `.xlsx` workbook with a single "Reportes" sheet.
pub fn to_xlsx(rows: &[ReportRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name("Reportes")?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF2F2F2))
        .set_border(FormatBorder::Thin);
    let absent_format = Format::new().set_font_color(Color::RGB(0xC62828));

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (col, width) in [12, 28, 14, 10, 10, 16, 14, 13, 10].iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;

        for (col, cell) in row.cells().iter().enumerate() {
            let col = col as u16;
            match (col, row.atraso_min) {
                // Lateness stays numeric so the sheet can sum it
                (7, Some(minutes)) => {
                    worksheet.write_number(r, col, minutes as f64)?;
                }
                (8, _) if !row.presente => {
                    worksheet.write_string_with_format(r, col, cell, &absent_format)?;
                }
                _ => {
                    worksheet.write_string(r, col, cell)?;
                }
            }
        }
    }

    if !rows.is_empty() {
        worksheet.autofilter(0, 0, rows.len() as u32, (COLUMNS.len() - 1) as u16)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    workbook.save_to_buffer()
}
