use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::Sheet;
use crate::domain::error::{AppError, Result};

const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 60;

pub fn write_sheet(sheet: &Sheet) -> Result<Vec<u8>> {
    build_workbook(sheet).map_err(|e| AppError::ExportError(format!("Failed to write XLSX: {}", e)))
}

fn build_workbook(sheet: &Sheet) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    if !sheet.name.is_empty() {
        worksheet.set_name(worksheet_name(&sheet.name))?;
    }

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32 + 1, col as u16, value)?;
        }
    }

    for (col, width) in column_widths(sheet).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    workbook.save_to_buffer()
}

fn column_widths(sheet: &Sheet) -> Vec<usize> {
    let mut widths: Vec<usize> = sheet.headers.iter().map(|h| h.chars().count()).collect();
    for row in &sheet.rows {
        for (col, value) in row.iter().enumerate() {
            let len = value.chars().count();
            match widths.get_mut(col) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
        .into_iter()
        .map(|w| (w + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
        .collect()
}

// Excel limits sheet names to 31 characters and forbids []:*?/\
fn worksheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(31)
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet1".to_string()
    } else {
        trimmed.to_string()
    }
}
