use super::Sheet;
use crate::domain::error::{AppError, Result};

pub fn write_sheet(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&sheet.headers)
        .map_err(|e| AppError::ExportError(format!("Failed to write CSV header: {}", e)))?;
    for row in &sheet.rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::ExportError(format!("Failed to write CSV row: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::ExportError(format!("Failed to flush CSV: {}", e)))
}
