//! Hostname loader: reads the target column from a spreadsheet.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::info;

use crate::config::InventoryConfig;
use crate::error::InventoryError;

/// Load hostnames in row order, dropping blank cells.
pub fn load(config: &InventoryConfig) -> Result<Vec<String>, InventoryError> {
    load_from(&config.path, &config.column, config.sheet.as_deref())
}

pub fn load_from(
    path: &Path,
    column: &str,
    sheet: Option<&str>,
) -> Result<Vec<String>, InventoryError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| InventoryError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.to_string(),
        Some(name) => {
            return Err(InventoryError::MissingSheet {
                path: path.to_path_buf(),
                sheet: name.to_string(),
            })
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| InventoryError::NoSheets {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| InventoryError::Open {
            path: path.to_path_buf(),
            message: format!("reading sheet '{}': {}", sheet_name, e),
        })?;

    let hostnames = hostnames_from_range(&range, column, &sheet_name)?;
    info!(
        path = %path.display(),
        sheet = %sheet_name,
        column,
        count = hostnames.len(),
        "loaded hostnames"
    );
    Ok(hostnames)
}

/// The first row is the header; `column` must match a header cell exactly
/// (surrounding whitespace ignored).
pub fn hostnames_from_range(
    range: &Range<Data>,
    column: &str,
    sheet_name: &str,
) -> Result<Vec<String>, InventoryError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| InventoryError::EmptySheet {
        sheet: sheet_name.to_string(),
    })?;

    let index = header
        .iter()
        .position(|cell| cell_text(cell).as_deref() == Some(column.trim()))
        .ok_or_else(|| InventoryError::MissingColumn {
            column: column.to_string(),
            available: header
                .iter()
                .filter_map(cell_text)
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    Ok(rows
        .filter_map(|row| row.get(index).and_then(cell_text))
        .collect())
}

/// Trimmed text of a cell, or `None` for blanks.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (*f as i64).to_string()
        }
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}
