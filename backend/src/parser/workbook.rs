//! Workbook reading through calamine.
//!
//! The used range of a sheet does not always start at `A1`. Cells are placed
//! back at their absolute coordinates so positional column fallbacks and
//! explicit header rows mean the same thing as in the spreadsheet UI.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::{Grid, TableFormat};
use crate::config::DEFAULT_SHEET_NAME;
use crate::error::{SheetError, SheetResult};

/// Open a workbook file and read one sheet.
pub fn read_workbook_file(path: &Path, sheet_name: Option<&str>) -> SheetResult<Grid> {
    let mut workbook = open_workbook_auto(path)?;
    read_sheet(&mut workbook, sheet_name)
}

/// Read one sheet from workbook bytes.
pub fn read_workbook_bytes(bytes: &[u8], sheet_name: Option<&str>) -> SheetResult<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    read_sheet(&mut workbook, sheet_name)
}

/// Choose the sheet to read.
///
/// A requested sheet must exist. Without a request the standard parts list
/// sheet is preferred, then the first sheet.
pub fn pick_sheet(names: &[String], requested: Option<&str>) -> SheetResult<String> {
    if let Some(wanted) = requested {
        return names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| SheetError::SheetNotFound(wanted.to_string()));
    }

    names
        .iter()
        .find(|n| n.as_str() == DEFAULT_SHEET_NAME)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| SheetError::WorkbookError("workbook has no sheets".to_string()))
}

fn read_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>, sheet_name: Option<&str>) -> SheetResult<Grid> {
    let name = pick_sheet(&workbook.sheet_names(), sheet_name)?;
    let range = workbook.worksheet_range(&name)?;

    Ok(Grid {
        format: TableFormat::Workbook,
        encoding: None,
        delimiter: None,
        sheet: Some(name),
        cells: range_to_cells(&range),
    })
}

/// Render a cell the way it reads in the sheet.
///
/// Integral floats print without a fraction (`3.0` → `3`).
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn range_to_cells(range: &Range<Data>) -> Vec<Vec<String>> {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut line = vec![String::new(); col_offset];
        line.extend(row.iter().map(cell_to_string));
        cells.push(line);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("  ROLLER ".into())), "ROLLER");
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
    }

    #[test]
    fn test_range_offset_is_preserved() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("ITEM".into()));
        range.set_value((2, 2), Data::String("SERIAL".into()));
        range.set_value((3, 1), Data::Float(1.0));
        range.set_value((3, 2), Data::String("10A01".into()));

        let cells = range_to_cells(&range);

        assert_eq!(cells.len(), 4);
        assert!(cells[0].is_empty());
        assert_eq!(cells[2], vec!["", "ITEM", "SERIAL"]);
        assert_eq!(cells[3], vec!["", "1", "10A01"]);
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_sheet_prefers_parts_list() {
        let sheets = names(&["表紙", "組立部品リスト", "集計"]);
        assert_eq!(pick_sheet(&sheets, None).unwrap(), "組立部品リスト");
        assert_eq!(pick_sheet(&names(&["Sheet1", "Sheet2"]), None).unwrap(), "Sheet1");
    }

    #[test]
    fn test_pick_sheet_requested() {
        let sheets = names(&["Sheet1", "BOM"]);
        assert_eq!(pick_sheet(&sheets, Some("BOM")).unwrap(), "BOM");

        let err = pick_sheet(&sheets, Some("組立部品リスト")).unwrap_err();
        assert!(matches!(err, SheetError::SheetNotFound(ref name) if name == "組立部品リスト"));
    }

    #[test]
    fn test_pick_sheet_empty_workbook() {
        assert!(matches!(pick_sheet(&[], None), Err(SheetError::WorkbookError(_))));
    }

    #[test]
    fn test_invalid_workbook_bytes() {
        let result = read_workbook_bytes(b"not a workbook", None);
        assert!(matches!(result, Err(SheetError::WorkbookError(_))));
    }
}
