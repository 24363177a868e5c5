use crate::domain::{ColumnValue, EnrichedListing, OUTPUT_COLUMNS};
use crate::errors::PipelineError;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

/// Output table as an in-memory workbook: header row, then one row per
/// listing in `OUTPUT_COLUMNS` order.
pub fn listings_workbook(listings: &[EnrichedListing]) -> Result<Vec<u8>, PipelineError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("listings")?;

    let bold = Format::new().set_bold();
    for (col, header) in OUTPUT_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, listing) in listings.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in listing.row().into_iter().enumerate() {
            let c = col as u16;
            match cell {
                ColumnValue::Text(v) => {
                    worksheet.write_string(r, c, v)?;
                }
                ColumnValue::Number(v) => {
                    worksheet.write_number(r, c, v)?;
                }
                ColumnValue::Empty => {}
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}

pub fn export_listings_xlsx(listings: &[EnrichedListing], path: &Path) -> Result<(), PipelineError> {
    let buffer = listings_workbook(listings)?;
    std::fs::write(path, buffer)?;
    info!(path = %path.display(), rows = listings.len(), "spreadsheet written");
    Ok(())
}
