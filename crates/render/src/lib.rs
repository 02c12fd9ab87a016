//! XLSX rendering of the aggregated report tables.

pub mod workbook;

pub use workbook::WorkbookRenderer;
