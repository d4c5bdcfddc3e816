//! Input parsers

pub mod excel;

pub use excel::{collect_inputs, is_excel_file, normalize_input_path, ExcelParser};
