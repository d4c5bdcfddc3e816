//! Workbook to payslip conversion

mod batch;

pub use batch::*;
