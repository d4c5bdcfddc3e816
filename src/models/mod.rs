//! Data models for spreadsheet contents

mod cell;
mod table;

pub use cell::*;
pub use table::*;
