//! CSV export and import of health records.

mod csv;

pub use self::csv::*;
