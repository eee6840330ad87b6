//! Domain models for the health records system.

mod document;
mod patient;
mod record;

pub use document::*;
pub use patient::*;
pub use record::*;
