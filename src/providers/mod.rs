pub mod sheets;

pub use sheets::{GoogleSheetSource, LocalSheetSource, SheetSource};
