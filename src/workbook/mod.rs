//! @acp:module "Workbook"
//! @acp:summary "Loading, caching and header detection for curated spreadsheet banks"
//! @acp:domain workbook
//! @acp:layer io

pub mod header;
pub mod loader;
pub mod locator;
pub mod science;
pub mod table;

pub use header::{detect_header_row, HeaderDetector};
pub use loader::{SheetLayout, WorkbookCache};
pub use locator::{BankRef, Curriculum, Subject, WorkbookLocator};
pub use science::{detect_sheets, load_science_table, DetectedSheet};
pub use table::{Cell, Table};
