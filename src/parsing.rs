pub(crate) mod error;
mod helpers;
mod markup;
mod snapshot_parser;
mod traininfo_parser;

pub use error::{PResult, ParsingError};
pub use markup::{CellNode, cell_text, timetable_rows};
pub use snapshot_parser::parse as parse_snapshot;
pub use traininfo_parser::{TimetableEntries, parse_document, parse_rows};
