#![doc = include_str!("../README.md")]
mod error;
mod fetch;
mod livemap;
mod models;
mod parsing;
mod report;

pub use error::{LResult, LivemapError};
pub use fetch::TraininfoClient;
pub use livemap::Livemap;
pub use models::*;
pub use parsing::{
    CellNode, PResult, ParsingError, cell_text, parse_document as parse_timetable_document,
    parse_rows as parse_timetable_rows, timetable_rows,
};
pub use report::{abbreviate_stop_name, delay_minutes, format_report};
