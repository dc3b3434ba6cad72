use thiserror::Error;

pub type PResult<T> = Result<T, ParsingError>;

#[derive(Debug, Error)]
pub enum ParsingError {
    /// The snapshot source reported a failure in-band, as an `error` mapping,
    /// instead of via transport status. The raw payload is attached.
    #[error("Upstream error response: {0}")]
    UpstreamErrorResponse(String),
    /// The snapshot document does not have the expected shape. Covers the
    /// top-level structure as well as slot-count and slot-type violations of
    /// the positional records.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
    /// A class filter token is neither an integer bit value nor a known
    /// class label.
    #[error("Invalid class token: {0:?}")]
    InvalidClassToken(String),
    /// A timetable cell matches neither of the two known upstream shapes.
    /// The raw cell text is attached so a layout change can be diagnosed.
    #[error("Unparsable timetable cell: {0:?}")]
    UnparsableTimetableCell(String),
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
