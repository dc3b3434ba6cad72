/// Here we will define the parsing helper functions shared by the snapshot
/// and train info parsers: text decoding, whitespace normalization and the
/// positional record cursor.
use nom::{
    IResult, Parser,
    character::complete::{char, digit1},
    combinator::recognize,
};
use serde_json::Value;

use crate::parsing::error::{PResult, ParsingError};

/// Decodes the fixed single-byte legacy encoding of the snapshot documents.
/// Every byte maps to the Unicode code point of the same value, so non-ASCII
/// stop names survive without a replacement character.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Collapses every interior whitespace run to a single space and trims both
/// ends. Idempotent, so re-normalizing an already clean name is a no-op.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Recognizes a bare wall-clock value (`H:MM` or `HH:MM`) and keeps it
/// verbatim. No range check is applied; the value is a display token.
pub(crate) fn clock_combinator(input: &str) -> IResult<&str, String> {
    recognize((digit1, char(':'), digit1))
        .map(String::from)
        .parse(input)
}

/// Cursor over one positional record: a JSON array whose fields are
/// identified by index order only, per an externally defined contract.
/// The ordered slot list IS the contract; the only structural validation
/// possible is the slot count, so any count mismatch is rejected instead of
/// being truncated or padded.
pub(crate) struct PositionalRecord<'a> {
    record: &'static str,
    fields: &'static [&'static str],
    values: &'a [Value],
    cursor: usize,
}

impl<'a> PositionalRecord<'a> {
    pub(crate) fn new(
        record: &'static str,
        fields: &'static [&'static str],
        values: &'a [Value],
    ) -> PResult<Self> {
        if values.len() != fields.len() {
            return Err(ParsingError::MalformedSnapshot(format!(
                "{record} record has {} slots, expected {}",
                values.len(),
                fields.len()
            )));
        }
        Ok(Self {
            record,
            fields,
            values,
            cursor: 0,
        })
    }

    fn take(&mut self) -> (&'static str, &'a Value) {
        let values: &'a [Value] = self.values;
        let slot = (self.fields[self.cursor], &values[self.cursor]);
        self.cursor += 1;
        slot
    }

    fn mismatch(&self, field: &'static str, expected: &str, value: &Value) -> ParsingError {
        ParsingError::MalformedSnapshot(format!(
            "{} slot {field:?} is not {expected}: {value}",
            self.record
        ))
    }

    pub(crate) fn string(&mut self) -> PResult<String> {
        let (field, value) = self.take();
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| self.mismatch(field, "a string", value))
    }

    pub(crate) fn f64(&mut self) -> PResult<f64> {
        let (field, value) = self.take();
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(field, "a number", value))
    }

    pub(crate) fn i64(&mut self) -> PResult<i64> {
        let (field, value) = self.take();
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(field, "an integer", value))
    }

    pub(crate) fn u32(&mut self) -> PResult<u32> {
        let (field, value) = self.take();
        value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| self.mismatch(field, "an unsigned integer", value))
    }

    pub(crate) fn array(&mut self) -> PResult<&'a [Value]> {
        let (field, value) = self.take();
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.mismatch(field, "an array", value))
    }
}
