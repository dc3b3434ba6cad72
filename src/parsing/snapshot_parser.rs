/// # Live map snapshot parsing
///
/// One snapshot document describes the position of every train on the
/// network at a moment in time. The document is latin-1 encoded JSON whose
/// top-level value is a two-element array:
///
/// - a train array, whose trailing element is a metadata record,
/// - a stop array, which is accepted but has no consumer here.
///
/// All records are positional: fields are identified by array index order
/// only. A train record has 14 slots, its 9th slot being a nested 5-slot
/// polyline record:
///
/// `
/// ...
/// ["IC  104",9540120,55712300,"84/246182/18/52/86",270,1,0,"København H",
///  [9540300,55712400,120,270,140],"Odense",12,"Nyborg",13,"08.08.26"],
/// ...
/// ["08.08.26 18:07:24",158,20000,5,"5.40"]
/// `
///
/// Of the metadata record only the timestamp, interval and step slots are
/// trusted. The slot between timestamp and interval looks like a train
/// count, and the official front end claims a trailing date slot exists, but
/// neither is used there and the server does not always send them.
///
/// Upstream errors arrive in-band: instead of the array pair the document is
/// a mapping with an `error` key, and must be surfaced as such rather than
/// as a shape violation.
use serde_json::{Value, json};

use crate::{
    models::{Meta, Polyline, TrainSnapshot},
    parsing::{
        error::{PResult, ParsingError},
        helpers::{PositionalRecord, decode_latin1, normalize_whitespace},
    },
};

/// Slot order of one train record. This list is the whole field contract:
/// upstream reordering cannot be detected beyond the slot count.
const TRAIN_FIELDS: [&str; 14] = [
    "name",
    "x",
    "y",
    "id",
    "direction",
    "class",
    "delay",
    "lstopname",
    "poly",
    "prevstop",
    "prevstopno",
    "nextstop",
    "nextstopno",
    "refdate",
];

/// Slot order of the polyline record nested in a train's `poly` slot.
const POLYLINE_FIELDS: [&str; 5] = ["x", "y", "time", "direction", "speed"];

/// Leading metadata slots with a guaranteed meaning.
const META_TRUSTED_SLOTS: usize = 4;

fn malformed(message: impl Into<String>) -> ParsingError {
    ParsingError::MalformedSnapshot(message.into())
}

pub fn parse(bytes: &[u8]) -> PResult<(Meta, Vec<TrainSnapshot>)> {
    log::info!("Parsing live map snapshot...");
    let document: Value = serde_json::from_str(&decode_latin1(bytes))?;

    if let Value::Object(mapping) = &document {
        if mapping.contains_key("error") {
            return Err(ParsingError::UpstreamErrorResponse(document.to_string()));
        }
    }

    let Value::Array(top) = document else {
        return Err(malformed(
            "top-level value is neither an array pair nor an error mapping",
        ));
    };
    let [trains, stops] = top.as_slice() else {
        return Err(malformed(format!(
            "top-level array has {} elements, expected 2",
            top.len()
        )));
    };
    let trains = trains
        .as_array()
        .ok_or_else(|| malformed("train array is not an array"))?;
    if !stops.is_array() {
        return Err(malformed("stop array is not an array"));
    }

    let (meta_values, train_values) = trains
        .split_last()
        .ok_or_else(|| malformed("train array is empty, expected a trailing metadata record"))?;
    let meta = parse_meta(meta_values)?;
    let trains = train_values
        .iter()
        .map(parse_train)
        .collect::<PResult<Vec<_>>>()?;

    log::info!("Decoded {} trains", trains.len());
    Ok((meta, trains))
}

fn parse_meta(value: &Value) -> PResult<Meta> {
    let values = value
        .as_array()
        .ok_or_else(|| malformed("metadata record is not an array"))?;
    if values.len() < META_TRUSTED_SLOTS {
        return Err(malformed(format!(
            "metadata record has {} slots, expected at least {META_TRUSTED_SLOTS}",
            values.len()
        )));
    }
    let timestamp = values[0]
        .as_str()
        .ok_or_else(|| malformed(format!("metadata timestamp is not a string: {}", values[0])))?
        .to_string();
    // values[1] (count estimate) and values[4..] (version/date) have no
    // guaranteed meaning upstream and stay unread.
    let interval = values[2]
        .as_i64()
        .ok_or_else(|| malformed(format!("metadata interval is not an integer: {}", values[2])))?;
    let step = values[3]
        .as_i64()
        .ok_or_else(|| malformed(format!("metadata step is not an integer: {}", values[3])))?;
    Ok(Meta::new(timestamp, interval, step))
}

fn parse_train(value: &Value) -> PResult<TrainSnapshot> {
    let values = value
        .as_array()
        .ok_or_else(|| malformed(format!("train record is not an array: {value}")))?;
    let mut record = PositionalRecord::new("train", &TRAIN_FIELDS, values)?;

    let name = normalize_whitespace(&record.string()?);
    let x = record.f64()?;
    let y = record.f64()?;
    let id = record.string()?;
    let direction = record.i64()?;
    let class = record.u32()?;
    let delay = record.i64()?;
    let lstopname = record.string()?;
    let poly = parse_polyline(record.array()?)?;
    let prevstop = record.string()?;
    let prevstopno = record.i64()?;
    let nextstop = record.string()?;
    let nextstopno = record.i64()?;
    let refdate = record.string()?;

    Ok(TrainSnapshot::new(
        name, x, y, id, direction, class, delay, lstopname, poly, prevstop, prevstopno, nextstop,
        nextstopno, refdate,
    ))
}

fn parse_polyline(values: &[Value]) -> PResult<Polyline> {
    let mut record = PositionalRecord::new("polyline", &POLYLINE_FIELDS, values)?;
    let x = record.f64()?;
    let y = record.f64()?;
    let time = record.f64()?;
    let direction = record.f64()?;
    let speed = record.f64()?;
    Ok(Polyline::new(x, y, time, direction, speed))
}

/// Re-encodes a train into its positional form. Inverse of [`parse_train`]
/// over the slot list; pins the field order contract in both directions.
#[allow(unused)]
pub(crate) fn train_to_positional(train: &TrainSnapshot) -> Value {
    json!([
        train.name(),
        train.x(),
        train.y(),
        train.id(),
        train.direction(),
        train.class(),
        train.delay(),
        train.lstopname(),
        [
            train.poly().x(),
            train.poly().y(),
            train.poly().time(),
            train.poly().direction(),
            train.poly().speed(),
        ],
        train.prevstop(),
        train.prevstopno(),
        train.nextstop(),
        train.nextstopno(),
        train.refdate(),
    ])
}
