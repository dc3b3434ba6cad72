use std::{collections::BTreeSet, str::FromStr};

use serde::{Deserialize, Serialize};
use strum_macros::{self, Display, EnumString};

use crate::parsing::error::{PResult, ParsingError};

/// Scale between the raw projected snapshot coordinates and degrees.
const COORDINATE_SCALE: f64 = 1e6;

/// Marker value used for the time fields of a partially cancelled stop.
pub const UNKNOWN_TIME: &str = "XX:XX";

// ------------------------------------------------------------------------------------------------
// --- TrainClass
// ------------------------------------------------------------------------------------------------

/// Service tier of a train, as reported in the snapshot's `class` slot.
///
/// The discriminants are the upstream bit values; the labels are the ones the
/// official front end uses. The mapping is a bijection over these five
/// entries. `Other` covers cross-country trains, local railways and rail
/// replacement buses.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, EnumString, Serialize, Deserialize)]
pub enum TrainClass {
    #[strum(serialize = "IC")]
    InterCity = 1,
    #[strum(serialize = "ICL")]
    InterCityLyn = 2,
    #[strum(serialize = "regional")]
    Regional = 4,
    #[strum(serialize = "other")]
    Other = 8,
    #[strum(serialize = "S")]
    STrain = 16,
}

impl TrainClass {
    pub fn bit(self) -> u32 {
        self as u32
    }

    pub fn from_bit(bit: u32) -> Option<Self> {
        match bit {
            1 => Some(TrainClass::InterCity),
            2 => Some(TrainClass::InterCityLyn),
            4 => Some(TrainClass::Regional),
            8 => Some(TrainClass::Other),
            16 => Some(TrainClass::STrain),
            _ => None,
        }
    }

    /// Parses a comma-separated class filter mixing labels and raw bit
    /// values. Each token is first attempted as an integer and only then
    /// looked up as a label, so a bare bitmask value always passes through.
    pub fn parse_filter(input: &str) -> PResult<BTreeSet<u32>> {
        input
            .split(',')
            .map(|token| {
                token
                    .parse::<u32>()
                    .ok()
                    .or_else(|| TrainClass::from_str(token).ok().map(TrainClass::bit))
                    .ok_or_else(|| ParsingError::InvalidClassToken(token.to_string()))
            })
            .collect()
    }

    /// Filter applied when the caller does not supply one: long-distance
    /// trains only.
    pub fn default_filter() -> BTreeSet<u32> {
        BTreeSet::from([TrainClass::InterCity.bit(), TrainClass::InterCityLyn.bit()])
    }
}

// ------------------------------------------------------------------------------------------------
// --- Meta
// ------------------------------------------------------------------------------------------------

/// Snapshot-wide metadata, taken from the trailing record of the train
/// array. Only the timestamp, update interval and step slots are trusted;
/// the remaining slots (a count estimate and a version/date pair) have no
/// guaranteed meaning upstream and are not modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    timestamp: String,
    interval: i64,
    step: i64,
}

impl Meta {
    pub fn new(timestamp: String, interval: i64, step: i64) -> Self {
        Self {
            timestamp,
            interval,
            step,
        }
    }

    // Getters/Setters

    /// Opaque upstream clock token; not reparsed.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn step(&self) -> i64 {
        self.step
    }
}

// ------------------------------------------------------------------------------------------------
// --- Polyline
// ------------------------------------------------------------------------------------------------

/// Current path segment of a train. All slots are opaque numeric
/// pass-through values; the speed and direction units are unconfirmed
/// upstream and nothing here depends on their interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    x: f64,
    y: f64,
    time: f64,
    direction: f64,
    speed: f64,
}

impl Polyline {
    pub fn new(x: f64, y: f64, time: f64, direction: f64, speed: f64) -> Self {
        Self {
            x,
            y,
            time,
            direction,
            speed,
        }
    }

    // Getters/Setters

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}

// ------------------------------------------------------------------------------------------------
// --- TrainSnapshot
// ------------------------------------------------------------------------------------------------

/// One train as present in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSnapshot {
    name: String,
    x: f64,
    y: f64,
    id: String,
    direction: i64,
    class: u32,
    delay: i64,
    lstopname: String,
    poly: Polyline,
    prevstop: String,
    prevstopno: i64,
    nextstop: String,
    nextstopno: i64,
    refdate: String,
}

impl TrainSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        x: f64,
        y: f64,
        id: String,
        direction: i64,
        class: u32,
        delay: i64,
        lstopname: String,
        poly: Polyline,
        prevstop: String,
        prevstopno: i64,
        nextstop: String,
        nextstopno: i64,
        refdate: String,
    ) -> Self {
        Self {
            name,
            x,
            y,
            id,
            direction,
            class,
            delay,
            lstopname,
            poly,
            prevstop,
            prevstopno,
            nextstop,
            nextstopno,
            refdate,
        }
    }

    // Getters/Setters

    /// Whitespace-normalized display name. May contain several tokens, such
    /// as a line code and a train number.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Projected x coordinate, in raw snapshot units.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Projected y coordinate, in raw snapshot units.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Opaque identifier used to build the live train info URL. May contain
    /// slashes.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn direction(&self) -> i64 {
        self.direction
    }

    /// Class bit value; exactly one bit set, see [`TrainClass`].
    pub fn class(&self) -> u32 {
        self.class
    }

    /// Upstream-reported delay. Units unconfirmed; passed through as-is.
    pub fn delay(&self) -> i64 {
        self.delay
    }

    /// Destination stop name.
    pub fn lstopname(&self) -> &str {
        &self.lstopname
    }

    pub fn poly(&self) -> &Polyline {
        &self.poly
    }

    pub fn prevstop(&self) -> &str {
        &self.prevstop
    }

    pub fn prevstopno(&self) -> i64 {
        self.prevstopno
    }

    pub fn nextstop(&self) -> &str {
        &self.nextstop
    }

    pub fn nextstopno(&self) -> i64 {
        self.nextstopno
    }

    /// Date token required to query the live train info for this train.
    pub fn refdate(&self) -> &str {
        &self.refdate
    }

    /// Position in degrees, for consumers that reproject the raw projected
    /// units.
    pub fn position_degrees(&self) -> (f64, f64) {
        (self.x / COORDINATE_SCALE, self.y / COORDINATE_SCALE)
    }
}

// ------------------------------------------------------------------------------------------------
// --- TimetableEntry
// ------------------------------------------------------------------------------------------------

/// One stop of a train's itinerary, as shown on the live train info page.
///
/// Every time field is either a bare `H:MM`/`HH:MM` wall-clock string or
/// absent. No date or zone is attached: an actual time is only meaningful in
/// comparison with the planned time of the same field pair, on the same
/// clock and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    name: String,
    planned_arrival: Option<String>,
    actual_arrival: Option<String>,
    planned_departure: Option<String>,
    actual_departure: Option<String>,
}

impl TimetableEntry {
    pub fn new(
        name: String,
        planned_arrival: Option<String>,
        actual_arrival: Option<String>,
        planned_departure: Option<String>,
        actual_departure: Option<String>,
    ) -> Self {
        Self {
            name,
            planned_arrival,
            actual_arrival,
            planned_departure,
            actual_departure,
        }
    }

    /// Entry for a stop upstream marks as partially cancelled. All four time
    /// fields carry the [`UNKNOWN_TIME`] marker instead of parsed times.
    pub fn partially_cancelled(name: String) -> Self {
        Self {
            name,
            planned_arrival: Some(UNKNOWN_TIME.to_string()),
            actual_arrival: Some(UNKNOWN_TIME.to_string()),
            planned_departure: Some(UNKNOWN_TIME.to_string()),
            actual_departure: Some(UNKNOWN_TIME.to_string()),
        }
    }

    // Getters/Setters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn planned_arrival(&self) -> Option<&str> {
        self.planned_arrival.as_deref()
    }

    pub fn actual_arrival(&self) -> Option<&str> {
        self.actual_arrival.as_deref()
    }

    pub fn planned_departure(&self) -> Option<&str> {
        self.planned_departure.as_deref()
    }

    pub fn actual_departure(&self) -> Option<&str> {
        self.actual_departure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn class_bits_round_trip_through_labels() {
        for class in [
            TrainClass::InterCity,
            TrainClass::InterCityLyn,
            TrainClass::Regional,
            TrainClass::Other,
            TrainClass::STrain,
        ] {
            let label = class.to_string();
            assert_eq!(TrainClass::from_str(&label).unwrap(), class);
            assert_eq!(TrainClass::from_bit(class.bit()), Some(class));
        }
    }

    #[test]
    fn class_labels_match_front_end() {
        assert_eq!(TrainClass::InterCity.to_string(), "IC");
        assert_eq!(TrainClass::InterCityLyn.to_string(), "ICL");
        assert_eq!(TrainClass::Regional.to_string(), "regional");
        assert_eq!(TrainClass::Other.to_string(), "other");
        assert_eq!(TrainClass::STrain.to_string(), "S");
    }

    #[test]
    fn unmapped_bit_has_no_class() {
        assert_eq!(TrainClass::from_bit(3), None);
        assert_eq!(TrainClass::from_bit(32), None);
    }

    #[test]
    fn filter_accepts_labels_and_bit_values() {
        let filter = TrainClass::parse_filter("IC,4").unwrap();
        assert_eq!(filter, BTreeSet::from([1, 4]));
    }

    #[test]
    fn filter_keeps_unmapped_integers() {
        let filter = TrainClass::parse_filter("7,S").unwrap();
        assert_eq!(filter, BTreeSet::from([7, 16]));
    }

    #[test]
    fn filter_rejects_unknown_labels() {
        match TrainClass::parse_filter("bogus") {
            Err(ParsingError::InvalidClassToken(token)) => assert_eq!(token, "bogus"),
            other => panic!("Expected InvalidClassToken, got {other:?}"),
        }
    }

    #[test]
    fn default_filter_is_long_distance() {
        assert_eq!(TrainClass::default_filter(), BTreeSet::from([1, 2]));
    }

    #[test]
    fn partially_cancelled_entry_carries_the_marker() {
        let entry = TimetableEntry::partially_cancelled("Langå".to_string());
        assert_eq!(entry.name(), "Langå");
        assert_eq!(entry.planned_arrival(), Some(UNKNOWN_TIME));
        assert_eq!(entry.actual_arrival(), Some(UNKNOWN_TIME));
        assert_eq!(entry.planned_departure(), Some(UNKNOWN_TIME));
        assert_eq!(entry.actual_departure(), Some(UNKNOWN_TIME));
    }

    #[test]
    fn position_converts_to_degrees() {
        let train = TrainSnapshot::new(
            "IC 104".to_string(),
            9_540_000.0,
            55_710_000.0,
            "84/123".to_string(),
            90,
            1,
            0,
            "København H".to_string(),
            Polyline::new(0.0, 0.0, 0.0, 0.0, 0.0),
            "Odense".to_string(),
            12,
            "Nyborg".to_string(),
            13,
            "08.08.26".to_string(),
        );
        assert_eq!(train.position_degrees(), (9.54, 55.71));
    }
}
