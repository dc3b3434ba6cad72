/// # Delay report formatting
///
/// Renders the reconciled timetable as a fixed-width console table: a
/// header line, then one line per stop carrying the arrival time pair, the
/// departure time pair and the stop name. A time upstream replaced is shown
/// struck through next to the bold expected time; identical planned and
/// expected times are still rendered as a pair, which keeps "confirmed on
/// time" visually distinct from "no prognosis yet".
use std::sync::LazyLock;

use regex::Regex;

use crate::models::TimetableEntry;

const TIME_WIDTH: usize = 5;

const STRIKETHROUGH: &str = "\x1B[9m";
const BOLD: &str = "\x1B[1m";
const RESET: &str = "\x1B[0m";

/// Planned/expected arrival, planned/expected departure.
const HEADER: &str = " STA   ETA   STD   ETD";

static TRAILING_ST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" St\.$").unwrap());
static TRAILING_JYLLAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" \(Jylland\)$").unwrap());

/// Shortens a station name for display: a trailing " St." is dropped and a
/// trailing " (Jylland)" qualifier becomes " J".
pub fn abbreviate_stop_name(name: &str) -> String {
    let name = TRAILING_ST.replace(name, "");
    let name = TRAILING_JYLLAND.replace(&name, " J");
    name.into_owned()
}

fn clock_to_minutes(value: &str) -> Option<i64> {
    let (hour, minute) = value.split_once(':')?;
    Some(hour.parse::<i64>().ok()? * 60 + minute.parse::<i64>().ok()?)
}

/// Delay in minutes between a planned and an expected time, as plain
/// same-day clock arithmetic. No day-rollover correction is applied: a
/// delay crossing midnight yields a large negative value.
pub fn delay_minutes(planned: &str, actual: &str) -> Option<i64> {
    Some(clock_to_minutes(actual)? - clock_to_minutes(planned)?)
}

/// One fixed-width report field holding a planned time and, when upstream
/// published one, the currently expected time next to it.
fn format_time_pair(planned: Option<&str>, actual: Option<&str>) -> String {
    let Some(planned) = planned else {
        return " ".repeat(2 * TIME_WIDTH + 1);
    };
    let Some(actual) = actual else {
        return format!("{planned:>TIME_WIDTH$}{}", " ".repeat(TIME_WIDTH + 1));
    };
    format!("{STRIKETHROUGH}{planned:>TIME_WIDTH$}{RESET} {BOLD}{actual:>TIME_WIDTH$}{RESET}")
}

/// The abbreviated stop name, with the arrival delay appended when planned
/// and expected arrival both exist and differ.
fn format_stop_name(name: &str, planned: Option<&str>, actual: Option<&str>) -> String {
    let abbreviated = abbreviate_stop_name(name);
    match (planned, actual) {
        (Some(planned), Some(actual)) if planned != actual => {
            match delay_minutes(planned, actual) {
                Some(delay) => format!("{abbreviated} (+{delay})"),
                None => abbreviated,
            }
        }
        _ => abbreviated,
    }
}

/// Renders the whole report: the header line, then one line per stop.
pub fn format_report<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = TimetableEntry>,
{
    let mut lines = vec![HEADER.to_string()];
    for entry in entries {
        lines.push(format!(
            "{} {} {}",
            format_time_pair(entry.planned_arrival(), entry.actual_arrival()),
            format_time_pair(entry.planned_departure(), entry.actual_departure()),
            format_stop_name(entry.name(), entry.planned_arrival(), entry.actual_arrival()),
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delay_between_planned_and_expected() {
        assert_eq!(delay_minutes("08:00", "08:02"), Some(2));
        assert_eq!(delay_minutes("7:51", "8:03"), Some(12));
        assert_eq!(delay_minutes("08:05", "08:00"), Some(-5));
    }

    #[test]
    fn test_delay_crossing_midnight_stays_uncorrected() {
        assert_eq!(delay_minutes("23:58", "00:01"), Some(-1437));
    }

    #[test]
    fn test_delay_of_unknown_time_markers_is_undefined() {
        assert_eq!(delay_minutes("XX:XX", "08:00"), None);
        assert_eq!(delay_minutes("08:00", "XX:XX"), None);
    }

    #[test]
    fn test_abbreviation_rules() {
        assert_eq!(abbreviate_stop_name("Fredericia St."), "Fredericia");
        assert_eq!(
            abbreviate_stop_name("Skanderborg (Jylland)"),
            "Skanderborg J"
        );
        assert_eq!(abbreviate_stop_name("København H"), "København H");
    }

    #[test]
    fn test_time_pair_without_planned_time_is_blank() {
        assert_eq!(format_time_pair(None, None), "           ");
        assert_eq!(format_time_pair(None, Some("08:02")), "           ");
    }

    #[test]
    fn test_time_pair_without_prognosis_shows_planned_only() {
        assert_eq!(format_time_pair(Some("07:51"), None), "07:51      ");
        assert_eq!(format_time_pair(Some("7:51"), None), " 7:51      ");
    }

    #[test]
    fn test_time_pair_with_prognosis_strikes_the_planned_time() {
        assert_eq!(
            format_time_pair(Some("07:51"), Some("07:53")),
            "\x1B[9m07:51\x1B[0m \x1B[1m07:53\x1B[0m"
        );
        // An on-time confirmation still renders both copies.
        assert_eq!(
            format_time_pair(Some("07:51"), Some("07:51")),
            "\x1B[9m07:51\x1B[0m \x1B[1m07:51\x1B[0m"
        );
    }

    #[test]
    fn test_stop_name_carries_the_arrival_delay() {
        assert_eq!(
            format_stop_name("Fredericia St.", Some("07:51"), Some("07:53")),
            "Fredericia (+2)"
        );
        assert_eq!(
            format_stop_name("Fredericia St.", Some("07:51"), Some("07:51")),
            "Fredericia"
        );
        assert_eq!(format_stop_name("Fredericia St.", Some("07:51"), None), "Fredericia");
        // Negative delays keep the "+" prefix of the format.
        assert_eq!(
            format_stop_name("Vejle", Some("08:10"), Some("08:05")),
            "Vejle (+-5)"
        );
    }

    #[test]
    fn test_report_layout() {
        let entries = vec![
            TimetableEntry::new(
                "Fredericia St.".to_string(),
                Some("07:51".to_string()),
                Some("07:53".to_string()),
                Some("08:00".to_string()),
                Some("08:02".to_string()),
            ),
            TimetableEntry::new(
                "Vejle".to_string(),
                None,
                None,
                Some("08:21".to_string()),
                None,
            ),
        ];
        let lines = format_report(entries);
        assert_eq!(
            lines,
            vec![
                " STA   ETA   STD   ETD".to_string(),
                "\x1B[9m07:51\x1B[0m \x1B[1m07:53\x1B[0m \x1B[9m08:00\x1B[0m \x1B[1m08:02\x1B[0m Fredericia (+2)"
                    .to_string(),
                "            08:21       Vejle".to_string(),
            ]
        );
    }
}
