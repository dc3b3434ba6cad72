/// # Live train info parsing
///
/// A per-train timetable page lists one table row per itinerary stop, with
/// five cells: an unused leading cell, the planned times, the stop name,
/// another unused cell, and the prognosis (currently expected) times.
///
/// Two cell shapes are known:
///
/// `
/// planned:    "07:51 (ank.)"                  arrival only
///             "08:00 (afg.)"                  departure only
///             "07:51 (ank.)\n08:00 (afg.)"    both
/// prognosis:  ""                              no prognosis
///             "ca. 07:53\nca. 08:02"          either line may be absent
/// `
///
/// A cell matching neither shape means the upstream layout has drifted, and
/// guessing at its meaning would risk reporting wrong delays: the row fails
/// with the raw cell text attached instead of recovering. A prognosis equal
/// to the partial-cancellation marker short-circuits the row into a
/// sentinel entry before any time parsing.
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map, opt},
    sequence::{preceded, terminated},
};

use crate::{
    models::TimetableEntry,
    parsing::{
        error::{PResult, ParsingError},
        helpers::clock_combinator,
        markup::{CellNode, cell_text, timetable_rows},
    },
};

/// Prognosis texts upstream uses for a partially cancelled stop. The second
/// variant is the same phrase doubled by an upstream formatting bug; it
/// appears verbatim in live data and is matched as-is rather than
/// normalized away.
const PARTIAL_CANCELLATION_MARKERS: [&str; 2] = ["delvist aflyst", "delvist aflystdelvist aflyst"];

fn planned_combinator(input: &str) -> IResult<&str, (Option<String>, Option<String>)> {
    map(
        (
            opt(terminated(clock_combinator, tag(" (ank.)"))),
            opt(char('\n')),
            opt(terminated(clock_combinator, tag(" (afg.)"))),
        ),
        |(arrival, _, departure)| (arrival, departure),
    )
    .parse(input)
}

fn prognosis_combinator(input: &str) -> IResult<&str, (Option<String>, Option<String>)> {
    map(
        // The line break is mandatory inside the group: a one-line
        // prognosis is not a known shape.
        opt((
            opt(preceded(tag("ca. "), clock_combinator)),
            char('\n'),
            opt(preceded(tag("ca. "), clock_combinator)),
        )),
        |group| match group {
            Some((arrival, _, departure)) => (arrival, departure),
            None => (None, None),
        },
    )
    .parse(input)
}

fn parse_planned(text: &str) -> PResult<(Option<String>, Option<String>)> {
    all_consuming(planned_combinator)
        .parse(text)
        .map(|(_, times)| times)
        .map_err(|_| ParsingError::UnparsableTimetableCell(text.to_string()))
}

fn parse_prognosis(text: &str) -> PResult<(Option<String>, Option<String>)> {
    all_consuming(prognosis_combinator)
        .parse(text)
        .map(|(_, times)| times)
        .map_err(|_| ParsingError::UnparsableTimetableCell(text.to_string()))
}

fn parse_row(cells: &[CellNode]) -> PResult<Option<TimetableEntry>> {
    let [_, planned, name, _, prognosis] = cells else {
        // Timetable rows have exactly five cells; anything else is not a
        // timetable row.
        return Ok(None);
    };
    let planned = cell_text(planned);
    let name = cell_text(name);
    let prognosis = cell_text(prognosis);

    if PARTIAL_CANCELLATION_MARKERS.contains(&prognosis.as_str()) {
        return Ok(Some(TimetableEntry::partially_cancelled(name)));
    }
    if planned.is_empty() {
        // Decorative row without a planned stop.
        return Ok(None);
    }

    let (planned_arrival, planned_departure) = parse_planned(&planned)?;
    let (actual_arrival, actual_departure) = parse_prognosis(&prognosis)?;
    Ok(Some(TimetableEntry::new(
        name,
        planned_arrival,
        actual_arrival,
        planned_departure,
        actual_departure,
    )))
}

// ------------------------------------------------------------------------------------------------
// --- TimetableEntries
// ------------------------------------------------------------------------------------------------

/// Lazy sequence of timetable entries scanned out of table rows. Finite and
/// not restartable: the underlying rows are consumed once, and a fatal row
/// error fuses the sequence, so a caller that keeps polling after an error
/// sees the end of the itinerary rather than misparsed tail rows.
pub struct TimetableEntries<I> {
    rows: I,
    failed: bool,
}

impl<I> Iterator for TimetableEntries<I>
where
    I: Iterator<Item = Vec<CellNode>>,
{
    type Item = PResult<TimetableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for row in self.rows.by_ref() {
            match parse_row(&row) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
        None
    }
}

/// Parses timetable entries out of pre-extracted rows, lazily.
pub fn parse_rows<I>(rows: I) -> TimetableEntries<I::IntoIter>
where
    I: IntoIterator<Item = Vec<CellNode>>,
{
    TimetableEntries {
        rows: rows.into_iter(),
        failed: false,
    }
}

/// Parses the timetable entries of a live train info page, lazily. A caller
/// interested in the first stops only can stop early without materializing
/// the whole itinerary.
pub fn parse_document(document: &str) -> TimetableEntries<std::vec::IntoIter<Vec<CellNode>>> {
    log::info!("Parsing live train info page...");
    parse_rows(timetable_rows(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_TIME;
    use crate::parsing::markup::parse_cell;
    use pretty_assertions::assert_eq;

    fn row(planned: &str, name: &str, prognosis: &str) -> Vec<CellNode> {
        vec![
            CellNode::default(),
            parse_cell(planned),
            CellNode::inline(name),
            CellNode::default(),
            parse_cell(prognosis),
        ]
    }

    #[test]
    fn test_row_with_both_pairs() {
        let entry = parse_row(&row(
            "07:51 (ank.)<br>08:00 (afg.)",
            "Fredericia St.",
            "ca. 07:53<br>ca. 08:02",
        ))
        .unwrap()
        .unwrap();
        assert_eq!(entry.name(), "Fredericia St.");
        assert_eq!(entry.planned_arrival(), Some("07:51"));
        assert_eq!(entry.planned_departure(), Some("08:00"));
        assert_eq!(entry.actual_arrival(), Some("07:53"));
        assert_eq!(entry.actual_departure(), Some("08:02"));
    }

    #[test]
    fn test_row_with_arrival_only() {
        let entry = parse_row(&row("21:05 (ank.)", "København H", ""))
            .unwrap()
            .unwrap();
        assert_eq!(entry.planned_arrival(), Some("21:05"));
        assert_eq!(entry.planned_departure(), None);
        assert_eq!(entry.actual_arrival(), None);
        assert_eq!(entry.actual_departure(), None);
    }

    #[test]
    fn test_row_with_departure_only() {
        let entry = parse_row(&row("8:00 (afg.)", "Struer", "<br>ca. 8:02"))
            .unwrap()
            .unwrap();
        assert_eq!(entry.planned_arrival(), None);
        assert_eq!(entry.planned_departure(), Some("8:00"));
        assert_eq!(entry.actual_arrival(), None);
        assert_eq!(entry.actual_departure(), Some("8:02"));
    }

    #[test]
    fn test_partial_cancellation_yields_sentinel_without_time_parsing() {
        for marker in PARTIAL_CANCELLATION_MARKERS {
            // The planned cell would not parse; the marker short-circuits
            // before it is looked at.
            let entry = parse_row(&row("not a time", "Langå", marker))
                .unwrap()
                .unwrap();
            assert_eq!(entry.name(), "Langå");
            assert_eq!(entry.planned_arrival(), Some(UNKNOWN_TIME));
            assert_eq!(entry.actual_arrival(), Some(UNKNOWN_TIME));
            assert_eq!(entry.planned_departure(), Some(UNKNOWN_TIME));
            assert_eq!(entry.actual_departure(), Some(UNKNOWN_TIME));
        }
    }

    #[test]
    fn test_row_without_planned_times_is_skipped() {
        assert_eq!(parse_row(&row("", "Middelfart", "")).unwrap(), None);
    }

    #[test]
    fn test_planned_without_marker_is_fatal() {
        match parse_row(&row("07:51", "Vejle", "")) {
            Err(ParsingError::UnparsableTimetableCell(text)) => assert_eq!(text, "07:51"),
            other => panic!("Expected UnparsableTimetableCell, got {other:?}"),
        }
    }

    #[test]
    fn test_one_line_prognosis_is_fatal() {
        match parse_row(&row("07:51 (ank.)", "Vejle", "ca. 07:53")) {
            Err(ParsingError::UnparsableTimetableCell(text)) => assert_eq!(text, "ca. 07:53"),
            other => panic!("Expected UnparsableTimetableCell, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_fuses_after_a_fatal_row() {
        let rows = vec![
            row("broken", "Vejle", ""),
            row("08:00 (afg.)", "Horsens", ""),
        ];
        let mut entries = parse_rows(rows);
        assert!(matches!(
            entries.next(),
            Some(Err(ParsingError::UnparsableTimetableCell(_)))
        ));
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_parse_document_end_to_end() {
        let page = "
            <html><body><table>
            <tr><td></td><td></td><td>Esbjerg</td><td></td><td></td></tr>
            <tr><td>1</td><td>07:51 (ank.)<br/>08:00 (afg.)</td><td>Fredericia</td><td></td>
                <td>ca. 07:53<br/>ca. 08:02</td></tr>
            </table></body></html>";
        let entries: Vec<_> = parse_document(page).collect::<PResult<_>>().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "Fredericia");
        assert_eq!(entries[0].actual_departure(), Some("08:02"));
    }
}
