//! iCalendar writer for merged day ranges
//!
//! Every [`DateRange`] becomes one all-day `VEVENT`. `DTEND` is exclusive:
//! a range ending on `D` is written with `DTEND` = `D + 1`.
//!
//! ## Example
//!
//! ```
//! use prodcal_calendar::{aggregate_ranges, Annotation, AnnotationMap, CalendarHeader, IcsWriter, SequentialUid};
//!
//! let days = AnnotationMap::from_raw([
//!     ("2026-01-01", Annotation::holiday("Новогодние каникулы")),
//!     ("2026-01-02", Annotation::holiday("Новогодние каникулы")),
//! ])?;
//! let writer = IcsWriter::new(CalendarHeader::for_year(2026));
//! let text = writer.render(&aggregate_ranges(&days), &mut SequentialUid::new())?;
//! assert!(text.contains("DTSTART;VALUE=DATE:20260101\nDTEND;VALUE=DATE:20260103\n"));
//! # Ok::<(), prodcal_calendar::CalendarError>(())
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate_ranges;
use crate::error::{CalendarError, Result};
use crate::model::{AnnotationMap, CalendarEvent, DateKey, DateRange};
use crate::template::{dedent, escape_text, fold_lines, unescape_text};
use crate::uid::UidGenerator;

/// Default product identifier (PRODID)
pub const DEFAULT_PROD_ID: &str = "-//prodcal//Production Calendar//RU";

/// Default calendar display name
pub const DEFAULT_CALENDAR_NAME: &str = "Производственный календарь";

const FOOTER: &str = "END:VCALENDAR\n";

/// Calendar-level properties written before the events
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarHeader {
    /// Product identifier (PRODID)
    pub prod_id: String,

    /// Display name (X-WR-CALNAME and NAME)
    pub name: String,
}

impl Default for CalendarHeader {
    fn default() -> Self {
        Self {
            prod_id: DEFAULT_PROD_ID.to_string(),
            name: DEFAULT_CALENDAR_NAME.to_string(),
        }
    }
}

impl CalendarHeader {
    /// Default header with the year appended to the display name
    #[must_use]
    pub fn for_year(year: i32) -> Self {
        Self {
            name: format!("{DEFAULT_CALENDAR_NAME} {year}"),
            ..Self::default()
        }
    }
}

/// Output options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IcsOptions {
    /// Fold content lines longer than 75 octets
    pub fold_lines: bool,
}

/// Serializes ordered ranges into one iCalendar document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcsWriter {
    header: CalendarHeader,
    options: IcsOptions,
}

impl IcsWriter {
    #[must_use]
    pub fn new(header: CalendarHeader) -> Self {
        Self {
            header,
            options: IcsOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: IcsOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn header(&self) -> &CalendarHeader {
        &self.header
    }

    /// Derive one event per range, drawing UIDs from `uids`
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::EmptyUid` or `CalendarError::DuplicateUid` if
    /// the generator misbehaves, and `CalendarError::DateOutOfRange` if a
    /// range ends on the last representable day.
    pub fn events<G: UidGenerator>(
        &self,
        ranges: &[DateRange],
        uids: &mut G,
    ) -> Result<Vec<CalendarEvent>> {
        let mut seen = HashSet::with_capacity(ranges.len());
        ranges
            .iter()
            .map(|range| {
                let uid = uids.next_uid();
                if uid.is_empty() {
                    return Err(CalendarError::EmptyUid);
                }
                if !seen.insert(uid.clone()) {
                    return Err(CalendarError::DuplicateUid(uid));
                }
                CalendarEvent::from_range(range, uid)
            })
            .collect()
    }

    /// Render the complete document
    ///
    /// Events appear in the order of `ranges`. With a deterministic `uids`
    /// the output is byte-for-byte reproducible.
    ///
    /// # Errors
    ///
    /// See [`IcsWriter::events`].
    pub fn render<G: UidGenerator>(&self, ranges: &[DateRange], uids: &mut G) -> Result<String> {
        let events = self.events(ranges, uids)?;

        let mut document = self.header_block();
        for event in &events {
            document.push_str(&event_block(event));
        }
        document.push_str(FOOTER);

        log::debug!("Rendered calendar with {} events", events.len());

        if self.options.fold_lines {
            Ok(fold_lines(&document))
        } else {
            Ok(document)
        }
    }

    fn header_block(&self) -> String {
        let prod_id = escape_text(&self.header.prod_id);
        let name = escape_text(&self.header.name);
        dedent(&format!(
            "
            BEGIN:VCALENDAR
            VERSION:2.0
            PRODID:{prod_id}
            X-WR-CALNAME:{name}
            NAME:{name}
            "
        ))
    }
}

fn event_block(event: &CalendarEvent) -> String {
    let summary = escape_text(&event.summary);
    let start = event.start_date.compact();
    let end = event.end_date_exclusive.compact();
    let uid = &event.uid;
    dedent(&format!(
        "
        BEGIN:VEVENT
        SUMMARY:{summary}
        DTSTART;VALUE=DATE:{start}
        DTEND;VALUE=DATE:{end}
        UID:{uid}
        END:VEVENT
        "
    ))
}

/// Aggregate `annotations` and render them in one step
///
/// # Errors
///
/// See [`IcsWriter::events`].
pub fn render_calendar<G: UidGenerator>(
    annotations: &AnnotationMap,
    header: &CalendarHeader,
    uids: &mut G,
) -> Result<String> {
    let ranges = aggregate_ranges(annotations);
    IcsWriter::new(header.clone()).render(&ranges, uids)
}

/// Calendar read back from iCalendar text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedCalendar {
    /// Display name (X-WR-CALNAME or NAME)
    pub name: Option<String>,

    /// Product identifier (PRODID)
    pub prod_id: Option<String>,

    /// Calendar version (usually "2.0")
    pub version: Option<String>,

    /// All-day events in document order
    pub events: Vec<ParsedEvent>,
}

/// An all-day `VEVENT` read back from text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEvent {
    /// Unescaped summary
    pub summary: String,

    /// First day (DTSTART)
    pub start: DateKey,

    /// First day after the event (DTEND, or DTSTART + 1 when absent)
    pub end_exclusive: DateKey,

    /// Event unique identifier (UID)
    pub uid: Option<String>,
}

/// Parse calendar text with all-day events
///
/// Unknown properties are ignored. Folded lines are accepted.
///
/// # Errors
///
/// Returns `CalendarError::ParseError` for malformed text or an event
/// without a usable `DTSTART`/`DTEND`.
pub fn parse_document(text: &str) -> Result<ParsedCalendar> {
    let reader = ical::IcalParser::new(text.as_bytes());
    let mut parsed = ParsedCalendar::default();

    for calendar_result in reader {
        let calendar = calendar_result
            .map_err(|e| CalendarError::parse_error(format!("ICS parse error: {e}")))?;

        for property in &calendar.properties {
            match property.name.as_str() {
                "X-WR-CALNAME" | "NAME" => {
                    parsed.name = property.value.as_deref().map(unescape_text);
                }
                "PRODID" => {
                    parsed.prod_id = property.value.as_deref().map(unescape_text);
                }
                "VERSION" => {
                    parsed.version.clone_from(&property.value);
                }
                _ => {}
            }
        }

        for event in &calendar.events {
            parsed.events.push(parse_event(&event.properties)?);
        }
    }

    Ok(parsed)
}

fn parse_event(properties: &[ical::property::Property]) -> Result<ParsedEvent> {
    let mut summary = String::new();
    let mut start = None;
    let mut end = None;
    let mut uid = None;

    for property in properties {
        match property.name.as_str() {
            "SUMMARY" => {
                summary = property.value.as_deref().map(unescape_text).unwrap_or_default();
            }
            "DTSTART" => start = Some(parse_date_value("DTSTART", property.value.as_deref())?),
            "DTEND" => end = Some(parse_date_value("DTEND", property.value.as_deref())?),
            "UID" => {
                uid.clone_from(&property.value);
            }
            _ => {}
        }
    }

    let start = start.ok_or_else(|| {
        CalendarError::parse_error(format!("event '{summary}' has no DTSTART"))
    })?;
    let end_exclusive = match end {
        Some(end) => end,
        None => start.next_day()?,
    };

    Ok(ParsedEvent {
        summary,
        start,
        end_exclusive,
        uid,
    })
}

fn parse_date_value(name: &str, value: Option<&str>) -> Result<DateKey> {
    let value = value.unwrap_or_default();
    // Accept date-times by keeping the date part
    let date = value.get(..8).unwrap_or(value);
    DateKey::from_compact(date)
        .map_err(|e| CalendarError::parse_error(format!("invalid {name} '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, AnnotationKind};
    use crate::uid::{RandomUid, SequentialUid};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str, message: &str) -> DateRange {
        DateRange::new(key(start), key(end), message, AnnotationKind::Holiday).unwrap()
    }

    fn render(ranges: &[DateRange]) -> String {
        IcsWriter::new(CalendarHeader::for_year(2026))
            .render(ranges, &mut SequentialUid::new())
            .unwrap()
    }

    #[test]
    fn test_empty_document() {
        let text = render(&[]);
        assert_eq!(
            text,
            "BEGIN:VCALENDAR\n\
             VERSION:2.0\n\
             PRODID:-//prodcal//Production Calendar//RU\n\
             X-WR-CALNAME:Производственный календарь 2026\n\
             NAME:Производственный календарь 2026\n\
             END:VCALENDAR\n"
        );
    }

    #[test]
    fn test_new_year_scenario() {
        let days = AnnotationMap::from_raw([
            ("2026-01-01", Annotation::holiday("New Year")),
            ("2026-01-02", Annotation::holiday("New Year")),
            ("2026-01-03", Annotation::holiday("New Year")),
        ])
        .unwrap();
        let text =
            render_calendar(&days, &CalendarHeader::default(), &mut SequentialUid::new()).unwrap();

        assert!(text.ends_with(
            "BEGIN:VEVENT\n\
             SUMMARY:New Year\n\
             DTSTART;VALUE=DATE:20260101\n\
             DTEND;VALUE=DATE:20260104\n\
             UID:00000000000000000000000000000000\n\
             END:VEVENT\n\
             END:VCALENDAR\n"
        ));
        assert_eq!(text.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_two_separate_days_in_date_order() {
        let days = AnnotationMap::from_raw([
            ("2026-02-23", Annotation::holiday("Holiday")),
            ("2026-02-14", Annotation::shortened("Shortened day")),
        ])
        .unwrap();
        let text =
            render_calendar(&days, &CalendarHeader::default(), &mut SequentialUid::new()).unwrap();

        let shortened = text.find("SUMMARY:Shortened day").unwrap();
        let holiday = text.find("SUMMARY:Holiday").unwrap();
        assert!(shortened < holiday);
        assert!(text.contains("DTSTART;VALUE=DATE:20260214\nDTEND;VALUE=DATE:20260215\n"));
        assert!(text.contains("DTSTART;VALUE=DATE:20260223\nDTEND;VALUE=DATE:20260224\n"));
    }

    #[test]
    fn test_single_day_end_is_next_day_across_month() {
        let text = render(&[range("2026-01-31", "2026-01-31", "x")]);
        assert!(text.contains("DTSTART;VALUE=DATE:20260131\nDTEND;VALUE=DATE:20260201\n"));
    }

    #[test]
    fn test_single_day_end_is_next_day_across_year() {
        let text = render(&[range("2025-12-31", "2025-12-31", "x")]);
        assert!(text.contains("DTSTART;VALUE=DATE:20251231\nDTEND;VALUE=DATE:20260101\n"));
    }

    #[test]
    fn test_leap_day_end() {
        let text = render(&[range("2028-02-28", "2028-02-28", "x")]);
        assert!(text.contains("DTEND;VALUE=DATE:20280229\n"));
    }

    #[test]
    fn test_summary_keeps_non_ascii_and_escapes_separators() {
        let text = render(&[range(
            "2026-03-07",
            "2026-03-07",
            "Сокращённый день, на 1 час; см. ст. 95",
        )]);
        assert!(text.contains("SUMMARY:Сокращённый день\\, на 1 час\\; см. ст. 95\n"));
    }

    #[test]
    fn test_no_line_starts_with_whitespace() {
        let text = render(&[
            range("2026-01-01", "2026-01-08", "Новогодние каникулы"),
            range("2026-02-23", "2026-02-23", "  leading spaces"),
        ]);
        assert!(text.starts_with("BEGIN:VCALENDAR\n"));
        for line in text.lines() {
            assert!(!line.is_empty());
            assert!(!line.starts_with(char::is_whitespace), "{line:?}");
        }
    }

    #[test]
    fn test_rendering_is_idempotent_with_fixed_uids() {
        let ranges = [
            range("2026-01-01", "2026-01-08", "Новогодние каникулы"),
            range("2026-05-01", "2026-05-03", "Праздник Весны и Труда"),
        ];
        assert_eq!(render(&ranges), render(&ranges));
    }

    #[test]
    fn test_random_uids_distinct_within_document() {
        let ranges: Vec<DateRange> = (1..=28)
            .map(|d| {
                let day = format!("2026-02-{d:02}");
                range(&day, &day, "x")
            })
            .collect();
        let text = IcsWriter::default()
            .render(&ranges, &mut RandomUid::new())
            .unwrap();
        let uids: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("UID:"))
            .collect();
        assert_eq!(uids.len(), 28);
        assert_eq!(uids.iter().collect::<HashSet<_>>().len(), 28);
        assert!(uids.iter().all(|u| !u.is_empty()));
    }

    struct Constant(&'static str);

    impl UidGenerator for Constant {
        fn next_uid(&mut self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let ranges = [
            range("2026-01-01", "2026-01-01", "a"),
            range("2026-01-05", "2026-01-05", "b"),
        ];
        let err = IcsWriter::default()
            .render(&ranges, &mut Constant("same"))
            .unwrap_err();
        assert_eq!(err, CalendarError::DuplicateUid("same".to_string()));
    }

    #[test]
    fn test_empty_uid_rejected() {
        let ranges = [range("2026-01-01", "2026-01-01", "a")];
        let err = IcsWriter::default()
            .render(&ranges, &mut Constant(""))
            .unwrap_err();
        assert_eq!(err, CalendarError::EmptyUid);
    }

    #[test]
    fn test_folded_output_reads_back() {
        let long = "Перенос выходного дня с субботы 3 января на пятницу 9 января".to_string();
        let ranges = [range("2026-01-09", "2026-01-09", &long)];
        let text = IcsWriter::new(CalendarHeader::for_year(2026))
            .with_options(IcsOptions { fold_lines: true })
            .render(&ranges, &mut SequentialUid::new())
            .unwrap();

        assert!(text.lines().all(|l| l.len() <= 75));
        let parsed = parse_document(&text).unwrap();
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].summary, long);
    }

    #[test]
    fn test_parse_document_reads_rendered_calendar() {
        let ranges = [
            range("2026-01-01", "2026-01-08", "Новогодние каникулы, отдых"),
            range("2026-12-31", "2026-12-31", "Выходной"),
        ];
        let parsed = parse_document(&render(&ranges)).unwrap();

        assert_eq!(parsed.name.as_deref(), Some("Производственный календарь 2026"));
        assert_eq!(parsed.version.as_deref(), Some("2.0"));
        assert_eq!(parsed.events.len(), 2);

        let first = &parsed.events[0];
        assert_eq!(first.summary, "Новогодние каникулы, отдых");
        assert_eq!(first.start, key("2026-01-01"));
        assert_eq!(first.end_exclusive, key("2026-01-09"));

        let last = &parsed.events[1];
        assert_eq!(last.end_exclusive, key("2027-01-01"));
        assert_eq!(last.uid.as_deref(), Some("00000000000000000000000000000001"));
    }

    #[test]
    fn test_parse_document_without_dtstart_fails() {
        let text = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VEVENT\nSUMMARY:Broken\nEND:VEVENT\nEND:VCALENDAR\n";
        let err = parse_document(text).unwrap_err();
        assert!(matches!(err, CalendarError::ParseError(ref m) if m.contains("DTSTART")));
    }

    #[test]
    fn test_parse_document_defaults_missing_dtend() {
        let text = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:One\nDTSTART;VALUE=DATE:20260612\nEND:VEVENT\nEND:VCALENDAR\n";
        let parsed = parse_document(text).unwrap();
        assert_eq!(parsed.events[0].end_exclusive, key("2026-06-13"));
        assert_eq!(parsed.events[0].uid, None);
    }
}
