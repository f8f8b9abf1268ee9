//! Date keys, day annotations, merged ranges and calendar events
//!
//! All dates are plain Gregorian days without a timezone. Ordering is always
//! chronological; the textual `YYYY-MM-DD` form is only used for display and
//! parsing.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// A calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build a key from year, month and day
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::MalformedDateKey` if the triple is not a valid
    /// Gregorian date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                CalendarError::malformed_key(
                    format!("{year:04}-{month:02}-{day:02}"),
                    "not a valid calendar date",
                )
            })
    }

    /// The day after this one
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::DateOutOfRange` past the last representable day.
    pub fn next_day(self) -> Result<Self> {
        self.0
            .succ_opt()
            .map(Self)
            .ok_or(CalendarError::DateOutOfRange(self))
    }

    /// Whether `self` is exactly one calendar day after `other`
    #[inline]
    #[must_use]
    pub fn is_next_day_of(self, other: Self) -> bool {
        other.0.succ_opt() == Some(self.0)
    }

    /// Eight-digit `YYYYMMDD` form used by iCalendar `DATE` values
    #[must_use]
    pub fn compact(self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// Parse the eight-digit `YYYYMMDD` form
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::MalformedDateKey` for anything else.
    pub fn from_compact(s: &str) -> Result<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CalendarError::malformed_key(s, "expected YYYYMMDD"));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|e| CalendarError::malformed_key(s, e.to_string()))
    }

    #[inline]
    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[inline]
    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[inline]
    #[must_use]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// Underlying `chrono` date
    #[inline]
    #[must_use]
    pub const fn as_naive(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = CalendarError;

    /// Parse the `YYYY-MM-DD` form, with month and day zero padded
    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shape_ok {
            return Err(CalendarError::malformed_key(s, "expected YYYY-MM-DD"));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|e| CalendarError::malformed_key(s, e.to_string()))
    }
}

/// Category of a non-standard day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Non-working day (public holiday or weekend)
    Holiday,
    /// Working day with reduced hours
    Shortened,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Holiday => f.write_str("holiday"),
            Self::Shortened => f.write_str("shortened"),
        }
    }
}

/// Why a single day is special
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Non-working day
    Holiday { message: String },
    /// Shortened working day
    Shortened { message: String },
}

impl Annotation {
    #[must_use]
    pub fn holiday(message: impl Into<String>) -> Self {
        Self::Holiday {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn shortened(message: impl Into<String>) -> Self {
        Self::Shortened {
            message: message.into(),
        }
    }

    /// Convert the two-flag representation some sources still emit
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::InconsistentAnnotation` unless exactly one
    /// flag is set.
    pub fn from_flags(
        message: impl Into<String>,
        is_holiday: bool,
        is_shortened: bool,
    ) -> Result<Self> {
        let message = message.into();
        match (is_holiday, is_shortened) {
            (true, false) => Ok(Self::Holiday { message }),
            (false, true) => Ok(Self::Shortened { message }),
            _ => Err(CalendarError::InconsistentAnnotation { message }),
        }
    }

    /// Human-readable description
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Holiday { message } | Self::Shortened { message } => message,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AnnotationKind {
        match self {
            Self::Holiday { .. } => AnnotationKind::Holiday,
            Self::Shortened { .. } => AnnotationKind::Shortened,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_holiday(&self) -> bool {
        matches!(self, Self::Holiday { .. })
    }

    #[inline]
    #[must_use]
    pub const fn is_shortened(&self) -> bool {
        matches!(self, Self::Shortened { .. })
    }
}

/// Annotated days of one year, keyed by date
///
/// Iteration order is unspecified; consumers that need chronological order
/// must sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationMap {
    days: HashMap<DateKey, Annotation>,
}

impl AnnotationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from textual `YYYY-MM-DD` keys
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::MalformedDateKey` for the first key that does
    /// not parse; nothing is skipped.
    pub fn from_raw<K, I>(entries: I) -> Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Annotation)>,
    {
        let mut map = Self::new();
        for (key, annotation) in entries {
            let key: DateKey = key.as_ref().parse()?;
            map.insert(key, annotation);
        }
        Ok(map)
    }

    /// Insert an annotation, returning the one it replaced
    pub fn insert(&mut self, key: DateKey, annotation: Annotation) -> Option<Annotation> {
        self.days.insert(key, annotation)
    }

    #[must_use]
    pub fn get(&self, key: &DateKey) -> Option<&Annotation> {
        self.days.get(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &Annotation)> {
        self.days.iter()
    }

    /// All entries in chronological order
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<(DateKey, &Annotation)> {
        let mut entries: Vec<(DateKey, &Annotation)> =
            self.days.iter().map(|(key, annotation)| (*key, annotation)).collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries
    }

    /// All keys in chronological order
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<DateKey> {
        let mut keys: Vec<DateKey> = self.days.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl FromIterator<(DateKey, Annotation)> for AnnotationMap {
    fn from_iter<T: IntoIterator<Item = (DateKey, Annotation)>>(iter: T) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl Extend<(DateKey, Annotation)> for AnnotationMap {
    fn extend<T: IntoIterator<Item = (DateKey, Annotation)>>(&mut self, iter: T) {
        self.days.extend(iter);
    }
}

/// Contiguous run of days sharing one message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: DateKey,
    end: DateKey,
    message: String,
    kind: AnnotationKind,
}

impl DateRange {
    /// Create a range covering `start..=end`
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::InvalidRange` if `start > end`.
    pub fn new(
        start: DateKey,
        end: DateKey,
        message: impl Into<String>,
        kind: AnnotationKind,
    ) -> Result<Self> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            message: message.into(),
            kind,
        })
    }

    /// Range covering one annotated day
    #[must_use]
    pub fn single_day(key: DateKey, annotation: &Annotation) -> Self {
        Self {
            start: key,
            end: key,
            message: annotation.message().to_owned(),
            kind: annotation.kind(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> DateKey {
        self.start
    }

    /// Last day covered (inclusive)
    #[inline]
    #[must_use]
    pub const fn end(&self) -> DateKey {
        self.end
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Number of days covered
    #[must_use]
    pub fn len_days(&self) -> u64 {
        // start <= end is enforced by every constructor
        (self.end.0 - self.start.0).num_days().unsigned_abs() + 1
    }

    #[must_use]
    pub fn contains(&self, key: &DateKey) -> bool {
        self.start <= *key && *key <= self.end
    }

    /// Every covered day, in order
    pub fn days(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.start
            .0
            .iter_days()
            .take_while(move |d| *d <= self.end.0)
            .map(DateKey)
    }

    /// Whether `key` with `annotation` continues this range
    pub(crate) fn accepts(&self, key: DateKey, annotation: &Annotation) -> bool {
        self.kind == annotation.kind()
            && self.message == annotation.message()
            && key.is_next_day_of(self.end)
    }

    pub(crate) fn extend_to(&mut self, key: DateKey) {
        self.end = key;
    }
}

/// One serializable `VEVENT`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CalendarEvent {
    /// Event title, unescaped
    pub summary: String,

    /// First day (DTSTART)
    pub start_date: DateKey,

    /// First day after the range (DTEND)
    pub end_date_exclusive: DateKey,

    /// Unique identifier (UID)
    pub uid: String,
}

impl CalendarEvent {
    /// Derive the event for `range`
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::DateOutOfRange` if the range ends on the last
    /// representable day.
    pub fn from_range(range: &DateRange, uid: impl Into<String>) -> Result<Self> {
        Ok(Self {
            summary: range.message.clone(),
            start_date: range.start,
            end_date_exclusive: range.end.next_day()?,
            uid: uid.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let k = key("2026-03-08");
        assert_eq!(k.year(), 2026);
        assert_eq!(k.month(), 3);
        assert_eq!(k.day(), 8);
        assert_eq!(k.to_string(), "2026-03-08");
        assert_eq!(k.compact(), "20260308");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for bad in ["2026-02-30", "2026-13-01", "2026-1-05", "20260105", "", "abcd-ef-gh"] {
            let err = bad.parse::<DateKey>().unwrap_err();
            assert!(
                matches!(err, CalendarError::MalformedDateKey { ref key, .. } if key == bad),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn test_from_ymd_rejects_invalid_day() {
        assert!(DateKey::from_ymd(2025, 2, 29).is_err());
        assert_eq!(DateKey::from_ymd(2028, 2, 29).unwrap(), key("2028-02-29"));
    }

    #[test]
    fn test_ordering_is_chronological() {
        let mut keys = vec![key("2026-10-01"), key("2026-02-01"), key("2025-12-31")];
        keys.sort();
        assert_eq!(
            keys,
            vec![key("2025-12-31"), key("2026-02-01"), key("2026-10-01")]
        );
    }

    #[test]
    fn test_next_day_crosses_boundaries() {
        assert_eq!(key("2026-01-31").next_day().unwrap(), key("2026-02-01"));
        assert_eq!(key("2025-12-31").next_day().unwrap(), key("2026-01-01"));
        assert_eq!(key("2028-02-28").next_day().unwrap(), key("2028-02-29"));
        assert_eq!(key("2026-02-28").next_day().unwrap(), key("2026-03-01"));
    }

    #[test]
    fn test_next_day_overflow() {
        let last = DateKey::from(NaiveDate::MAX);
        assert_eq!(last.next_day(), Err(CalendarError::DateOutOfRange(last)));
    }

    #[test]
    fn test_is_next_day_of() {
        assert!(key("2026-01-01").is_next_day_of(key("2025-12-31")));
        assert!(!key("2026-01-02").is_next_day_of(key("2025-12-31")));
        assert!(!key("2025-12-31").is_next_day_of(key("2026-01-01")));
    }

    #[test]
    fn test_from_compact() {
        assert_eq!(DateKey::from_compact("20260104").unwrap(), key("2026-01-04"));
        assert!(DateKey::from_compact("2026014").is_err());
        assert!(DateKey::from_compact("20261301").is_err());
    }

    #[test]
    fn test_annotation_from_flags() {
        assert_eq!(
            Annotation::from_flags("Day off", true, false).unwrap(),
            Annotation::holiday("Day off")
        );
        assert_eq!(
            Annotation::from_flags("Short", false, true).unwrap(),
            Annotation::shortened("Short")
        );
        assert!(matches!(
            Annotation::from_flags("Neither", false, false),
            Err(CalendarError::InconsistentAnnotation { .. })
        ));
        assert!(matches!(
            Annotation::from_flags("Both", true, true),
            Err(CalendarError::InconsistentAnnotation { .. })
        ));
    }

    #[test]
    fn test_annotation_serde_shape() {
        let json = serde_json::to_string(&Annotation::shortened("Короткий день")).unwrap();
        assert_eq!(json, r#"{"kind":"shortened","message":"Короткий день"}"#);
    }

    #[test]
    fn test_annotation_map_from_raw_aborts_on_bad_key() {
        let entries = vec![
            ("2026-01-01", Annotation::holiday("New Year")),
            ("2026-01-32", Annotation::holiday("New Year")),
        ];
        let err = AnnotationMap::from_raw(entries).unwrap_err();
        assert!(matches!(err, CalendarError::MalformedDateKey { key, .. } if key == "2026-01-32"));
    }

    #[test]
    fn test_annotation_map_sorted_keys() {
        let map = AnnotationMap::from_raw([
            ("2026-05-09", Annotation::holiday("Victory Day")),
            ("2026-01-01", Annotation::holiday("New Year")),
            ("2026-02-23", Annotation::holiday("Defender Day")),
        ])
        .unwrap();
        assert_eq!(
            map.sorted_keys(),
            vec![key("2026-01-01"), key("2026-02-23"), key("2026-05-09")]
        );
    }

    #[test]
    fn test_annotation_map_sorted_entries() {
        let map = AnnotationMap::from_raw([
            ("2026-05-09", Annotation::holiday("Victory Day")),
            ("2026-01-01", Annotation::holiday("New Year")),
            ("2026-04-30", Annotation::shortened("Short day")),
        ])
        .unwrap();
        let entries = map.sorted_entries();
        let keys: Vec<DateKey> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, map.sorted_keys());
        assert_eq!(entries[1].1, &Annotation::shortened("Short day"));
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let err = DateRange::new(
            key("2026-01-03"),
            key("2026-01-01"),
            "x",
            AnnotationKind::Holiday,
        )
        .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange { .. }));
    }

    #[test]
    fn test_date_range_days_and_len() {
        let range = DateRange::new(
            key("2025-12-30"),
            key("2026-01-02"),
            "Holidays",
            AnnotationKind::Holiday,
        )
        .unwrap();
        assert_eq!(range.len_days(), 4);
        let days: Vec<String> = range.days().map(|d| d.to_string()).collect();
        assert_eq!(
            days,
            ["2025-12-30", "2025-12-31", "2026-01-01", "2026-01-02"]
        );
        assert!(range.contains(&key("2026-01-01")));
        assert!(!range.contains(&key("2026-01-03")));
    }

    #[test]
    fn test_event_end_is_exclusive() {
        let range = DateRange::single_day(key("2026-01-31"), &Annotation::holiday("x"));
        let event = CalendarEvent::from_range(&range, "uid").unwrap();
        assert_eq!(event.start_date, key("2026-01-31"));
        assert_eq!(event.end_date_exclusive, key("2026-02-01"));
    }
}
