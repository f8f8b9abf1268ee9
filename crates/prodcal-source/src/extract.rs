//! Day annotation extraction from production calendar pages
//!
//! Expected layout: one `table.cal` per month in calendar order, day cells
//! as `td` holding the day number. Cell classes mark the day type:
//!
//! | Class | Meaning |
//! |-------|---------|
//! | `holiday`, `weekend` | non-working day |
//! | `preholiday` | shortened working day |
//! | `inactively` | day of a neighbouring month, ignored |
//!
//! A non-blank `title` attribute on a cell overrides the default message.

use prodcal_calendar::{Annotation, AnnotationKind, AnnotationMap, DateKey};
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, SourceError};

/// Default message for non-working days
pub const DEFAULT_HOLIDAY_MESSAGE: &str = "Выходной день";

/// Default message for shortened days
pub const DEFAULT_SHORTENED_MESSAGE: &str = "Сокращённый рабочий день";

const MONTHS_PER_YEAR: usize = 12;

/// Messages used when a cell carries no title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractOptions {
    pub holiday_message: String,
    pub shortened_message: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            holiday_message: DEFAULT_HOLIDAY_MESSAGE.to_string(),
            shortened_message: DEFAULT_SHORTENED_MESSAGE.to_string(),
        }
    }
}

impl ExtractOptions {
    fn default_message(&self, kind: AnnotationKind) -> &str {
        match kind {
            AnnotationKind::Holiday => &self.holiday_message,
            AnnotationKind::Shortened => &self.shortened_message,
        }
    }
}

/// Collect the annotated days of `year` from a calendar page
///
/// # Errors
///
/// Returns `SourceError::NoCalendarTables` or `SourceError::TooManyMonths`
/// when the page does not look like a yearly calendar,
/// `SourceError::BadDayNumber` for an annotated cell without a day number and
/// `SourceError::Calendar` for a day that does not exist in its month.
pub fn extract_annotations(html: &str, year: i32, options: &ExtractOptions) -> Result<AnnotationMap> {
    let document = Html::parse_document(html);
    let table_selector = selector("table.cal")?;
    let cell_selector = selector("td")?;

    let tables: Vec<ElementRef<'_>> = document.select(&table_selector).collect();
    if tables.is_empty() {
        return Err(SourceError::NoCalendarTables);
    }
    if tables.len() > MONTHS_PER_YEAR {
        return Err(SourceError::TooManyMonths(tables.len()));
    }

    let mut annotations = AnnotationMap::new();
    for (month, table) in (1u32..).zip(&tables) {
        for cell in table.select(&cell_selector) {
            let Some(kind) = classify(&cell) else {
                continue;
            };
            let text: String = cell.text().collect();
            let Some(day) = parse_day(&text, month)? else {
                continue;
            };
            let key = DateKey::from_ymd(year, month, day)?;
            let message = cell
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| options.default_message(kind));
            let annotation = match kind {
                AnnotationKind::Holiday => Annotation::holiday(message),
                AnnotationKind::Shortened => Annotation::shortened(message),
            };
            if annotations.insert(key, annotation).is_some() {
                log::warn!("Day {key} is annotated more than once, keeping the last");
            }
        }
    }

    log::info!(
        "Extracted {} annotated days from {} month tables",
        annotations.len(),
        tables.len()
    );
    Ok(annotations)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SourceError::Selector(format!("{css}: {e}")))
}

/// Day type of a cell, `None` for working days and foreign-month days
fn classify(cell: &ElementRef<'_>) -> Option<AnnotationKind> {
    let mut kind = None;
    for class in cell.value().classes() {
        match class {
            "inactively" => return None,
            "preholiday" => kind = Some(AnnotationKind::Shortened),
            "holiday" | "weekend" => {
                kind.get_or_insert(AnnotationKind::Holiday);
            }
            _ => {}
        }
    }
    kind
}

/// Day number of a cell; blank cells are padding
fn parse_day(text: &str, month: u32) -> Result<Option<u32>> {
    let trimmed = text.trim().trim_end_matches('*').trim_end();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| SourceError::BadDayNumber {
            month,
            text: text.trim().to_string(),
        })
}
