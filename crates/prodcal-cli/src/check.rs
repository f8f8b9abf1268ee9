//! `prodcal check`: summarize a generated calendar file

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use prodcal_calendar::{parse_document, ParsedCalendar};

use crate::Verbosity;

/// Counts gathered from a parsed calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub events: usize,
    pub days: i64,
    pub missing_uids: usize,
    pub duplicate_uids: Vec<String>,
    /// Events whose DTEND is not after DTSTART, as `start summary`
    pub empty_events: Vec<String>,
}

impl Summary {
    pub fn of(calendar: &ParsedCalendar) -> Self {
        let mut seen = HashSet::new();
        let mut duplicate_uids = Vec::new();
        let mut missing_uids = 0;
        for event in &calendar.events {
            match &event.uid {
                Some(uid) if !seen.insert(uid.as_str()) => duplicate_uids.push(uid.clone()),
                Some(_) => {}
                None => missing_uids += 1,
            }
        }
        let mut days = 0;
        let mut empty_events = Vec::new();
        for event in &calendar.events {
            if event.end_exclusive > event.start {
                days += (event.end_exclusive.as_naive() - event.start.as_naive()).num_days();
            } else {
                empty_events.push(format!("{} {}", event.start, event.summary));
            }
        }
        Self {
            events: calendar.events.len(),
            days,
            missing_uids,
            duplicate_uids,
            empty_events,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing_uids == 0 && self.duplicate_uids.is_empty() && self.empty_events.is_empty()
    }
}

pub fn run(path: &Path, verbosity: Verbosity) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read calendar file: {}", path.display()))?;
    let calendar = parse_document(&text)
        .with_context(|| format!("Failed to parse calendar file: {}", path.display()))?;
    let summary = Summary::of(&calendar);

    if verbosity.should_show_output() {
        println!(
            "{}: {}",
            "Calendar".bold(),
            calendar.name.as_deref().unwrap_or("(unnamed)")
        );
        println!("  Events: {}", summary.events);
        println!("  Days:   {}", summary.days);
        if verbosity.is_verbose() {
            for event in &calendar.events {
                println!(
                    "  {} .. {}  {}",
                    event.start,
                    event.end_exclusive,
                    event.summary
                );
            }
        }
    }

    if !summary.is_valid() {
        if !summary.empty_events.is_empty() {
            bail!(
                "Events with DTEND not after DTSTART: {}",
                summary.empty_events.join("; ")
            );
        }
        if summary.missing_uids > 0 {
            bail!("{} events have no UID", summary.missing_uids);
        }
        bail!("Duplicate UIDs: {}", summary.duplicate_uids.join(", "));
    }
    if verbosity.should_show_output() {
        println!("{} All UIDs are unique", "✓".green().bold());
    }
    Ok(())
}
