//! Text helpers for assembling iCalendar records
//!
//! Record blocks are written as indented raw strings next to the code that
//! fills them in; [`dedent`] turns them into flush-left content lines.

/// Maximum content line length in octets before folding
pub const MAX_LINE_OCTETS: usize = 75;

/// Strip template indentation from a multi-line block
///
/// Removes leading and trailing blank lines and all leading whitespace on
/// every line, so nested template indentation never reaches the output.
/// Trailing whitespace is kept. The result is newline-terminated unless it
/// is empty.
#[must_use]
pub fn dedent(block: &str) -> String {
    let lines: Vec<&str> = block.lines().map(str::trim_start).collect();

    let Some(first) = lines.iter().position(|l| !l.is_empty()) else {
        return String::new();
    };
    let last = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(first);

    let mut out = String::with_capacity(block.len());
    for line in &lines[first..=last] {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Escape a value of iCalendar type TEXT
///
/// Only the characters RFC 5545 requires are touched; everything else,
/// including non-ASCII text, is copied as is. Line breaks (`\n`, `\r\n`
/// and a lone `\r`) all become `\n`.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_text`]
#[must_use]
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Fold content lines longer than [`MAX_LINE_OCTETS`]
///
/// Continuation lines start with a single space. Breaks never fall inside a
/// UTF-8 sequence.
#[must_use]
pub fn fold_lines(document: &str) -> String {
    let mut out = String::with_capacity(document.len() + document.len() / MAX_LINE_OCTETS * 2);
    for line in document.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        fold_line(content, &mut out);
        out.push_str(newline);
    }
    out
}

fn fold_line(line: &str, out: &mut String) {
    let mut rest = line;
    // Continuation lines lose one octet to the leading space
    let mut limit = MAX_LINE_OCTETS;
    let mut first = true;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(&rest[..cut]);
        out.push('\n');
        rest = &rest[cut..];
        limit = MAX_LINE_OCTETS - 1;
        first = false;
    }
    if !first {
        out.push(' ');
    }
    out.push_str(rest);
}
