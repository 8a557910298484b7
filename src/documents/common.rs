//! Common utilities for document generation.
//!
//! Shared helpers for date formatting, text measurement and line wrapping.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use std::borrow::Cow;

const PT_TO_MM: f32 = 0.352_778;
const BOLD_WIDTH_FACTOR: f32 = 1.06;

/// Printed in place of characters the document fonts cannot show.
pub const REPLACEMENT_CHAR: char = '?';

/// Characters of the 0x80..=0x9F block of WinAnsiEncoding.
const WIN_ANSI_EXTRAS: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Format a date in Spanish long form (e.g., "19 de octubre de 2026").
pub fn format_spanish_date(at: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset).date_naive();
    let months = [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ];

    let day = local.day();
    let month = months[(local.month0() as usize).min(months.len() - 1)];
    let year = local.year();

    format!("{day} de {month} de {year}")
}

/// Short local date and time, e.g. "05/03/2026 14:20".
pub fn format_datetime(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string()
}

/// Whether the builtin PDF fonts (WinAnsiEncoding) have a glyph for `c`.
pub fn is_printable(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}') || WIN_ANSI_EXTRAS.contains(c)
}

/// `text` with every character the fonts cannot show replaced by
/// [`REPLACEMENT_CHAR`], so nothing vanishes silently from the PDF.
pub fn printable_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_printable) {
        return Cow::Borrowed(text);
    }

    let mut replaced = 0usize;
    let printable: String = text
        .chars()
        .map(|c| {
            if is_printable(c) {
                c
            } else {
                replaced += 1;
                if c.is_whitespace() {
                    ' '
                } else {
                    REPLACEMENT_CHAR
                }
            }
        })
        .collect();
    log::warn!(
        "Replaced {} character(s) without a PDF glyph in '{}'",
        replaced,
        text
    );
    Cow::Owned(printable)
}

/// Helvetica advance width of `c` in thousandths of an em.
fn char_width(c: char) -> u16 {
    match c {
        'i' | 'j' | 'l' => 222,
        ' ' | 'f' | 't' | 'I' | '.' | ',' | ':' | ';' | '/' | '!' | '[' | ']' => 278,
        'r' | '-' | '(' | ')' | '"' => 333,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 500,
        'm' | 'M' => 833,
        'w' | 'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722,
        'W' => 944,
        'G' | 'O' | 'Q' => 778,
        'F' | 'T' | 'Z' => 611,
        'L' => 556,
        'A'..='Z' => 667,
        'Á' | 'É' | 'Ó' | 'Ú' | 'Ñ' => 722,
        'í' => 278,
        '@' => 1015,
        _ => 556,
    }
}

/// Width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let em: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    let width = em as f32 / 1000.0 * size * PT_TO_MM;
    if bold {
        width * BOLD_WIDTH_FACTOR
    } else {
        width
    }
}

/// Greedy word wrap to `max_width` millimetres.
///
/// Explicit newlines start new lines and blank lines are kept. Words wider
/// than a whole line are broken between characters. Every non-whitespace
/// character of the input ends up on some line.
pub fn wrap_text(text: &str, size: f32, max_width: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, size, bold) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, size, bold) <= max_width {
                current = word.to_string();
            } else {
                for chunk in break_word(word, size, max_width, bold) {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current = chunk;
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    // Trailing blank lines carry no content.
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn break_word(word: &str, size: f32, max_width: f32, bold: bool) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for c in word.chars() {
        chunk.push(c);
        if chunk.chars().count() > 1 && text_width(&chunk, size, bold) > max_width {
            chunk.pop();
            chunks.push(std::mem::take(&mut chunk));
            chunk.push(c);
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}
