//! Decomposition of free-form assistant reply text into renderable segments.
//!
//! [`parse_reply`] is a pure function: raw reply text in, an ordered sequence
//! of typed segments out. Prose becomes a span list (plain text, bold,
//! italic, line breaks); fenced code becomes a literal, whitespace-preserving
//! body. Renderers consume the structured output and apply their own
//! escaping — raw markup from model output is never interpreted beyond this
//! span model, and malformed markup is never an error.

use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";
const BOLD: &str = "**";

/// Bare identifier-like token allowed as a stray language tag on the first
/// line of a fence. The completion service is instructed not to emit one,
/// but may anyway.
static LANGUAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][\w#+.\-]*$").expect("language tag pattern is valid"));

/// One inline prose span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(String),
    Italic(String),
    LineBreak,
}

/// One renderable segment of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(Vec<Span>),
    Code(String),
}

/// Splits reply text on triple-backtick fences and decomposes each part.
///
/// Parts at even split positions are prose, odd positions are code. Prose
/// that is blank after trimming produces no segment. Deterministic: identical
/// input yields a structurally identical segment sequence.
#[must_use]
pub fn parse_reply(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for (position, part) in text.split(FENCE).enumerate() {
        if position % 2 == 1 {
            segments.push(Segment::Code(code_body(part)));
        } else if let Some(spans) = prose_spans(part) {
            segments.push(Segment::Prose(spans));
        }
    }

    segments
}

/// Trims the fenced text and strips a stray leading language tag; the
/// remainder is preserved exactly, internal whitespace included.
fn code_body(raw: &str) -> String {
    let trimmed = raw.trim();
    let first_line = trimmed.lines().next().unwrap_or("");

    if LANGUAGE_TAG.is_match(first_line) {
        trimmed[first_line.len()..].trim_start().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Left-to-right inline scan over one prose part.
///
/// `**bold**` and `*italic*` pairs are non-overlapping and first-match-wins,
/// with the bold delimiter checked before the italic one. Pairs never span a
/// newline: a delimiter whose closer sits on a later line stays literal, so
/// the line break survives as its own span. Unmatched delimiters fall
/// through as literal text. Returns `None` for parts that are blank after
/// trimming.
fn prose_spans(raw: &str) -> Option<Vec<Span>> {
    if raw.trim().is_empty() {
        return None;
    }

    let mut spans = Vec::new();
    let mut pending = String::new();
    let mut rest = raw;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(BOLD) {
            if let Some(close) = find_on_line(tail, BOLD) {
                flush_text(&mut spans, &mut pending);
                spans.push(Span::Bold(tail[..close].to_string()));
                rest = &tail[close + BOLD.len()..];
            } else {
                pending.push_str(BOLD);
                rest = tail;
            }
            continue;
        }

        if let Some(tail) = rest.strip_prefix('*') {
            if let Some(close) = find_on_line(tail, "*") {
                flush_text(&mut spans, &mut pending);
                spans.push(Span::Italic(tail[..close].to_string()));
                rest = &tail[close + 1..];
            } else {
                pending.push('*');
                rest = tail;
            }
            continue;
        }

        if let Some(tail) = rest.strip_prefix('\n') {
            flush_text(&mut spans, &mut pending);
            spans.push(Span::LineBreak);
            rest = tail;
            continue;
        }

        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            pending.push(ch);
        }
        rest = chars.as_str();
    }

    flush_text(&mut spans, &mut pending);
    Some(spans)
}

/// Position of `needle` within the current line of `text`, if any.
fn find_on_line(text: &str, needle: &str) -> Option<usize> {
    let line_end = text.find('\n').unwrap_or(text.len());
    text[..line_end].find(needle)
}

fn flush_text(spans: &mut Vec<Span>, pending: &mut String) {
    if !pending.is_empty() {
        spans.push(Span::Text(std::mem::take(pending)));
    }
}
