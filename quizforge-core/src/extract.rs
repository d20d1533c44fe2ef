//! Best-effort extraction of a JSON array from a chatty model reply.
//!
//! Models routinely wrap the requested array in prose ("Sure! Here you
//! go: [...] Hope this helps"). Extraction pulls the bracketed span out so
//! it can be parsed. The strategy is a trait so a stricter parser can be
//! swapped in without touching the validator.

use std::sync::LazyLock;

use regex::Regex;

/// Greedy `[` … `]` span, dot matching newlines.
static WIDEST_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("static regex is valid"));

/// Strategy for locating the JSON array inside reply text.
pub trait ArrayExtractor: Send + Sync {
    /// Return the candidate array text, or `None` if no span is found.
    fn extract<'a>(&self, text: &'a str) -> Option<&'a str>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// From the first `[` to the last `]`.
///
/// Tolerates nested arrays and any amount of leading or trailing chatter.
/// Two separate arrays in one reply produce an unparseable span, which the
/// validator then reports as invalid JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidestSpan;

impl ArrayExtractor for WidestSpan {
    fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        WIDEST_ARRAY.find(text).map(|m| m.as_str())
    }

    fn name(&self) -> &'static str {
        "widest_span"
    }
}

/// The first balanced `[` … `]` span, ignoring brackets inside JSON strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedSpan;

impl ArrayExtractor for BalancedSpan {
    fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        balanced_spans(text).next()
    }

    fn name(&self) -> &'static str {
        "balanced_span"
    }
}

/// Exactly one balanced top-level span; replies with two or more are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictSingleSpan;

impl ArrayExtractor for StrictSingleSpan {
    fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        let mut spans = balanced_spans(text);
        let first = spans.next()?;
        if spans.next().is_some() {
            return None;
        }
        Some(first)
    }

    fn name(&self) -> &'static str {
        "strict_single_span"
    }
}

/// Iterate over top-level balanced `[...]` spans in order of appearance.
///
/// Brackets inside double-quoted strings (with backslash escapes) do not
/// count. An unterminated span ends iteration.
pub fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let (start, end) = next_balanced(text, pos)?;
        pos = end;
        Some(&text[start..end])
    })
}

/// Find the next balanced span at or after `from`; returns byte range.
fn next_balanced(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let start = from + text[from..].find('[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset + 1));
                }
            }
            _ => {}
        }
    }
    None
}
