//! Heuristic extraction of name/phone pairs from plain document text.
//!
//! Each non-blank line is tried against two stages, first match wins:
//!
//! 1. `labeled`: `Name: <phone>` where the right side is phone-like.
//! 2. `embedded`: the first phone found anywhere on the line; the text before
//!    it becomes the name, or a placeholder when that text has no letters.
//!
//! Only when no line produced anything, `fallback` scans the whole text for
//! every phone match and names them all with placeholders.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::contact::Candidate;

pub const DEFAULT_PLACEHOLDER: &str = "Contato";

/// `Name: (11) 98888-7777` or `Name: <7+ of digits, + - ( ) and spaces>`.
static LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([^:]+?)\s*:\s*(\(?[0-9]{2,3}\)?[\s.-]?[0-9]{4,5}[\s.-]?[0-9]{4}|[0-9+()\s-]{7,})$",
    )
    .expect("valid labeled phone regex")
});

/// `(11) 98888-7777`, a bare run of 8 to 11 digits, or `98888-7777`.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([0-9]{2,3}\)\s?[0-9]{4,5}-[0-9]{4}|[0-9]{8,11}|[0-9]{4,5}-[0-9]{4}")
        .expect("valid phone regex")
});

/// Text with nothing but digits, punctuation and whitespace.
static NAMELESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\W_]*$").expect("valid nameless regex"));

/// Result of the embedded stage for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPhone {
    /// Trimmed text preceding the phone, `None` when it cannot serve as a name.
    pub name: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct TextParser {
    placeholder: String,
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl TextParser {
    pub fn new(placeholder: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        let placeholder = if placeholder.trim().is_empty() {
            DEFAULT_PLACEHOLDER.to_string()
        } else {
            placeholder.trim().to_string()
        };
        Self { placeholder }
    }

    fn placeholder_name(&self, n: usize) -> String {
        format!("{} {}", self.placeholder, n)
    }

    /// Candidates in discovery order. Pure function of `text`.
    pub fn parse(&self, text: &str) -> Vec<Candidate> {
        let candidates = self.parse_lines(text);
        if !candidates.is_empty() {
            return candidates;
        }
        let fallback = self.fallback(text);
        debug!(
            "event=import_parse stage=fallback candidates={}",
            fallback.len()
        );
        fallback
    }

    /// Line stages only (labeled, then embedded).
    pub fn parse_lines(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut labeled_hits = 0usize;
        let mut placeholders = 0usize;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(candidate) = labeled(line) {
                labeled_hits += 1;
                candidates.push(candidate);
                continue;
            }
            if let Some(found) = embedded(line) {
                let name = match found.name {
                    Some(name) => name,
                    None => {
                        placeholders += 1;
                        self.placeholder_name(placeholders)
                    }
                };
                candidates.push(Candidate::new(name, found.phone));
            }
        }

        debug!(
            "event=import_parse stage=lines candidates={} labeled={} placeholders={}",
            candidates.len(),
            labeled_hits,
            placeholders
        );
        candidates
    }

    /// Every phone match across the whole text, each with a placeholder name.
    pub fn fallback(&self, text: &str) -> Vec<Candidate> {
        PHONE_RE
            .find_iter(text)
            .enumerate()
            .map(|(index, m)| Candidate::new(self.placeholder_name(index + 1), m.as_str()))
            .collect()
    }
}

/// Convenience wrapper using the default placeholder.
#[cfg(test)]
pub fn parse(text: &str) -> Vec<Candidate> {
    TextParser::default().parse(text)
}

/// Labeled stage for a single trimmed line.
pub fn labeled(line: &str) -> Option<Candidate> {
    let caps = LABELED_RE.captures(line.trim())?;
    let name = caps.get(1)?.as_str().trim();
    let phone = caps.get(2)?.as_str().trim();
    if name.is_empty() || !phone.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(Candidate::new(name, phone))
}

/// Embedded stage for a single line: the first phone match on the line.
pub fn embedded(line: &str) -> Option<EmbeddedPhone> {
    let m = PHONE_RE.find(line)?;
    let before = line[..m.start()].trim();
    let name = if NAMELESS_RE.is_match(before) {
        None
    } else {
        Some(before.to_string())
    };
    Some(EmbeddedPhone {
        name,
        phone: m.as_str().to_string(),
    })
}
