use deunicode::deunicode;

use crate::phone;

/// Collation key for name ordering.
/// Folds diacritics and case so "Álvaro", "alvaro" and "ALVARO" compare equal,
/// which matches pt-BR base-letter comparison.
pub fn collation_key(name: &str) -> String {
    let folded = deunicode(name);
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A parsed search query. The empty query matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    digits: String,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self {
            text: trimmed.to_lowercase(),
            digits: phone::digits_only(trimmed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn matches(&self, name: &str, phone_value: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        if name.to_lowercase().contains(&self.text) {
            return true;
        }
        // A query without digits must not match every phone through the empty string
        !self.digits.is_empty() && phone::digits_only(phone_value).contains(&self.digits)
    }
}
