//! Phone number helpers for Brazilian-style numbers.
//!
//! Formatting is driven purely by digit count: 11 digits get mobile
//! grouping `(XX) XXXXX-XXXX`, 10 digits get landline grouping
//! `(XX) XXXX-XXXX`. Anything else is left exactly as typed.

/// Keep only ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a phone for display based on its digit count.
pub fn format_display(raw: &str) -> String {
    let digits = digits_only(raw);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("(11) 98888-7777"), "11988887777");
        assert_eq!(digits_only("+55 21 3333"), "55213333");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_format_mobile() {
        assert_eq!(format_display("11988887777"), "(11) 98888-7777");
        assert_eq!(format_display("11 98888 7777"), "(11) 98888-7777");
    }

    #[test]
    fn test_format_landline() {
        assert_eq!(format_display("1133334444"), "(11) 3333-4444");
    }

    #[test]
    fn test_format_other_lengths_unchanged() {
        assert_eq!(format_display("12345"), "12345");
        assert_eq!(format_display("+55 11 98888-7777"), "+55 11 98888-7777");
        assert_eq!(format_display("ramal 42"), "ramal 42");
    }

    #[test]
    fn test_format_is_idempotent() {
        let once = format_display("11988887777");
        assert_eq!(format_display(&once), once);
    }
}
