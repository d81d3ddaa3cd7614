//! Lenient decimal parsing for the reference dataset
//!
//! Dataset cells use comma decimals, space thousands separators, qualifiers
//! such as `< 0,5` and placeholder tokens. A cell that cannot be read is
//! `None`, never zero, and never aborts an import.

const PLACEHOLDERS: [&str; 5] = ["-", "?", "traces", "nd", "na"];

/// Parse one dataset cell
pub fn parse_dataset_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if PLACEHOLDERS.iter().any(|p| compact.eq_ignore_ascii_case(p)) {
        return None;
    }

    let number = compact.trim_start_matches(&['<', '>', '~', '='][..]);
    if !is_plain_decimal(number) {
        return None;
    }

    number.parse().ok()
}

/// Blank cells and dataset tokens for trace, not determined or not applicable
pub fn is_placeholder(raw: &str) -> bool {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.is_empty() || PLACEHOLDERS.iter().any(|p| compact.eq_ignore_ascii_case(p))
}

/// `-?(\d+(\.\d+)?|\.\d+)`
fn is_plain_decimal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    match frac_part {
        None => all_digits(int_part),
        Some(frac) => all_digits(frac) && (int_part.is_empty() || all_digits(int_part)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_comma_decimals() {
        assert_eq!(parse_dataset_decimal("12.5"), Some(12.5));
        assert_eq!(parse_dataset_decimal(" 12,5 "), Some(12.5));
        assert_eq!(parse_dataset_decimal(",75"), Some(0.75));
        assert_eq!(parse_dataset_decimal("-3"), Some(-3.0));
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_dataset_decimal("1 234,5"), Some(1234.5));
        assert_eq!(parse_dataset_decimal("1\u{a0}234"), Some(1234.0));
    }

    #[test]
    fn test_qualifiers_are_stripped() {
        assert_eq!(parse_dataset_decimal("< 0,5"), Some(0.5));
        assert_eq!(parse_dataset_decimal("~2"), Some(2.0));
    }

    #[test]
    fn test_placeholders_are_null() {
        for cell in ["", "-", "?", "traces", "Traces", "ND", "na"] {
            assert_eq!(parse_dataset_decimal(cell), None, "cell {:?}", cell);
        }
    }

    #[test]
    fn test_malformed_cells_are_null() {
        for cell in ["1e5", "inf", "1.2.3", "12.", "abc", "--1"] {
            assert_eq!(parse_dataset_decimal(cell), None, "cell {:?}", cell);
        }
    }
}
